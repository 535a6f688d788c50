//! Integration tests for reckon-eval: operators, coercion and built-ins.

use std::sync::Arc;

use chrono::NaiveDate;
use reckon_diagnostic::ErrorCode;
use reckon_eval::{
    EvaluateOptions, EvaluationError, Expression, NumericPreference, Value, Variables, compile,
    evaluate,
};
use reckon_syntax::{Literal, Node, UnaryOp};
use rust_decimal_macros::dec;

async fn eval(text: &str) -> Result<Value, EvaluationError> {
    Expression::new(text).evaluate().await
}

async fn eval_ok(text: &str) -> Value {
    match eval(text).await {
        Ok(value) => value,
        Err(e) => panic!("'{}' failed: {}", text, e),
    }
}

// ============================================================================
// Arithmetic and coercion
// ============================================================================

#[tokio::test]
async fn test_integer_arithmetic() {
    assert_eq!(eval_ok("2 + 3 * 5").await, Value::Int(17));
    assert_eq!(eval_ok("(2 + 3) * 5").await, Value::Int(25));
    assert_eq!(eval_ok("7 % 4").await, Value::Int(3));
    assert_eq!(eval_ok("-(4 - 10)").await, Value::Int(6));
}

#[tokio::test]
async fn test_integer_division_does_not_truncate() {
    assert_eq!(eval_ok("3 / 6").await, Value::Double(0.5));
    assert_eq!(eval_ok("6 / 2").await, Value::Double(3.0));
}

#[tokio::test]
async fn test_division_preserves_kind() {
    for (x, expected) in [
        (Value::Float(5.0), Value::Float(2.5)),
        (Value::Double(5.0), Value::Double(2.5)),
        (Value::Decimal(dec!(5)), Value::Decimal(dec!(2.5))),
    ] {
        let result = Expression::new("x / 2")
            .with_parameter("x", x)
            .evaluate()
            .await;
        assert_eq!(result.ok(), Some(expected));
    }
}

#[tokio::test]
async fn test_double_plus_decimal_is_decimal() {
    let result = Expression::new("1.8 + Abs([var1])")
        .with_parameter("var1", 9.2)
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Decimal(dec!(11.0))));
}

#[tokio::test]
async fn test_floating_point_preference() {
    let result = Expression::new("1.5 + [d]")
        .with_parameter("d", dec!(1))
        .with_preference(NumericPreference::FloatingPoint)
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Double(2.5)));
}

#[tokio::test]
async fn test_int_and_long_widen() {
    assert_eq!(eval_ok("4000000000 + 1").await, Value::Long(4_000_000_001));
    assert_eq!(eval_ok("1 + 4000000000").await, Value::Long(4_000_000_001));
}

#[tokio::test]
async fn test_power_yields_double() {
    assert_eq!(eval_ok("2 ** 10").await, Value::Double(1024.0));
    assert_eq!(eval_ok("-1 ** 2").await, Value::Double(-1.0));
    assert_eq!(eval_ok("2 ** -1").await, Value::Double(0.5));
}

#[tokio::test]
async fn test_division_by_zero() {
    assert!(matches!(eval("1 / 0").await, Err(EvaluationError::DivisionByZero)));
    assert!(matches!(eval("1.5 % 0").await, Err(EvaluationError::DivisionByZero)));
    assert_eq!(eval_ok("1 / 0.0").await, Value::Double(f64::INFINITY));
}

#[tokio::test]
async fn test_overflow() {
    assert!(matches!(eval("2147483647 + 1").await, Err(EvaluationError::Overflow(_))));
    assert!(matches!(
        eval("9223372036854775807 * 2").await,
        Err(EvaluationError::Overflow(_))
    ));
}

#[tokio::test]
async fn test_bitwise() {
    assert_eq!(eval_ok("1 << 4 | 1").await, Value::Int(17));
    assert_eq!(eval_ok("6 & 3").await, Value::Int(2));
    assert_eq!(eval_ok("5 ^ 1").await, Value::Int(4));
    assert_eq!(eval_ok("~0").await, Value::Int(-1));
    assert!(matches!(eval("1.5 | 1").await, Err(EvaluationError::Type(_))));
}

// ============================================================================
// Text, booleans, dates, null
// ============================================================================

#[tokio::test]
async fn test_text_concatenation() {
    assert_eq!(eval_ok("'abc' + 1").await, Value::from("abc1"));
    assert_eq!(eval_ok("1 + 'abc'").await, Value::from("1abc"));
    assert!(matches!(eval("'abc' * 2").await, Err(EvaluationError::Type(_))));
}

#[tokio::test]
async fn test_text_comparison() {
    assert_eq!(eval_ok("'b' > 'a'").await, Value::Bool(true));
    assert_eq!(eval_ok("'abc' == 'ABC'").await, Value::Bool(false));

    let folded = Expression::new("'abc' == 'ABC'")
        .with_options(EvaluateOptions::IGNORE_CASE)
        .evaluate()
        .await;
    assert_eq!(folded.ok(), Some(Value::Bool(true)));
}

#[tokio::test]
async fn test_boolean_logic() {
    assert_eq!(eval_ok("true and not false").await, Value::Bool(true));
    assert_eq!(eval_ok("false || 1 < 2").await, Value::Bool(true));
    assert_eq!(eval_ok("!(1 == 1)").await, Value::Bool(false));
    assert!(matches!(eval("1 && true").await, Err(EvaluationError::Type(_))));
    assert!(matches!(eval("true + 1").await, Err(EvaluationError::Type(_))));
}

#[tokio::test]
async fn test_dates_compare() {
    assert_eq!(eval_ok("#2024-01-02# > #01/01/2024#").await, Value::Bool(true));
    assert_eq!(eval_ok("#2024-01-01 00:00# = #1/1/2024#").await, Value::Bool(true));

    let when = NaiveDate::from_ymd_opt(2024, 3, 1).expect("date");
    let result = Expression::new("[when] < #2024-03-02#")
        .with_parameter("when", when)
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Bool(true)));
    assert!(matches!(eval("#2024-01-01# - 1").await, Err(EvaluationError::Type(_))));
}

#[tokio::test]
async fn test_null_semantics() {
    let expression = |text: &str| {
        Expression::new(text)
            .with_parameter("n", Value::Null)
            .with_parameter("m", Value::Null)
    };
    assert_eq!(expression("[n] = [m]").evaluate().await.ok(), Some(Value::Bool(true)));
    assert_eq!(expression("[n] = 0").evaluate().await.ok(), Some(Value::Bool(false)));
    assert_eq!(expression("[n] + 'x'").evaluate().await.ok(), Some(Value::from("x")));
    assert!(matches!(
        expression("[n] < 1").evaluate().await,
        Err(EvaluationError::Type(_))
    ));
}

// ============================================================================
// Laziness
// ============================================================================

#[tokio::test]
async fn test_and_short_circuits() {
    let result = Expression::new("([a] != 0) && ([b] / [a] > 2)")
        .with_parameter("a", 0)
        .with_parameter("b", 1)
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Bool(false)));
}

#[tokio::test]
async fn test_or_short_circuits() {
    assert_eq!(eval_ok("true || [missing]").await, Value::Bool(true));
    assert_eq!(eval_ok("1 > 0 or 1 / 0 > 1").await, Value::Bool(true));
}

#[tokio::test]
async fn test_ternary_evaluates_one_branch() {
    assert_eq!(eval_ok("true ? 1 : 1 / 0").await, Value::Int(1));
    assert_eq!(eval_ok("1 > 2 ? [missing] : 'no'").await, Value::from("no"));
    assert!(matches!(eval("1 ? 2 : 3").await, Err(EvaluationError::Type(_))));
}

#[tokio::test]
async fn test_if_is_lazy() {
    assert_eq!(eval_ok("if(1 > 2, [missing], 'no')").await, Value::from("no"));
    assert!(matches!(
        eval("if(true, 1)").await,
        Err(EvaluationError::Arity { found: 2, .. })
    ));
}

#[tokio::test]
async fn test_in_stops_at_first_match() {
    assert_eq!(eval_ok("in(2, 1, 2, 3)").await, Value::Bool(true));
    assert_eq!(eval_ok("in(1, 1, [missing])").await, Value::Bool(true));
    assert_eq!(eval_ok("in('x', 'a', 'b')").await, Value::Bool(false));
    assert!(matches!(
        eval("in(1, 2, [missing])").await,
        Err(EvaluationError::UnknownParameter(name)) if name == "missing"
    ));
}

#[tokio::test]
async fn test_in_never_reaches_trailing_division() {
    let result = Expression::new("in((2 + 2), [1], [2], 1 + 2, 4, 1 / 0)")
        .with_parameter("1", 2)
        .with_parameter("2", 5)
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Bool(true)));
}

// ============================================================================
// Built-ins
// ============================================================================

#[tokio::test]
async fn test_math_functions() {
    assert_eq!(eval_ok("Abs(-2)").await, Value::Decimal(dec!(2)));
    assert_eq!(eval_ok("Sign(-3.5)").await, Value::Int(-1));
    assert_eq!(eval_ok("Sign(0)").await, Value::Int(0));
    assert_eq!(eval_ok("Sqrt(16)").await, Value::Double(4.0));
    assert_eq!(eval_ok("Pow(2, 3)").await, Value::Double(8.0));
    assert_eq!(eval_ok("Floor(1.7) + Ceiling(1.2)").await, Value::Double(3.0));
    assert_eq!(eval_ok("Truncate(-1.7)").await, Value::Double(-1.0));
    assert_eq!(eval_ok("Log(8, 2)").await, Value::Double(3.0));
    assert_eq!(eval_ok("IEEERemainder(3, 2)").await, Value::Double(-1.0));
}

#[tokio::test]
async fn test_max_and_min_use_common_kind() {
    assert_eq!(eval_ok("Max(1, 2.5)").await, Value::Double(2.5));
    assert_eq!(eval_ok("Min(1, 2.5)").await, Value::Double(1.0));
    assert_eq!(eval_ok("Max(3, 4000000000)").await, Value::Long(4_000_000_000));
}

#[tokio::test]
async fn test_round_midpoints() {
    assert_eq!(eval_ok("Round(2.5, 0)").await, Value::Double(2.0));
    assert_eq!(eval_ok("Round(1.234, 2)").await, Value::Double(1.23));

    let away = Expression::new("Round(2.5, 0)")
        .with_options(EvaluateOptions::ROUND_AWAY_FROM_ZERO)
        .evaluate()
        .await;
    assert_eq!(away.ok(), Some(Value::Double(3.0)));
    assert!(matches!(eval("Round(1.5, 16)").await, Err(EvaluationError::Argument { .. })));

    // Too large to have fractional digits: returned as is.
    assert_eq!(eval_ok("Round(1e300, 15)").await, Value::Double(1e300));
    assert_eq!(eval_ok("Round(1.7e308, 1)").await, Value::Double(1.7e308));
    assert_eq!(eval_ok("Round(12345678901234567, 2)").await, Value::Double(12345678901234567.0));
}

#[tokio::test]
async fn test_builtin_errors() {
    assert!(matches!(
        eval("Abs(1, 2)").await,
        Err(EvaluationError::Arity { expected: "1", found: 2, .. })
    ));
    assert!(matches!(eval("Abs('x')").await, Err(EvaluationError::Argument { .. })));
    assert!(matches!(
        eval("abs(1)").await,
        Err(EvaluationError::UnknownFunction(name)) if name == "abs"
    ));
}

#[tokio::test]
async fn test_ignore_case_names() {
    let result = Expression::new("ABS(-1) + [X]")
        .with_parameter("x", 2)
        .with_options(EvaluateOptions::IGNORE_CASE)
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Decimal(dec!(3))));
}

// ============================================================================
// Parameters and the facade
// ============================================================================

#[tokio::test]
async fn test_unknown_parameter() {
    assert!(matches!(
        eval("[x] + 1").await,
        Err(EvaluationError::UnknownParameter(name)) if name == "x"
    ));
}

#[tokio::test]
async fn test_nested_expression_parameter() {
    let inner = Expression::new("[y] * 2");
    let result = Expression::new("[x] + 1")
        .with_parameter("x", inner)
        .with_parameter("y", 5)
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Int(11)));
}

#[tokio::test]
async fn test_syntax_error_is_reported() {
    let expression = Expression::new("(3 + 2");
    assert!(expression.has_errors());
    assert_eq!(expression.error().as_deref(), Some("line 1:7 missing ')' at '<EOF>'"));
    assert!(matches!(expression.evaluate().await, Err(EvaluationError::Compile(_))));
}

#[tokio::test]
async fn test_double_quotes_are_one_error() {
    let expression = Expression::new("\"0\"");
    assert_eq!(
        expression.error().as_deref(),
        Some("line 1:1 no viable alternative at character '\"'")
    );
}

#[tokio::test]
async fn test_error_codes() {
    let code = |result: Result<Value, EvaluationError>| result.err().and_then(|e| e.code());
    assert_eq!(code(eval("1 / 0").await), Some(ErrorCode::DivisionByZero));
    assert_eq!(code(eval("[nope]").await), Some(ErrorCode::UnknownParameter));
    assert_eq!(code(eval("true + 1").await), Some(ErrorCode::TypeMismatch));
    assert_eq!(code(eval("(3 + 2").await), Some(ErrorCode::UnclosedDelimiter));
    assert_eq!(code(eval("Abs(1, 2)").await), Some(ErrorCode::WrongArity));
}

// ============================================================================
// Nesting limits
// ============================================================================

#[tokio::test]
async fn test_long_sums_fail_cleanly() {
    assert_eq!(eval_ok(&vec!["1"; 200].join("+")).await, Value::Int(200));

    let result = eval(&vec!["1"; 3000].join("+")).await;
    assert!(matches!(result, Err(EvaluationError::Compile(_))));
    assert_eq!(result.err().and_then(|e| e.code()), Some(ErrorCode::NestingTooDeep));

    let parens = format!("{}1{}", "(".repeat(500), ")".repeat(500));
    assert!(compile(&parens, true).is_err());
}

#[tokio::test]
async fn test_deep_prebuilt_tree_fails_cleanly() {
    let tree = (0..1000).fold(Node::value(Literal::Int(1)), |node, _| {
        Node::unary(UnaryOp::Neg, node)
    });
    let result = Expression::from_ast(Arc::new(tree)).evaluate().await;
    assert!(matches!(result, Err(EvaluationError::TooDeep(256))));
}

#[tokio::test]
async fn test_self_referencing_parameter_fails_cleanly() {
    let result = Expression::new("[x]")
        .with_parameter("x", Expression::new("[x] + 1"))
        .evaluate()
        .await;
    assert!(matches!(result, Err(EvaluationError::TooDeep(_))));
}

#[tokio::test]
async fn test_evaluation_is_idempotent() {
    let expression = Expression::new("[a] * 2 + Abs(-1)").with_parameter("a", 4);
    let first = expression.evaluate().await.ok();
    let second = expression.evaluate().await.ok();
    assert_eq!(first, Some(Value::Decimal(dec!(9))));
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_clones_do_not_share_parameters() {
    let base = Expression::new("[a] + 1").with_parameter("a", 1);
    let mut changed = base.clone();
    changed.set_parameter("a", 10);
    assert_eq!(base.evaluate().await.ok(), Some(Value::Int(2)));
    assert_eq!(changed.evaluate().await.ok(), Some(Value::Int(11)));
}

#[tokio::test]
async fn test_free_evaluate_function() {
    let tree = compile("[x] * [x]", false).expect("compiles");
    let mut variables = Variables::new();
    variables.insert("x".to_string(), 7.into());

    let result = evaluate(
        Arc::clone(&tree),
        variables,
        EvaluateOptions::empty(),
        NumericPreference::default(),
        Vec::new(),
        Vec::new(),
    )
    .await;
    assert_eq!(result.ok(), Some(Value::Int(49)));

    let from_tree = Expression::from_ast(tree).with_parameter("x", 3).evaluate().await;
    assert_eq!(from_tree.ok(), Some(Value::Int(9)));
}

#[tokio::test]
async fn test_concurrent_evaluations_share_a_tree() {
    let tree = compile("[n] * 10", true).expect("compiles");
    let tasks: Vec<_> = (0..8)
        .map(|n| {
            let expression = Expression::from_ast(Arc::clone(&tree)).with_parameter("n", n);
            tokio::spawn(async move { expression.evaluate().await.ok() })
        })
        .collect();

    for (n, task) in tasks.into_iter().enumerate() {
        let value = task.await.expect("task");
        assert_eq!(value, Some(Value::Int(n as i32 * 10)));
    }
}
