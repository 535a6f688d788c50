//! Integration tests for parameter and function resolution handlers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use reckon_eval::{
    EvaluationError, Expression, FunctionArgs, FunctionHandler, ParameterArgs, ParameterHandler,
    Value, async_trait,
};
use rust_decimal_macros::dec;
use tokio_util::sync::CancellationToken;

type Log = Arc<Mutex<Vec<String>>>;

fn record(log: &Log, entry: String) {
    log.lock().expect("log lock").push(entry);
}

// ============================================================================
// Parameter handlers
// ============================================================================

#[tokio::test]
async fn test_parameter_handler_resolves() {
    let result = Expression::new("[x] + [y]")
        .on_parameter(|name: String, mut args: ParameterArgs| async move {
            match name.as_str() {
                "x" => args.set_result(1),
                "y" => args.set_result(2),
                _ => {}
            }
            Ok::<_, EvaluationError>(args)
        })
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Int(3)));
}

#[tokio::test]
async fn test_handler_runs_before_variables() {
    let result = Expression::new("[x]")
        .with_parameter("x", 1)
        .on_parameter(|_name: String, mut args: ParameterArgs| async move {
            args.set_result(42);
            Ok::<_, EvaluationError>(args)
        })
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Int(42)));
}

#[tokio::test]
async fn test_unresolved_falls_through_to_variables() {
    let result = Expression::new("[x] * 2")
        .with_parameter("x", 4)
        .on_parameter(|_name: String, args: ParameterArgs| async move {
            Ok::<_, EvaluationError>(args)
        })
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Int(8)));
}

#[tokio::test]
async fn test_null_result_counts_as_resolved() {
    let log: Log = Arc::default();
    let second = {
        let log = log.clone();
        move |name: String, mut args: ParameterArgs| {
            let log = log.clone();
            async move {
                record(&log, format!("second:{name}"));
                args.set_result(7);
                Ok::<_, EvaluationError>(args)
            }
        }
    };

    let result = Expression::new("[x]")
        .on_parameter(|_name: String, mut args: ParameterArgs| async move {
            args.set_result(Value::Null);
            Ok::<_, EvaluationError>(args)
        })
        .on_parameter(second)
        .evaluate()
        .await;
    assert!(result.is_ok_and(|value| value.is_null()));
    assert!(log.lock().expect("log lock").is_empty());
}

// ============================================================================
// Function handlers
// ============================================================================

#[tokio::test]
async fn test_chained_handlers_run_in_order() {
    let log: Log = Arc::default();

    // Slow on purpose: the second handler must still wait for it.
    let first = {
        let log = log.clone();
        move |name: String, mut args: FunctionArgs| {
            let log = log.clone();
            async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                record(&log, format!("first:{name}"));
                if name == "a" {
                    let x = args.evaluate(0).await?;
                    args.set_result(x.as_i64().unwrap_or_default() * 10);
                }
                Ok::<_, EvaluationError>(args)
            }
        }
    };
    let second = {
        let log = log.clone();
        move |name: String, mut args: FunctionArgs| {
            let log = log.clone();
            async move {
                record(&log, format!("second:{name}"));
                if name == "b" {
                    let x = args.evaluate(0).await?;
                    args.set_result(x.as_i64().unwrap_or_default() * 100);
                }
                Ok::<_, EvaluationError>(args)
            }
        }
    };

    let result = Expression::new("a(10) + b(20)")
        .on_function(first)
        .on_function(second)
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Long(2100)));
    assert_eq!(
        *log.lock().expect("log lock"),
        vec!["first:a", "first:b", "second:b"]
    );
}

#[tokio::test]
async fn test_arguments_use_caller_parameters() {
    let result = Expression::new("double([x] + 1)")
        .with_parameter("x", 20)
        .on_function(|name: String, mut args: FunctionArgs| async move {
            if name == "double" {
                let value = args.evaluate(0).await?;
                args.set_result(value.as_i64().unwrap_or_default() * 2);
            }
            Ok::<_, EvaluationError>(args)
        })
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Long(42)));
}

#[tokio::test]
async fn test_arguments_are_not_evaluated_unless_asked() {
    let result = Expression::new("first([ok], [missing])")
        .with_parameter("ok", "yes")
        .on_function(|_name: String, mut args: FunctionArgs| async move {
            let value = args.evaluate(0).await?;
            args.set_result(value);
            Ok::<_, EvaluationError>(args)
        })
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::from("yes")));
}

#[tokio::test]
async fn test_unhandled_calls_reach_builtins() {
    let result = Expression::new("Abs(-3) + custom()")
        .on_function(|name: String, mut args: FunctionArgs| async move {
            if name == "custom" {
                args.set_result(dec!(0.5));
            }
            Ok::<_, EvaluationError>(args)
        })
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Decimal(dec!(3.5))));
}

#[tokio::test]
async fn test_argument_index_out_of_range() {
    let result = Expression::new("f(1)")
        .on_function(|_name: String, mut args: FunctionArgs| async move {
            let value = args.evaluate(3).await?;
            args.set_result(value);
            Ok::<_, EvaluationError>(args)
        })
        .evaluate()
        .await;
    assert!(matches!(result, Err(EvaluationError::Argument { name, .. }) if name == "f"));
}

#[tokio::test]
async fn test_evaluate_all_arguments() {
    let result = Expression::new("sum(1, 2, [x])")
        .with_parameter("x", 3)
        .on_function(|_name: String, mut args: FunctionArgs| async move {
            let total: i64 = args
                .evaluate_all()
                .await?
                .iter()
                .filter_map(Value::as_i64)
                .sum();
            args.set_result(total);
            Ok::<_, EvaluationError>(args)
        })
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Long(6)));
}

#[tokio::test]
async fn test_handler_reads_argument_values() {
    let result = Expression::new("convert('km', [distance])")
        .with_parameter("distance", 2.5)
        .on_function(|name: String, mut args: FunctionArgs| async move {
            if name == "convert" {
                let unit = args.evaluate(0).await?;
                let amount = args.evaluate(1).await?.as_f64().unwrap_or_default();
                match unit.as_str() {
                    Some("km") => args.set_result(amount * 1000.0),
                    _ => return Err(EvaluationError::handler("unknown unit")),
                }
            }
            Ok::<_, EvaluationError>(args)
        })
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Double(2500.0)));
}

// ============================================================================
// Trait implementations and errors
// ============================================================================

struct Lookup {
    rate: f64,
}

#[async_trait]
impl ParameterHandler for Lookup {
    async fn evaluate_parameter(&self, name: &str, args: &mut ParameterArgs) -> reckon_eval::Result<()> {
        if name == "rate" {
            args.set_result(self.rate);
        }
        Ok(())
    }
}

struct Failing;

#[async_trait]
impl FunctionHandler for Failing {
    async fn evaluate_function(&self, name: &str, _args: &mut FunctionArgs) -> reckon_eval::Result<()> {
        Err(EvaluationError::handler(format!("backend unavailable for {name}")))
    }
}

#[tokio::test]
async fn test_trait_handler() {
    let result = Expression::new("[rate] * 2")
        .on_parameter(Lookup { rate: 1.25 })
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Double(2.5)));
}

#[tokio::test]
async fn test_handler_error_propagates() {
    let result = Expression::new("1 + fetch()").on_function(Failing).evaluate().await;
    match result {
        Err(EvaluationError::Handler(source)) => {
            assert_eq!(source.to_string(), "backend unavailable for fetch");
        }
        other => panic!("expected a handler error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_nested_expression_chains_outer_handlers() {
    let inner = Expression::new("[base] + 1");
    let result = Expression::new("[derived] * 10")
        .with_parameter("derived", inner)
        .on_parameter(Lookup { rate: 0.0 })
        .on_parameter(|name: String, mut args: ParameterArgs| async move {
            if name == "base" {
                args.set_result(4);
            }
            Ok::<_, EvaluationError>(args)
        })
        .evaluate()
        .await;
    assert_eq!(result.ok(), Some(Value::Int(50)));
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancelled_evaluation_yields_no_result() {
    let token = CancellationToken::new();
    let expression = Expression::new("1 + never()").on_function(
        |_name: String, args: FunctionArgs| async move {
            std::future::pending::<()>().await;
            Ok::<_, EvaluationError>(args)
        },
    );

    let cancel = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(10)).await;
        cancel.cancel();
    });

    let result = expression.evaluate_with_cancel(&token).await;
    assert!(matches!(result, Err(EvaluationError::Cancelled)));
}

#[tokio::test]
async fn test_dropping_the_future_cancels() {
    let expression = Expression::new("slow()").on_function(
        |_name: String, mut args: FunctionArgs| async move {
            tokio::time::sleep(Duration::from_secs(60)).await;
            args.set_result(1);
            Ok::<_, EvaluationError>(args)
        },
    );
    let outcome = tokio::time::timeout(Duration::from_millis(10), expression.evaluate()).await;
    assert!(outcome.is_err());
}
