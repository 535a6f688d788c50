//! Operator semantics over runtime values.

use std::cmp::Ordering;

use reckon_syntax::{BinOp, UnaryOp};

use crate::error::{EvaluationError, Result};
use crate::eval::Context;
use crate::numbers::{self, Number};
use crate::value::Value;

fn mismatch(op: &str, left: &Value, right: &Value) -> EvaluationError {
    EvaluationError::type_error(format!(
        "operator '{}' cannot be applied to {} and {}",
        op,
        left.kind(),
        right.kind()
    ))
}

/// The boolean an operator or condition needs.
pub(crate) fn truth(op: &str, value: &Value) -> Result<bool> {
    value.as_bool().ok_or_else(|| {
        EvaluationError::type_error(format!(
            "operator '{}' needs a boolean, got {}",
            op,
            value.kind()
        ))
    })
}

pub(crate) fn unary(op: UnaryOp, operand: Value) -> Result<Value> {
    if op == UnaryOp::Not {
        return Ok(Value::Bool(!truth(op.symbol(), &operand)?));
    }
    let Some(n) = Number::from_value(&operand) else {
        return Err(EvaluationError::type_error(format!(
            "operator '{}' cannot be applied to {}",
            op.symbol(),
            operand.kind()
        )));
    };
    let result = match op {
        UnaryOp::Neg => numbers::negate(n)?,
        UnaryOp::BitNot => numbers::bit_not(n)?,
        _ => n,
    };
    Ok(result.into_value())
}

/// Every binary operator except the short-circuiting `and`/`or`, which the
/// evaluator handles before the right operand exists.
pub(crate) fn binary(op: BinOp, left: Value, right: Value, ctx: &Context) -> Result<Value> {
    match op {
        BinOp::And => Ok(Value::Bool(truth("and", &left)? && truth("and", &right)?)),
        BinOp::Or => Ok(Value::Bool(truth("or", &left)? || truth("or", &right)?)),

        BinOp::Eq => Ok(Value::Bool(values_equal(&left, &right, ctx)?)),
        BinOp::Ne => Ok(Value::Bool(!values_equal(&left, &right, ctx)?)),

        BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge => {
            let ordering = order(op, &left, &right, ctx)?;
            Ok(Value::Bool(match ordering {
                None => false,
                Some(o) => match op {
                    BinOp::Lt => o == Ordering::Less,
                    BinOp::Le => o != Ordering::Greater,
                    BinOp::Gt => o == Ordering::Greater,
                    _ => o != Ordering::Less,
                },
            }))
        }

        BinOp::Add if is_text(&left) || is_text(&right) => {
            let mut text = left.to_text();
            text.push_str(&right.to_text());
            Ok(Value::Text(text))
        }

        _ => {
            let (Some(a), Some(b)) = (Number::from_value(&left), Number::from_value(&right))
            else {
                return Err(mismatch(op.symbol(), &left, &right));
            };
            let result = match op {
                BinOp::Pow => numbers::power(a, b),
                _ if op.is_bitwise() => numbers::bitwise(op, a, b)?,
                _ => numbers::arithmetic(op, a, b, ctx.preference)?,
            };
            Ok(result.into_value())
        }
    }
}

fn is_text(value: &Value) -> bool {
    matches!(value, Value::Text(_))
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::List(_))
}

/// Text against a non-null scalar: both sides as text.
fn text_pair(left: &Value, right: &Value) -> Option<(String, String)> {
    let textual = (is_text(left) && is_scalar(right)) || (is_text(right) && is_scalar(left));
    textual.then(|| (left.to_text(), right.to_text()))
}

fn compare_text(a: &str, b: &str, ctx: &Context) -> Ordering {
    if ctx.ignore_case() {
        a.to_lowercase().cmp(&b.to_lowercase())
    } else {
        a.cmp(b)
    }
}

/// `==` semantics, also used by `in`.
pub(crate) fn values_equal(left: &Value, right: &Value, ctx: &Context) -> Result<bool> {
    if let Some((a, b)) = text_pair(left, right) {
        return Ok(compare_text(&a, &b, ctx) == Ordering::Equal);
    }
    if let (Some(a), Some(b)) = (Number::from_value(left), Number::from_value(right)) {
        return Ok(numbers::compare(a, b, ctx.preference) == Some(Ordering::Equal));
    }
    match (left, right) {
        (Value::Null, Value::Null) => Ok(true),
        (Value::Null, _) | (_, Value::Null) => Ok(false),
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (Value::DateTime(a), Value::DateTime(b)) => Ok(a == b),
        (Value::List(a), Value::List(b)) => {
            if a.len() != b.len() {
                return Ok(false);
            }
            for (x, y) in a.iter().zip(b) {
                if !values_equal(x, y, ctx)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        (Value::List(_), _) | (_, Value::List(_)) => Ok(false),
        _ => Err(mismatch("==", left, right)),
    }
}

/// Ordering for `< <= > >=`. `None` when a float operand is NaN.
fn order(op: BinOp, left: &Value, right: &Value, ctx: &Context) -> Result<Option<Ordering>> {
    if let Some((a, b)) = text_pair(left, right) {
        return Ok(Some(compare_text(&a, &b, ctx)));
    }
    if let (Some(a), Some(b)) = (Number::from_value(left), Number::from_value(right)) {
        return Ok(numbers::compare(a, b, ctx.preference));
    }
    match (left, right) {
        (Value::Bool(a), Value::Bool(b)) => Ok(Some(a.cmp(b))),
        (Value::DateTime(a), Value::DateTime(b)) => Ok(Some(a.cmp(b))),
        _ => Err(mismatch(op.symbol(), left, right)),
    }
}
