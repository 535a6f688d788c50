//! Built-in functions.
//!
//! Built-ins receive their argument nodes unevaluated and evaluate only
//! what they need, in order. Names match exactly unless `IGNORE_CASE`.

use std::cmp::Ordering;
use std::sync::Arc;

use reckon_syntax::Node;
use rust_decimal::Decimal;

use crate::error::{EvaluationError, Result};
use crate::eval::Evaluator;
use crate::numbers::{self, Number};
use crate::operators;
use crate::options::EvaluateOptions;
use crate::value::Value;

#[derive(Debug, Clone, Copy)]
pub(crate) enum Builtin {
    /// One argument, computed in `f64`.
    Unary(fn(f64) -> f64),
    /// Two arguments, computed in `f64`.
    Binary(fn(f64, f64) -> f64),
    Abs,
    Sign,
    Round,
    Max,
    Min,
    If,
    In,
}

const BUILTINS: &[(&str, Builtin)] = &[
    // === Math ===
    ("Abs", Builtin::Abs),
    ("Acos", Builtin::Unary(f64::acos)),
    ("Asin", Builtin::Unary(f64::asin)),
    ("Atan", Builtin::Unary(f64::atan)),
    ("Ceiling", Builtin::Unary(f64::ceil)),
    ("Cos", Builtin::Unary(f64::cos)),
    ("Exp", Builtin::Unary(f64::exp)),
    ("Floor", Builtin::Unary(f64::floor)),
    ("IEEERemainder", Builtin::Binary(ieee_remainder)),
    ("Ln", Builtin::Unary(f64::ln)),
    ("Log", Builtin::Binary(f64::log)),
    ("Log10", Builtin::Unary(f64::log10)),
    ("Pow", Builtin::Binary(f64::powf)),
    ("Round", Builtin::Round),
    ("Sign", Builtin::Sign),
    ("Sin", Builtin::Unary(f64::sin)),
    ("Sqrt", Builtin::Unary(f64::sqrt)),
    ("Tan", Builtin::Unary(f64::tan)),
    ("Truncate", Builtin::Unary(f64::trunc)),
    // === Comparison ===
    ("Max", Builtin::Max),
    ("Min", Builtin::Min),
    // === Control ===
    ("if", Builtin::If),
    ("in", Builtin::In),
];

/// Largest digit count `Round` accepts.
const MAX_ROUND_DIGITS: i64 = 15;

/// Magnitude at which an `f64` has no fractional digits left to round.
const ROUND_LIMIT: f64 = 1e16;

pub(crate) fn lookup(name: &str, ignore_case: bool) -> Option<Builtin> {
    BUILTINS
        .iter()
        .find(|(candidate, _)| {
            if ignore_case {
                candidate.eq_ignore_ascii_case(name)
            } else {
                *candidate == name
            }
        })
        .map(|(_, builtin)| *builtin)
}

/// The remainder of `x / y` rounded to the nearest integer, ties to even.
fn ieee_remainder(x: f64, y: f64) -> f64 {
    x - y * (x / y).round_ties_even()
}

fn expect_arity(name: &str, args: &[Arc<Node>], count: usize, expected: &'static str) -> Result<()> {
    if args.len() == count {
        Ok(())
    } else {
        Err(EvaluationError::arity(name, expected, args.len()))
    }
}

async fn number(evaluator: &Evaluator<'_>, name: &str, arg: &Node) -> Result<Number> {
    let value = evaluator.evaluate(arg).await?;
    Number::from_value(&value).ok_or_else(|| {
        EvaluationError::argument(name, format!("expected a number, got {}", value.kind()))
    })
}

async fn float(evaluator: &Evaluator<'_>, name: &str, arg: &Node) -> Result<f64> {
    Ok(number(evaluator, name, arg).await?.to_f64())
}

pub(crate) async fn call(
    builtin: Builtin,
    evaluator: &Evaluator<'_>,
    name: &str,
    args: &[Arc<Node>],
) -> Result<Value> {
    match builtin {
        Builtin::Unary(f) => {
            expect_arity(name, args, 1, "1")?;
            Ok(Value::Double(f(float(evaluator, name, &args[0]).await?)))
        }

        Builtin::Binary(f) => {
            expect_arity(name, args, 2, "2")?;
            let x = float(evaluator, name, &args[0]).await?;
            let y = float(evaluator, name, &args[1]).await?;
            Ok(Value::Double(f(x, y)))
        }

        Builtin::Abs => {
            expect_arity(name, args, 1, "1")?;
            let d: Decimal = number(evaluator, name, &args[0]).await?.to_decimal()?;
            Ok(Value::Decimal(d.abs()))
        }

        Builtin::Sign => {
            expect_arity(name, args, 1, "1")?;
            let sign = match number(evaluator, name, &args[0]).await? {
                Number::Decimal(d) if d.is_zero() => 0,
                Number::Decimal(d) if d.is_sign_negative() => -1,
                Number::Decimal(_) => 1,
                other => {
                    let x = other.to_f64();
                    if x.is_nan() {
                        return Err(EvaluationError::argument(name, "NaN has no sign"));
                    }
                    match x.partial_cmp(&0.0) {
                        Some(Ordering::Less) => -1,
                        Some(Ordering::Greater) => 1,
                        _ => 0,
                    }
                }
            };
            Ok(Value::Int(sign))
        }

        Builtin::Round => {
            expect_arity(name, args, 2, "2")?;
            let x = float(evaluator, name, &args[0]).await?;
            let digits = number(evaluator, name, &args[1])
                .await?
                .as_i64()
                .filter(|d| (0..=MAX_ROUND_DIGITS).contains(d))
                .ok_or_else(|| {
                    EvaluationError::argument(
                        name,
                        format!("digits must be an integer from 0 to {}", MAX_ROUND_DIGITS),
                    )
                })?;
            let away = evaluator
                .context()
                .options
                .contains(EvaluateOptions::ROUND_AWAY_FROM_ZERO);
            Ok(Value::Double(round(x, digits as i32, away)))
        }

        Builtin::Max | Builtin::Min => {
            expect_arity(name, args, 2, "2")?;
            let a = number(evaluator, name, &args[0]).await?;
            let b = number(evaluator, name, &args[1]).await?;
            let keep = match builtin {
                Builtin::Max => Ordering::Greater,
                _ => Ordering::Less,
            };
            let preference = evaluator.context().preference;
            Ok(numbers::pick(a, b, preference, keep)?.into_value())
        }

        Builtin::If => {
            expect_arity(name, args, 3, "3")?;
            let condition = evaluator.evaluate(&args[0]).await?;
            let Some(condition) = condition.as_bool() else {
                return Err(EvaluationError::argument(
                    name,
                    format!("condition must be a boolean, got {}", condition.kind()),
                ));
            };
            let branch = if condition { &args[1] } else { &args[2] };
            evaluator.evaluate(branch).await
        }

        Builtin::In => {
            if args.len() < 2 {
                return Err(EvaluationError::arity(name, "at least 2", args.len()));
            }
            let target = evaluator.evaluate(&args[0]).await?;
            for candidate in &args[1..] {
                let candidate = evaluator.evaluate(candidate).await?;
                if operators::values_equal(&target, &candidate, evaluator.context())? {
                    return Ok(Value::Bool(true));
                }
            }
            Ok(Value::Bool(false))
        }
    }
}

/// Round to `digits` decimal places. Midpoints go to the even neighbour
/// unless `away` is set. Values too large to carry fractional digits are
/// returned unchanged.
fn round(x: f64, digits: i32, away: bool) -> f64 {
    if !x.is_finite() || x.abs() >= ROUND_LIMIT {
        return x;
    }
    let scale = 10f64.powi(digits);
    let scaled = x * scale;
    if !scaled.is_finite() {
        return x;
    }
    let rounded = if away {
        scaled.round()
    } else {
        scaled.round_ties_even()
    };
    rounded / scale
}
