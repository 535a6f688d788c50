//! CLI command implementations.

pub mod check;
pub mod eval;
pub mod repl;

use reckon_eval::{EvaluateOptions, EvaluationError, Expression, Value};

use crate::EvalFlags;

/// Evaluate a parameter's value text on its own: no parameters, no cache.
pub async fn evaluate_literal(text: &str) -> Result<Value, String> {
    Expression::new(text.trim())
        .with_options(EvaluateOptions::NO_CACHE)
        .evaluate()
        .await
        .map_err(|e| format!("invalid value '{}': {}", text, e))
}

/// Render an evaluation error, prefixed with its code when it has one.
/// 渲染求值错误，附带错误码。
pub fn describe(error: &EvaluationError) -> String {
    match error.code() {
        Some(code) => format!("[{}] {}", code.as_str(), error),
        None => error.to_string(),
    }
}

/// Parse the repeated `-p name=value` flags. A name given more than once
/// collects its values into a list, in order.
/// 解析 `-p name=value` 参数。
pub async fn parameters(flags: &EvalFlags) -> Result<Vec<(String, Value)>, String> {
    let mut bound: Vec<(String, Value)> = Vec::new();
    for param in &flags.params {
        let Some((name, text)) = param.split_once('=') else {
            return Err(format!("parameter '{}' is not of the form name=value", param));
        };
        let name = name.trim();
        if name.is_empty() {
            return Err(format!("parameter '{}' has an empty name", param));
        }
        let value = evaluate_literal(text).await?;

        match bound.iter_mut().find(|(existing, _)| existing == name) {
            Some((_, Value::List(items))) => items.push(value),
            Some((_, previous)) => {
                let first = std::mem::take(previous);
                *previous = Value::List(vec![first, value]);
            }
            None => bound.push((name.to_string(), value)),
        }
    }
    Ok(bound)
}
