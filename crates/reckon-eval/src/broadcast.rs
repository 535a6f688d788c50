//! Element-wise evaluation over list-valued parameters.
//!
//! Every list-valued parameter is a sequence; all sequences must have the
//! same length `n`. The tree is evaluated `n` times, with each sequence
//! parameter bound to its i-th element on pass `i`. Bindings are made on a
//! private copy of the variables; the caller's map is never touched.

use std::sync::Arc;

use reckon_syntax::Node;
use tracing::debug;

use crate::error::{EvaluationError, Result};
use crate::eval::{Context, Evaluator};
use crate::expression::Parameter;
use crate::value::Value;

pub(crate) async fn run(tree: &Node, ctx: &Context) -> Result<Value> {
    let mut sequences: Vec<(String, std::vec::IntoIter<Value>)> = ctx
        .variables
        .iter()
        .filter_map(|(name, parameter)| match parameter {
            Parameter::Value(Value::List(items)) => Some((name.clone(), items.clone().into_iter())),
            _ => None,
        })
        .collect();
    sequences.sort_by(|a, b| a.0.cmp(&b.0));

    let Some(count) = sequences.first().map(|(_, items)| items.len()) else {
        debug!("no list parameters to iterate");
        return Ok(Value::List(Vec::new()));
    };
    if let Some((name, items)) = sequences.iter().find(|(_, items)| items.len() != count) {
        return Err(EvaluationError::Broadcast(format!(
            "parameter '{}' has {} elements but '{}' has {}",
            name,
            items.len(),
            sequences[0].0,
            count
        )));
    }
    debug!(iterations = count, sequences = sequences.len(), "iterating parameters");

    let mut context = ctx.single();
    let mut results = Vec::with_capacity(count);
    for _ in 0..count {
        let variables = Arc::make_mut(&mut context.variables);
        for (name, items) in &mut sequences {
            if let Some(item) = items.next() {
                variables.insert(name.clone(), Parameter::Value(item));
            }
        }
        results.push(Evaluator::new(&context).evaluate(tree).await?);
    }
    Ok(Value::List(results))
}
