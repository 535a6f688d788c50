//! The `reckon eval` command.

use reckon_diagnostic::emit;
use reckon_eval::{EvaluationError, Expression};
use tracing::debug;

use crate::EvalFlags;
use crate::commands;
use crate::output;

pub async fn run(expr: &str, flags: &EvalFlags, verbose: bool) -> Result<(), String> {
    let mut expression = Expression::new(expr)
        .with_options(flags.options())
        .with_preference(flags.preference());
    for (name, value) in commands::parameters(flags).await? {
        debug!(parameter = %name, value = %value, "binding parameter");
        expression.set_parameter(name, value);
    }

    if verbose && let Ok(tree) = expression.compiled() {
        output::info(&format!("tree: {tree}"));
    }

    match expression.evaluate().await {
        Ok(value) => {
            println!("{value}");
            Ok(())
        }
        Err(EvaluationError::Compile(error)) => {
            for diag in error.diagnostics() {
                emit(expr, "<expr>", diag).map_err(|e| e.to_string())?;
            }
            Err(format!("{} syntax error(s) found", error.diagnostics().len()))
        }
        Err(e) => Err(commands::describe(&e)),
    }
}
