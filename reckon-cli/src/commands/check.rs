//! The `reckon check` command.
//! `reckon check` 命令。

use crate::output;
use reckon_diagnostic::emit;
use reckon_eval::{EvaluateOptions, Expression};

/// Report the syntax errors in an expression.
/// 报告表达式中的语法错误。
pub fn run(expr: &str, verbose: bool) -> Result<(), String> {
    let expression = Expression::new(expr).with_options(EvaluateOptions::NO_CACHE);

    let tree = match expression.compiled() {
        Ok(tree) => tree,
        Err(error) => {
            for diag in error.diagnostics() {
                emit(expr, "<expr>", diag).map_err(|e| e.to_string())?;
            }
            return Err(format!("{} syntax error(s) found", error.diagnostics().len()));
        }
    };

    if verbose {
        output::info(&format!("tree: {tree}"));
    }

    output::success("OK - No errors found");
    Ok(())
}
