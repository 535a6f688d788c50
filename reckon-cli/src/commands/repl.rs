//! The `reckon repl` command.

use std::collections::BTreeMap;

use reckon_diagnostic::emit;
use reckon_eval::{EvaluationError, Expression, Value, cache};
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::EvalFlags;
use crate::commands;
use crate::output;

const HELP: &str = "\
Commands:
  :help, :h              Show this help
  :quit, :q              Exit the REPL
  :set <name> = <expr>   Bind a parameter to the value of an expression
  :unset <name>          Remove a binding
  :vars                  Show current bindings
  :cache on|off          Turn the expression cache on or off";

/// Session state: parameter bindings carried from line to line.
struct Session {
    flags: EvalFlags,
    bindings: BTreeMap<String, Value>,
}

impl Session {
    fn expression(&self, text: &str) -> Expression {
        let mut expression = Expression::new(text)
            .with_options(self.flags.options())
            .with_preference(self.flags.preference());
        for (name, value) in &self.bindings {
            expression.set_parameter(name.clone(), value.clone());
        }
        expression
    }

    async fn evaluate(&self, text: &str) -> Option<Value> {
        match self.expression(text).evaluate().await {
            Ok(value) => Some(value),
            Err(EvaluationError::Compile(error)) => {
                for diag in error.diagnostics() {
                    if let Err(e) = emit(text, "<repl>", diag) {
                        output::error(&e.to_string());
                    }
                }
                None
            }
            Err(e) => {
                output::error(&commands::describe(&e));
                None
            }
        }
    }

    /// Handle a `:` command. Returns false to end the session.
    async fn command(&mut self, line: &str) -> bool {
        let (command, rest) = line.split_once(' ').unwrap_or((line, ""));
        let rest = rest.trim();
        match command {
            ":quit" | ":q" => return false,
            ":help" | ":h" => println!("{HELP}"),
            ":vars" => {
                if self.bindings.is_empty() {
                    println!("(no bindings)");
                }
                for (name, value) in &self.bindings {
                    println!("  {name} = {value}");
                }
            }
            ":set" => match rest.split_once('=') {
                Some((name, text)) if !name.trim().is_empty() => {
                    if let Some(value) = self.evaluate(text.trim()).await {
                        println!("{} = {}", name.trim(), value);
                        self.bindings.insert(name.trim().to_string(), value);
                    }
                }
                _ => output::warning("usage: :set <name> = <expr>"),
            },
            ":unset" => {
                if self.bindings.remove(rest).is_none() {
                    output::warning(&format!("'{rest}' is not bound"));
                }
            }
            ":cache" => match rest {
                "on" => cache::set_enabled(true),
                "off" => cache::set_enabled(false),
                "" => println!(
                    "cache is {} ({} entries)",
                    if cache::is_enabled() { "on" } else { "off" },
                    cache::live_len()
                ),
                _ => output::warning("usage: :cache on|off"),
            },
            _ => output::warning(&format!("unknown command: {line}")),
        }
        true
    }
}

pub async fn run(flags: &EvalFlags) -> Result<(), String> {
    println!("Reckon REPL v{}", env!("CARGO_PKG_VERSION"));
    println!("Type :help for help, :quit to exit");
    println!();

    let mut session = Session {
        flags: flags.clone(),
        bindings: commands::parameters(flags).await?.into_iter().collect(),
    };

    let mut rl = DefaultEditor::new().map_err(|e| e.to_string())?;

    loop {
        match rl.readline("reckon> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                let _ = rl.add_history_entry(line);

                if line.starts_with(':') {
                    if !session.command(line).await {
                        break;
                    }
                    continue;
                }

                if let Some(value) = session.evaluate(line).await {
                    println!("{value}");
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => break,
            Err(err) => {
                output::error(&err.to_string());
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}
