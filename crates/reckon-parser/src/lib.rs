//! Parser for Reckon.
//!
//! This crate provides a recursive descent parser that converts
//! tokens into an expression tree.
//!
//! ## Error Recovery
//!
//! The parser keeps going after an error, so a single pass reports every
//! problem in the expression. Lexer diagnostics come first, then parser
//! diagnostics, in source order within each group.

mod parser;
mod recovery;

pub use parser::Parser;
pub use recovery::DelimiterStack;

use reckon_diagnostic::{Diagnostic, Severity};
use reckon_lexer::Lexer;
use reckon_syntax::Node;

/// Parse expression text into a tree.
///
/// Returns `None` for the tree whenever any error diagnostic was produced.
pub fn parse(source: &str) -> (Option<Node>, Vec<Diagnostic>) {
    let lexer = Lexer::new(source);
    let (tokens, mut diagnostics) = lexer.tokenize();

    let mut parser = Parser::new(tokens);
    let node = parser.parse_expression();

    diagnostics.extend(parser.diagnostics());
    let failed = diagnostics.iter().any(|d| d.severity == Severity::Error);
    (if failed { None } else { Some(node) }, diagnostics)
}
