//! AST and syntax definitions for Reckon.
//!
//! This crate defines the immutable expression tree produced by the parser
//! and walked by the evaluator. Trees are shared behind `Arc` and never
//! mutated after construction.

mod expr;
mod literal;

pub use expr::*;
pub use literal::*;

/// Deepest nesting of operators, parentheses and calls the parser accepts
/// and the evaluator walks.
pub const MAX_NESTING: usize = 256;
