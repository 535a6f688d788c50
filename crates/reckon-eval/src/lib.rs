//! Asynchronous evaluator for Reckon expressions.
//!
//! Text is parsed once into an immutable tree (shared through a weak
//! cache), then walked by an async evaluator that asks registered handlers
//! for any parameter or function the expression does not bind itself.

mod broadcast;
mod builtin;
mod error;
mod eval;
mod expression;
mod handler;
mod numbers;
mod operators;
mod options;
mod value;

pub mod cache;

pub use cache::compile;
pub use error::{CompileError, EvaluationError, Result};
pub use expression::{Expression, Parameter, Variables, evaluate};
pub use handler::{FunctionArgs, FunctionHandler, ParameterArgs, ParameterHandler};
pub use options::{EvaluateOptions, NumericPreference};
pub use value::{Value, ValueKind};

pub use async_trait::async_trait;
