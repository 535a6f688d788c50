//! Compile and evaluation errors.

use std::error::Error as StdError;

use reckon_common::SourceMap;
use reckon_diagnostic::{Diagnostic, ErrorCode};
use thiserror::Error;

/// Expression text that failed to lex or parse.
#[derive(Debug, Clone, Error)]
pub enum CompileError {
    /// One `line L:C description` message per diagnostic, lexer first.
    #[error("{}", .messages.join("\n"))]
    Syntax {
        messages: Vec<String>,
        diagnostics: Vec<Diagnostic>,
    },
}

impl CompileError {
    pub(crate) fn syntax(source: &str, diagnostics: Vec<Diagnostic>) -> Self {
        let map = SourceMap::new(source);
        let messages = diagnostics.iter().map(|d| d.positioned(&map)).collect();
        CompileError::Syntax {
            messages,
            diagnostics,
        }
    }

    pub fn messages(&self) -> &[String] {
        match self {
            CompileError::Syntax { messages, .. } => messages,
        }
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        match self {
            CompileError::Syntax { diagnostics, .. } => diagnostics,
        }
    }
}

/// Evaluation errors.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("parameter '{0}' was not defined")]
    UnknownParameter(String),

    #[error("function '{0}' not found")]
    UnknownFunction(String),

    #[error("{name}() takes {expected} argument(s), got {found}")]
    Arity {
        name: String,
        expected: &'static str,
        found: usize,
    },

    #[error("type error: {0}")]
    Type(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("arithmetic overflow: {0}")]
    Overflow(String),

    #[error("cannot iterate parameters: {0}")]
    Broadcast(String),

    #[error("invalid argument to {name}(): {message}")]
    Argument { name: String, message: String },

    #[error("expression nests deeper than {0} levels")]
    TooDeep(usize),

    #[error("evaluation was cancelled")]
    Cancelled,

    #[error(transparent)]
    Compile(#[from] CompileError),

    /// A failure raised by a resolution handler, passed through untouched.
    #[error("{0}")]
    Handler(#[source] Box<dyn StdError + Send + Sync>),
}

impl EvaluationError {
    /// The diagnostic code for this failure. Syntax failures report the
    /// code of their first diagnostic.
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            EvaluationError::UnknownParameter(_) => Some(ErrorCode::UnknownParameter),
            EvaluationError::UnknownFunction(_) => Some(ErrorCode::UnknownFunction),
            EvaluationError::Arity { .. } => Some(ErrorCode::WrongArity),
            EvaluationError::Type(_) => Some(ErrorCode::TypeMismatch),
            EvaluationError::DivisionByZero => Some(ErrorCode::DivisionByZero),
            EvaluationError::Overflow(_) => Some(ErrorCode::Overflow),
            EvaluationError::TooDeep(_) => Some(ErrorCode::EvaluationTooDeep),
            EvaluationError::Compile(error) => error.diagnostics().first().and_then(|d| d.code),
            EvaluationError::Broadcast(_)
            | EvaluationError::Argument { .. }
            | EvaluationError::Cancelled
            | EvaluationError::Handler(_) => None,
        }
    }

    /// Wrap an embedding application's error for return from a handler.
    pub fn handler(error: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        EvaluationError::Handler(error.into())
    }

    pub(crate) fn type_error(message: impl Into<String>) -> Self {
        EvaluationError::Type(message.into())
    }

    pub(crate) fn arity(name: &str, expected: &'static str, found: usize) -> Self {
        EvaluationError::Arity {
            name: name.to_string(),
            expected,
            found,
        }
    }

    pub(crate) fn argument(name: &str, message: impl Into<String>) -> Self {
        EvaluationError::Argument {
            name: name.to_string(),
            message: message.into(),
        }
    }
}

/// Result alias used throughout the evaluator.
pub type Result<T, E = EvaluationError> = std::result::Result<T, E>;
