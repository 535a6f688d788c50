//! Resolution handlers for parameters and functions the expression does
//! not define itself.
//!
//! Handlers are chained: the evaluator calls them in registration order,
//! awaiting each, and stops at the first one that sets a result.

use std::future::Future;
use std::mem;

use async_trait::async_trait;

use crate::error::{EvaluationError, Result};
use crate::expression::Expression;
use crate::value::Value;

/// Output slot for a parameter resolution request.
#[derive(Debug, Clone, Default)]
pub struct ParameterArgs {
    result: Value,
    has_result: bool,
}

impl ParameterArgs {
    /// Resolve the parameter. Setting `Value::Null` still counts as resolved.
    pub fn set_result(&mut self, value: impl Into<Value>) {
        self.result = value.into();
        self.has_result = true;
    }

    pub fn result(&self) -> &Value {
        &self.result
    }

    pub fn has_result(&self) -> bool {
        self.has_result
    }

    pub(crate) fn into_result(self) -> Value {
        self.result
    }
}

/// A function resolution request: the unevaluated arguments plus an
/// output slot.
#[derive(Debug, Clone, Default)]
pub struct FunctionArgs {
    name: String,
    parameters: Vec<Expression>,
    result: Value,
    has_result: bool,
}

impl FunctionArgs {
    pub(crate) fn new(name: &str, parameters: Vec<Expression>) -> Self {
        Self {
            name: name.to_string(),
            parameters,
            ..Self::default()
        }
    }

    /// The function name as written in the expression.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The call's arguments, each bound to the caller's parameters, options
    /// and handlers. Nothing is evaluated until asked.
    pub fn parameters(&self) -> &[Expression] {
        &self.parameters
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    /// Evaluate the argument at `index`.
    pub async fn evaluate(&self, index: usize) -> Result<Value> {
        match self.parameters.get(index) {
            Some(argument) => argument.evaluate().await,
            None => Err(EvaluationError::argument(
                &self.name,
                format!(
                    "argument {} requested but the call has {}",
                    index,
                    self.parameters.len()
                ),
            )),
        }
    }

    /// Evaluate every argument, left to right.
    pub async fn evaluate_all(&self) -> Result<Vec<Value>> {
        let mut values = Vec::with_capacity(self.parameters.len());
        for argument in &self.parameters {
            values.push(argument.evaluate().await?);
        }
        Ok(values)
    }

    /// Resolve the call. Setting `Value::Null` still counts as resolved.
    pub fn set_result(&mut self, value: impl Into<Value>) {
        self.result = value.into();
        self.has_result = true;
    }

    pub fn result(&self) -> &Value {
        &self.result
    }

    pub fn has_result(&self) -> bool {
        self.has_result
    }

    pub(crate) fn into_result(self) -> Value {
        self.result
    }
}

/// Resolves identifiers.
#[async_trait]
pub trait ParameterHandler: Send + Sync {
    async fn evaluate_parameter(&self, name: &str, args: &mut ParameterArgs) -> Result<()>;
}

/// Resolves function calls.
#[async_trait]
pub trait FunctionHandler: Send + Sync {
    async fn evaluate_function(&self, name: &str, args: &mut FunctionArgs) -> Result<()>;
}

/// Async closures taking the name and the args by value, returning the
/// args back.
#[async_trait]
impl<F, Fut> ParameterHandler for F
where
    F: Fn(String, ParameterArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<ParameterArgs>> + Send + 'static,
{
    async fn evaluate_parameter(&self, name: &str, args: &mut ParameterArgs) -> Result<()> {
        let owned = mem::take(args);
        *args = self(name.to_string(), owned).await?;
        Ok(())
    }
}

#[async_trait]
impl<F, Fut> FunctionHandler for F
where
    F: Fn(String, FunctionArgs) -> Fut + Send + Sync,
    Fut: Future<Output = Result<FunctionArgs>> + Send + 'static,
{
    async fn evaluate_function(&self, name: &str, args: &mut FunctionArgs) -> Result<()> {
        let owned = mem::take(args);
        *args = self(name.to_string(), owned).await?;
        Ok(())
    }
}
