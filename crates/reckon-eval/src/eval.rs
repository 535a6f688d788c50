//! Tree-walking evaluation.
//! 树遍历求值。
//!
//! One evaluation is one future. Operands are evaluated left to right and
//! sibling subtrees never run concurrently; the future suspends only while
//! a resolution handler is pending.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use reckon_syntax::{BinOp, MAX_NESTING, Node, NodeKind};
use tracing::trace;

use crate::builtin;
use crate::error::{EvaluationError, Result};
use crate::expression::{Expression, Parameter, Variables};
use crate::handler::{FunctionArgs, FunctionHandler, ParameterArgs, ParameterHandler};
use crate::operators;
use crate::options::{EvaluateOptions, NumericPreference};
use crate::value::Value;

/// A pinned, boxed, sendable future. Recursion through the tree goes
/// through this type.
pub(crate) type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Everything an evaluation reads besides the tree itself.
/// All fields are cheap to clone.
#[derive(Clone, Default)]
pub(crate) struct Context {
    pub variables: Arc<Variables>,
    pub parameter_handlers: Arc<Vec<Arc<dyn ParameterHandler>>>,
    pub function_handlers: Arc<Vec<Arc<dyn FunctionHandler>>>,
    pub options: EvaluateOptions,
    pub preference: NumericPreference,
    /// Tree depth at which evaluation starts; nonzero for arguments and
    /// nested expressions evaluated on behalf of an enclosing tree.
    pub depth: usize,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("variables", &self.variables)
            .field("parameter_handlers", &self.parameter_handlers.len())
            .field("function_handlers", &self.function_handlers.len())
            .field("options", &self.options)
            .field("preference", &self.preference)
            .field("depth", &self.depth)
            .finish()
    }
}

impl Context {
    pub fn ignore_case(&self) -> bool {
        self.options.contains(EvaluateOptions::IGNORE_CASE)
    }

    /// Look a name up in the variable map: exact match first, then any
    /// case-insensitive match under `IGNORE_CASE`.
    pub fn lookup(&self, name: &str) -> Option<&Parameter> {
        if let Some(parameter) = self.variables.get(name) {
            return Some(parameter);
        }
        if !self.ignore_case() {
            return None;
        }
        let folded = name.to_lowercase();
        self.variables
            .iter()
            .find(|(key, _)| key.to_lowercase() == folded)
            .map(|(_, parameter)| parameter)
    }

    /// The context handed to argument expressions and nested expressions:
    /// the same bindings, evaluated once rather than per list element.
    pub fn single(&self) -> Context {
        let mut context = self.clone();
        context.options.remove(EvaluateOptions::ITERATE_PARAMETERS);
        context
    }
}

/// Evaluates nodes against a borrowed [`Context`].
/// 求值器。
pub(crate) struct Evaluator<'c> {
    ctx: &'c Context,
    depth: usize,
}

impl<'c> Evaluator<'c> {
    pub fn new(ctx: &'c Context) -> Self {
        Self {
            ctx,
            depth: ctx.depth,
        }
    }

    fn next_depth(&self) -> Result<usize> {
        if self.depth >= MAX_NESTING {
            return Err(EvaluationError::TooDeep(MAX_NESTING));
        }
        Ok(self.depth + 1)
    }

    /// An evaluator for the children of the node being evaluated.
    fn descend(&self) -> Result<Evaluator<'c>> {
        Ok(Evaluator {
            ctx: self.ctx,
            depth: self.next_depth()?,
        })
    }

    pub fn context(&self) -> &'c Context {
        self.ctx
    }

    /// Evaluate a node.
    /// 求值一个节点。
    pub fn evaluate<'a>(&'a self, node: &'a Node) -> BoxFuture<'a, Result<Value>> {
        Box::pin(async move {
            match &node.kind {
                NodeKind::Value(literal) => Ok(Value::from(literal)),

                NodeKind::Identifier(name) => self.resolve_parameter(name).await,

                NodeKind::Unary { op, operand } => {
                    let value = self.descend()?.evaluate(operand).await?;
                    operators::unary(*op, value)
                }

                NodeKind::Binary { op, left, right } => {
                    let inner = self.descend()?;
                    match op {
                        BinOp::And => {
                            let left = inner.evaluate(left).await?;
                            if !operators::truth("and", &left)? {
                                return Ok(Value::Bool(false));
                            }
                            let right = inner.evaluate(right).await?;
                            Ok(Value::Bool(operators::truth("and", &right)?))
                        }
                        BinOp::Or => {
                            let left = inner.evaluate(left).await?;
                            if operators::truth("or", &left)? {
                                return Ok(Value::Bool(true));
                            }
                            let right = inner.evaluate(right).await?;
                            Ok(Value::Bool(operators::truth("or", &right)?))
                        }
                        _ => {
                            let left = inner.evaluate(left).await?;
                            let right = inner.evaluate(right).await?;
                            operators::binary(*op, left, right, self.ctx)
                        }
                    }
                }

                NodeKind::Ternary {
                    condition,
                    then_branch,
                    else_branch,
                } => {
                    let inner = self.descend()?;
                    let condition = inner.evaluate(condition).await?;
                    if operators::truth("?:", &condition)? {
                        inner.evaluate(then_branch).await
                    } else {
                        inner.evaluate(else_branch).await
                    }
                }

                NodeKind::Call { name, args } => self.call(name, args).await,
            }
        })
    }

    async fn resolve_parameter(&self, name: &str) -> Result<Value> {
        let mut args = ParameterArgs::default();
        for (index, handler) in self.ctx.parameter_handlers.iter().enumerate() {
            trace!(parameter = name, handler = index, "invoking parameter handler");
            handler.evaluate_parameter(name, &mut args).await?;
            if args.has_result() {
                return Ok(args.into_result());
            }
        }

        match self.ctx.lookup(name) {
            Some(Parameter::Value(value)) => Ok(value.clone()),
            Some(Parameter::Expression(nested)) => {
                nested.evaluate_nested(self.ctx, self.next_depth()?).await
            }
            None => Err(EvaluationError::UnknownParameter(name.to_string())),
        }
    }

    async fn call(&self, name: &str, args: &[Arc<Node>]) -> Result<Value> {
        let inner = self.descend()?;
        if !self.ctx.function_handlers.is_empty() {
            let mut function_args = FunctionArgs::new(name, inner.arguments(args));
            for (index, handler) in self.ctx.function_handlers.iter().enumerate() {
                trace!(function = name, handler = index, "invoking function handler");
                handler.evaluate_function(name, &mut function_args).await?;
                if function_args.has_result() {
                    return Ok(function_args.into_result());
                }
            }
        }

        match builtin::lookup(name, self.ctx.ignore_case()) {
            Some(function) => builtin::call(function, &inner, name, args).await,
            None => Err(EvaluationError::UnknownFunction(name.to_string())),
        }
    }

    /// Wrap each argument node as an expression bound to this context,
    /// starting at this evaluator's depth.
    fn arguments(&self, args: &[Arc<Node>]) -> Vec<Expression> {
        let mut context = self.ctx.single();
        context.depth = self.depth;
        args.iter()
            .map(|arg| Expression::bound(Arc::clone(arg), context.clone()))
            .collect()
    }
}
