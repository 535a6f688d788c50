//! The expression facade: source text or a prebuilt tree, plus the
//! parameters, handlers and options it evaluates with.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use chrono::{NaiveDate, NaiveDateTime};
use reckon_syntax::Node;
use rust_decimal::Decimal;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::broadcast;
use crate::cache;
use crate::error::{CompileError, EvaluationError, Result};
use crate::eval::{Context, Evaluator};
use crate::handler::{FunctionHandler, ParameterHandler};
use crate::options::{EvaluateOptions, NumericPreference};
use crate::value::Value;

/// A named parameter's binding.
#[derive(Debug, Clone)]
pub enum Parameter {
    Value(Value),
    /// Evaluated on each reference, with the referencing expression's
    /// parameters laid over its own and its handlers chained after its own.
    Expression(Expression),
}

/// Parameter bindings by name.
pub type Variables = HashMap<String, Parameter>;

impl From<Value> for Parameter {
    fn from(value: Value) -> Self {
        Parameter::Value(value)
    }
}

impl From<Expression> for Parameter {
    fn from(expression: Expression) -> Self {
        Parameter::Expression(expression)
    }
}

macro_rules! parameter_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Parameter {
                fn from(value: $ty) -> Self {
                    Parameter::Value(value.into())
                }
            }
        )*
    };
}

parameter_from!(bool, i32, i64, f32, f64, Decimal, String, &str, NaiveDateTime, NaiveDate);

impl<T: Into<Value>> From<Vec<T>> for Parameter {
    fn from(items: Vec<T>) -> Self {
        Parameter::Value(items.into())
    }
}

#[derive(Debug, Clone)]
enum Source {
    Text(Arc<str>),
    Ast(Arc<Node>),
}

/// An evaluable expression.
///
/// Cloning is cheap: the tree, the parameter map and the handler chains are
/// shared until one of the clones is modified.
///
/// ```ignore
/// let value = Expression::new("2 * [x] + Abs(y)")
///     .with_parameter("x", 4)
///     .with_parameter("y", -1)
///     .evaluate()
///     .await?;
/// ```
#[derive(Clone)]
pub struct Expression {
    source: Source,
    context: Context,
    compiled: OnceLock<Result<Arc<Node>, CompileError>>,
}

impl Default for Expression {
    fn default() -> Self {
        Self::new("")
    }
}

impl fmt::Debug for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut debug = f.debug_struct("Expression");
        match &self.source {
            Source::Text(text) => debug.field("text", text),
            Source::Ast(tree) => debug.field("tree", &tree.to_string()),
        };
        debug
            .field("options", &self.context.options)
            .field("parameters", &self.context.variables.len())
            .finish()
    }
}

impl Expression {
    /// An expression over source text. Parsing happens on first use.
    pub fn new(text: impl Into<Arc<str>>) -> Self {
        Self::with_source(Source::Text(text.into()), Context::default())
    }

    /// An expression over an already-built tree.
    pub fn from_ast(tree: Arc<Node>) -> Self {
        Self::with_source(Source::Ast(tree), Context::default())
    }

    /// A tree evaluated in an existing context, for function arguments.
    pub(crate) fn bound(tree: Arc<Node>, context: Context) -> Self {
        Self::with_source(Source::Ast(tree), context)
    }

    fn with_source(source: Source, context: Context) -> Self {
        Self {
            source,
            context,
            compiled: OnceLock::new(),
        }
    }

    // ----- configuration -----

    pub fn with_options(mut self, options: EvaluateOptions) -> Self {
        self.context.options = options;
        self
    }

    pub fn with_preference(mut self, preference: NumericPreference) -> Self {
        self.context.preference = preference;
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<Parameter>) -> Self {
        self.set_parameter(name, value);
        self
    }

    /// Append a parameter handler to the chain.
    pub fn on_parameter(mut self, handler: impl ParameterHandler + 'static) -> Self {
        self.add_parameter_handler(Arc::new(handler));
        self
    }

    /// Append a function handler to the chain.
    pub fn on_function(mut self, handler: impl FunctionHandler + 'static) -> Self {
        self.add_function_handler(Arc::new(handler));
        self
    }

    pub fn options(&self) -> EvaluateOptions {
        self.context.options
    }

    pub fn set_options(&mut self, options: EvaluateOptions) {
        self.context.options = options;
    }

    pub fn preference(&self) -> NumericPreference {
        self.context.preference
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<Parameter>) {
        Arc::make_mut(&mut self.context.variables).insert(name.into(), value.into());
    }

    pub fn remove_parameter(&mut self, name: &str) -> Option<Parameter> {
        Arc::make_mut(&mut self.context.variables).remove(name)
    }

    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.context.variables.get(name)
    }

    pub fn parameters(&self) -> &Variables {
        &self.context.variables
    }

    pub fn add_parameter_handler(&mut self, handler: Arc<dyn ParameterHandler>) {
        Arc::make_mut(&mut self.context.parameter_handlers).push(handler);
    }

    pub fn add_function_handler(&mut self, handler: Arc<dyn FunctionHandler>) {
        Arc::make_mut(&mut self.context.function_handlers).push(handler);
    }

    // ----- compilation -----

    /// The source text, or the rendered tree for expressions built from one.
    pub fn text(&self) -> String {
        match &self.source {
            Source::Text(text) => text.to_string(),
            Source::Ast(tree) => tree.to_string(),
        }
    }

    /// The parsed tree. Text is compiled once per expression, through the
    /// shared cache unless `NO_CACHE` is set.
    pub fn compiled(&self) -> Result<Arc<Node>, CompileError> {
        match &self.source {
            Source::Ast(tree) => Ok(Arc::clone(tree)),
            Source::Text(text) => self
                .compiled
                .get_or_init(|| {
                    let no_cache = self.context.options.contains(EvaluateOptions::NO_CACHE);
                    cache::compile(text, no_cache)
                })
                .clone(),
        }
    }

    pub fn has_errors(&self) -> bool {
        self.compiled().is_err()
    }

    /// The rendered syntax error, if the text does not compile.
    pub fn error(&self) -> Option<String> {
        self.compiled().err().map(|error| error.to_string())
    }

    // ----- evaluation -----

    /// Evaluate. Under `ITERATE_PARAMETERS` the result is a list with one
    /// element per position of the list-valued parameters.
    pub async fn evaluate(&self) -> Result<Value> {
        let tree = self.compiled()?;
        if self
            .context
            .options
            .contains(EvaluateOptions::ITERATE_PARAMETERS)
        {
            broadcast::run(&tree, &self.context).await
        } else {
            Evaluator::new(&self.context).evaluate(&tree).await
        }
    }

    /// Evaluate until `token` is cancelled. A cancelled evaluation yields
    /// [`EvaluationError::Cancelled`] and no result.
    pub async fn evaluate_with_cancel(&self, token: &CancellationToken) -> Result<Value> {
        tokio::select! {
            biased;
            _ = token.cancelled() => {
                debug!(expression = %self.text(), "evaluation cancelled");
                Err(EvaluationError::Cancelled)
            }
            result = self.evaluate() => result,
        }
    }

    /// Evaluate as the value of a parameter referenced from `outer`, with
    /// the root of this expression's tree at `depth`.
    pub(crate) async fn evaluate_nested(&self, outer: &Context, depth: usize) -> Result<Value> {
        let tree = self.compiled()?;

        let mut context = self.context.single();
        context.depth = depth;
        if !outer.variables.is_empty() {
            let variables = Arc::make_mut(&mut context.variables);
            for (name, parameter) in outer.variables.iter() {
                variables.insert(name.clone(), parameter.clone());
            }
        }
        if !outer.parameter_handlers.is_empty() {
            Arc::make_mut(&mut context.parameter_handlers)
                .extend(outer.parameter_handlers.iter().cloned());
        }
        if !outer.function_handlers.is_empty() {
            Arc::make_mut(&mut context.function_handlers)
                .extend(outer.function_handlers.iter().cloned());
        }

        Evaluator::new(&context).evaluate(&tree).await
    }
}

/// Evaluate a tree once with the given bindings and handlers.
pub async fn evaluate(
    tree: Arc<Node>,
    variables: Variables,
    options: EvaluateOptions,
    preference: NumericPreference,
    parameter_handlers: Vec<Arc<dyn ParameterHandler>>,
    function_handlers: Vec<Arc<dyn FunctionHandler>>,
) -> Result<Value> {
    let context = Context {
        variables: Arc::new(variables),
        parameter_handlers: Arc::new(parameter_handlers),
        function_handlers: Arc::new(function_handlers),
        options,
        preference,
        depth: 0,
    };
    Expression::with_source(Source::Ast(tree), context)
        .evaluate()
        .await
}
