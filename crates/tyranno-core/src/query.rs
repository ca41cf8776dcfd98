//! Query evaluation
//!
//! Queries are JMESPath expressions. Every function in the
//! [`FunctionRegistry`] is bridged into the JMESPath runtime next to the
//! standard JMESPath functions, so `semver_max(@)` and `join(', ', @)`
//! work side by side.

use std::sync::{Arc, Mutex, PoisonError};

use jmespath::functions::{ArgumentType, CustomFunction, Signature as JmesSignature};
use jmespath::{Context, ErrorReason, JmespathError, Rcvar, RuntimeError, ToJmespath};

use crate::error::{Error, Result};
use crate::function::{FunctionContext, FunctionRegistry};
use crate::value::Value;

/// Holds the error a registry function raised while JMESPath was calling it
type ErrorSlot = Arc<Mutex<Option<Error>>>;

/// Evaluates JMESPath queries against resolved values
#[derive(Debug, Clone)]
pub struct QueryEvaluator {
    registry: Arc<FunctionRegistry>,
    context: Arc<FunctionContext>,
}

impl Default for QueryEvaluator {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl QueryEvaluator {
    /// Create an evaluator that dispatches into `registry`
    pub fn new(registry: FunctionRegistry, context: FunctionContext) -> Self {
        Self {
            registry: Arc::new(registry),
            context: Arc::new(context),
        }
    }

    /// Create an evaluator with the built-in functions and a freshly captured environment
    pub fn with_builtins() -> Self {
        Self::new(FunctionRegistry::with_builtins(), FunctionContext::default())
    }

    /// The functions queries can call
    pub fn registry(&self) -> &FunctionRegistry {
        &self.registry
    }

    /// The context handed to every function call
    pub fn context(&self) -> &FunctionContext {
        &self.context
    }

    /// Evaluate `query` against `input`
    pub fn evaluate(&self, input: &Value, query: &str) -> Result<Value> {
        if query.trim().is_empty() {
            return Err(Error::query_parse(query, "query is empty"));
        }

        let slot: ErrorSlot = Arc::new(Mutex::new(None));
        let runtime = self.runtime(&slot);

        let expr = runtime
            .compile(query)
            .map_err(|e| Error::query_parse(query, describe(&e)))?;

        let data = serde_json::Value::from(input);
        let result = match expr.search(data) {
            Ok(result) => result,
            Err(e) => {
                let raised = slot.lock().unwrap_or_else(PoisonError::into_inner).take();
                return Err(raised.unwrap_or_else(|| map_error(query, &e)));
            }
        };

        let json = serde_json::to_value(&*result)
            .map_err(|e| Error::query_eval(format!("Query result is not representable: {e}")))?;
        Ok(Value::from(json))
    }

    fn runtime(&self, slot: &ErrorSlot) -> jmespath::Runtime {
        let mut runtime = jmespath::Runtime::new();
        runtime.register_builtin_functions();

        for name in self.registry.names() {
            runtime.register_function(name, Box::new(self.bridge(name, slot)));
        }
        runtime
    }

    /// Wrap a registry function as a variadic JMESPath function.
    ///
    /// Argument checking is left to the registry so the error names our
    /// signature, not JMESPath's.
    fn bridge(&self, name: &str, slot: &ErrorSlot) -> CustomFunction {
        let registry = Arc::clone(&self.registry);
        let context = Arc::clone(&self.context);
        let slot = Arc::clone(slot);
        let name = name.to_string();

        CustomFunction::new(
            JmesSignature::new(vec![], Some(ArgumentType::Any)),
            Box::new(move |args: &[Rcvar], ctx: &mut Context<'_>| {
                let values: Vec<Value> = args.iter().map(from_variable).collect();

                match registry.call(&name, &values, &context) {
                    Ok(value) => serde_json::Value::from(&value).to_jmespath(),
                    Err(err) => {
                        let reason = ErrorReason::Parse(err.to_string());
                        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(err);
                        Err(JmespathError::from_ctx(ctx, reason))
                    }
                }
            }),
        )
    }
}

fn from_variable(var: &Rcvar) -> Value {
    serde_json::to_value(&**var)
        .map(Value::from)
        .unwrap_or(Value::Null)
}

fn map_error(query: &str, err: &JmespathError) -> Error {
    match &err.reason {
        ErrorReason::Parse(msg) => Error::query_parse(query, msg.clone()),
        ErrorReason::Runtime(RuntimeError::UnknownFunction(name)) => {
            Error::unknown_function(name.clone())
        }
        ErrorReason::Runtime(
            RuntimeError::TooManyArguments { .. }
            | RuntimeError::NotEnoughArguments { .. }
            | RuntimeError::InvalidType { .. },
        ) => Error::arity_or_type(function_at(err).unwrap_or_default(), describe(err)),
        ErrorReason::Runtime(_) => Error::query_eval(describe(err)),
    }
}

/// Best-effort name of the JMESPath builtin called at the error offset
fn function_at(err: &JmespathError) -> Option<String> {
    let head = err.expression.get(..err.offset)?;
    let start = head
        .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '('))
        .map_or(0, |i| i + 1);
    let name = head[start..].trim_end_matches('(');
    (!name.is_empty()).then(|| name.to_string())
}

fn describe(err: &JmespathError) -> String {
    match &err.reason {
        ErrorReason::Parse(msg) => format!("{msg} (at offset {})", err.offset),
        ErrorReason::Runtime(e) => e.to_string(),
    }
}
