//! Function registry
//!
//! Functions are named, arity-checked callables that queries can invoke
//! (`semver_max(@)`, `spdx_license('MIT')`, ...). A registry is an explicit
//! value built at startup and handed to the query evaluator; there is no
//! process-wide registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::http::HttpOptions;
use crate::value::Value;

/// Coarse argument type accepted by one parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgType {
    Any,
    String,
    /// Integer or float
    Number,
    List,
    Mapping,
    /// Any one of the listed types
    OneOf(&'static [ArgType]),
}

impl ArgType {
    /// Check whether a value is acceptable for this parameter
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            ArgType::Any => true,
            ArgType::String => matches!(value, Value::String(_)),
            ArgType::Number => matches!(value, Value::Integer(_) | Value::Float(_)),
            ArgType::List => matches!(value, Value::Sequence(_)),
            ArgType::Mapping => matches!(value, Value::Mapping(_)),
            ArgType::OneOf(types) => types.iter().any(|t| t.accepts(value)),
        }
    }
}

impl fmt::Display for ArgType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgType::Any => f.write_str("any"),
            ArgType::String => f.write_str("string"),
            ArgType::Number => f.write_str("number"),
            ArgType::List => f.write_str("list"),
            ArgType::Mapping => f.write_str("mapping"),
            ArgType::OneOf(types) => {
                let names: Vec<String> = types.iter().map(ToString::to_string).collect();
                f.write_str(&names.join(" | "))
            }
        }
    }
}

/// Declared parameters of a function
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    params: Vec<ArgType>,
}

impl Signature {
    pub fn new(params: Vec<ArgType>) -> Self {
        Self { params }
    }

    /// A function taking no arguments
    pub fn nullary() -> Self {
        Self::new(Vec::new())
    }

    pub fn params(&self) -> &[ArgType] {
        &self.params
    }

    /// Validate argument count, then each argument's type
    pub fn validate(&self, name: &str, args: &[Value]) -> Result<()> {
        if args.len() != self.params.len() {
            return Err(Error::arity_or_type(
                name,
                format!(
                    "expected {} argument(s), got {}",
                    self.params.len(),
                    args.len()
                ),
            ));
        }

        for (position, (param, arg)) in self.params.iter().zip(args).enumerate() {
            if !param.accepts(arg) {
                return Err(Error::arity_or_type(
                    name,
                    format!(
                        "argument {} must be {}, got {}",
                        position + 1,
                        param,
                        arg.type_name()
                    ),
                ));
            }
        }

        Ok(())
    }
}

/// State a function call can see: the captured environment, network
/// settings, and a run-scoped memo for upstream lookups.
#[derive(Debug, Clone)]
pub struct FunctionContext {
    pub environment: Arc<Environment>,
    pub http: HttpOptions,
    lookups: Arc<Mutex<HashMap<String, Value>>>,
}

impl FunctionContext {
    pub fn new(environment: Arc<Environment>, http: HttpOptions) -> Self {
        Self {
            environment,
            http,
            lookups: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Return the memoized value for `key`, or compute and remember it.
    ///
    /// Failures are not remembered.
    pub fn cached_lookup(&self, key: &str, fetch: impl FnOnce() -> Result<Value>) -> Result<Value> {
        {
            let lookups = self.lookups.lock().unwrap_or_else(PoisonError::into_inner);
            if let Some(hit) = lookups.get(key) {
                log::trace!("Lookup cache hit for {key}");
                return Ok(hit.clone());
            }
        }

        let value = fetch()?;
        self.lookups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.clone());
        Ok(value)
    }
}

impl Default for FunctionContext {
    fn default() -> Self {
        Self::new(Arc::new(Environment::capture()), HttpOptions::default())
    }
}

/// Trait for function implementations
pub trait Function: Send + Sync {
    /// Get the name queries call this function by
    fn name(&self) -> &str;

    /// Declared parameters, checked before `call`
    fn signature(&self) -> &Signature;

    /// Invoke the function with already type-checked arguments
    fn call(&self, args: &[Value], ctx: &FunctionContext) -> Result<Value>;
}

/// A simple closure-based function
pub struct FnFunction<F>
where
    F: Fn(&[Value], &FunctionContext) -> Result<Value> + Send + Sync,
{
    name: String,
    signature: Signature,
    func: F,
}

impl<F> FnFunction<F>
where
    F: Fn(&[Value], &FunctionContext) -> Result<Value> + Send + Sync,
{
    /// Create a new closure-based function
    pub fn new(name: impl Into<String>, signature: Signature, func: F) -> Self {
        Self {
            name: name.into(),
            signature,
            func,
        }
    }
}

impl<F> Function for FnFunction<F>
where
    F: Fn(&[Value], &FunctionContext) -> Result<Value> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn call(&self, args: &[Value], ctx: &FunctionContext) -> Result<Value> {
        (self.func)(args, ctx)
    }
}

/// Registry of available functions
#[derive(Clone, Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Arc<dyn Function>>,
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FunctionRegistry")
            .field("functions", &self.names())
            .finish()
    }
}

impl FunctionRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the standard built-in functions
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        crate::builtins::register_all(&mut registry);
        registry
    }

    /// Register a function, replacing any function with the same name
    pub fn register(&mut self, function: Arc<dyn Function>) {
        self.functions.insert(function.name().to_string(), function);
    }

    /// Register a function with optional force overwrite.
    ///
    /// Without `force`, an existing function with the same name is an error.
    pub fn register_with_force(&mut self, function: Arc<dyn Function>, force: bool) -> Result<()> {
        let name = function.name().to_string();
        if !force && self.functions.contains_key(&name) {
            return Err(Error::already_registered(&name));
        }
        self.functions.insert(name, function);
        Ok(())
    }

    /// Register a closure as a function
    pub fn register_fn<F>(&mut self, name: impl Into<String>, signature: Signature, func: F)
    where
        F: Fn(&[Value], &FunctionContext) -> Result<Value> + Send + Sync + 'static,
    {
        self.register(Arc::new(FnFunction::new(name, signature, func)));
    }

    /// Get a function by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Function>> {
        self.functions.get(name)
    }

    /// Check if a function is registered
    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.functions.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Call a function by name after checking its signature
    pub fn call(&self, name: &str, args: &[Value], ctx: &FunctionContext) -> Result<Value> {
        let function = self
            .functions
            .get(name)
            .ok_or_else(|| Error::unknown_function(name))?;

        function.signature().validate(name, args)?;
        log::trace!("Calling function {name} with {} argument(s)", args.len());
        function.call(args, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use pretty_assertions::assert_eq;

    fn echo() -> Arc<dyn Function> {
        Arc::new(FnFunction::new(
            "echo",
            Signature::new(vec![ArgType::Any]),
            |args, _ctx| Ok(args[0].clone()),
        ))
    }

    #[test]
    fn test_registry_with_builtins() {
        let registry = FunctionRegistry::with_builtins();

        assert!(registry.contains("semver_max"));
        assert!(registry.contains("format_datetime"));
        assert!(!registry.contains("nonexistent"));
    }

    #[test]
    fn test_custom_function() {
        let mut registry = FunctionRegistry::new();
        registry.register_fn(
            "shout",
            Signature::new(vec![ArgType::String]),
            |args, _ctx| {
                let text = args[0].as_str().unwrap_or_default();
                Ok(Value::String(text.to_uppercase()))
            },
        );

        let ctx = FunctionContext::default();
        let result = registry
            .call("shout", &[Value::from("hi")], &ctx)
            .unwrap();
        assert_eq!(result, Value::from("HI"));
    }

    #[test]
    fn test_unknown_function() {
        let registry = FunctionRegistry::new();
        let err = registry
            .call("totally_bogus", &[], &FunctionContext::default())
            .unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::UnknownFunction {
                name: "totally_bogus".into()
            }
        );
    }

    #[test]
    fn test_arity_checked() {
        let mut registry = FunctionRegistry::new();
        registry.register(echo());

        let err = registry
            .call("echo", &[], &FunctionContext::default())
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::ArityOrType { name: "echo".into() });
        assert!(err.to_string().contains("expected 1 argument(s), got 0"));
    }

    #[test]
    fn test_type_checked() {
        let signature = Signature::new(vec![ArgType::OneOf(&[ArgType::List, ArgType::String])]);
        let err = signature.validate("semver_max", &[Value::Integer(3)]).unwrap_err();

        assert_eq!(
            err.kind,
            ErrorKind::ArityOrType {
                name: "semver_max".into()
            }
        );
        assert!(err
            .to_string()
            .contains("argument 1 must be list | string, got integer"));
    }

    #[test]
    fn test_number_accepts_integer_and_float() {
        assert!(ArgType::Number.accepts(&Value::Integer(1)));
        assert!(ArgType::Number.accepts(&Value::Float(1.5)));
        assert!(!ArgType::Number.accepts(&Value::from("1")));
    }

    #[test]
    fn test_register_duplicate_errors_without_force() {
        let mut registry = FunctionRegistry::new();
        registry.register_with_force(echo(), false).unwrap();

        let err = registry.register_with_force(echo(), false).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::AlreadyRegistered {
                name: "echo".into()
            }
        );
        registry.register_with_force(echo(), true).unwrap();
    }

    #[test]
    fn test_cached_lookup_memoizes_success_only() {
        let ctx = FunctionContext::default();
        let calls = std::sync::atomic::AtomicUsize::new(0);

        let failed = ctx.cached_lookup("k", || {
            calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
            Err(Error::query_eval("boom"))
        });
        assert!(failed.is_err());

        for _ in 0..2 {
            let value = ctx
                .cached_lookup("k", || {
                    calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    Ok(Value::Integer(7))
                })
                .unwrap();
            assert_eq!(value, Value::Integer(7));
        }
        assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 2);
    }

    #[test]
    fn test_names_sorted() {
        let mut registry = FunctionRegistry::new();
        registry.register_fn("b", Signature::nullary(), |_, _| Ok(Value::Null));
        registry.register_fn("a", Signature::nullary(), |_, _| Ok(Value::Null));
        assert_eq!(registry.names(), vec!["a", "b"]);
    }
}
