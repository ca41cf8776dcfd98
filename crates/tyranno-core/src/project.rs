//! Main Project type for tyranno
//!
//! A `Project` is the primary interface for loading project metadata and
//! reading resolved values out of it. It owns the document, the functions
//! queries may call, and a cache of fully resolved top-level results.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use indexmap::IndexMap;

use crate::document::{expand_path, Document};
use crate::environment::Environment;
use crate::error::{Error, Result};
use crate::function::{FunctionContext, FunctionRegistry};
use crate::http::HttpOptions;
use crate::query::QueryEvaluator;
use crate::resolver::Resolver;
use crate::value::Value;

/// Where user-declared values live when discovering a project
pub const DEFAULT_NAMESPACE: &str = "tool.tyranno.data";

/// Files checked by [`Project::discover`], in order
pub const CONFIG_FILE_NAMES: &[&str] = &[".tyranno.toml", "pyproject.toml"];

/// Options for loading a project
#[derive(Debug, Clone, Default)]
pub struct ProjectOptions {
    /// Prefix that a leading `.` in a path expands to
    pub namespace: Option<String>,
    /// Network settings for `spdx_license` and `pypi_data`
    pub http: HttpOptions,
}

impl ProjectOptions {
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    pub fn with_http(mut self, http: HttpOptions) -> Self {
        self.http = http;
        self
    }
}

/// A loaded project document plus everything needed to resolve it
pub struct Project {
    document: Arc<Document>,
    evaluator: Arc<QueryEvaluator>,
    /// Fully resolved values keyed by absolute path
    cache: Arc<RwLock<HashMap<String, Value>>>,
    /// File the document was read from, if any
    source: Option<PathBuf>,
    options: ProjectOptions,
}

impl Project {
    /// Create a project with the built-in functions and default options
    pub fn new(document: Document) -> Self {
        Self::with_options(document, ProjectOptions::default())
    }

    /// Create a project with custom options
    pub fn with_options(document: Document, options: ProjectOptions) -> Self {
        Self::build(document, FunctionRegistry::with_builtins(), options)
    }

    /// Create a project with a custom function registry
    pub fn with_functions(document: Document, functions: FunctionRegistry) -> Self {
        Self::build(document, functions, ProjectOptions::default())
    }

    fn build(document: Document, functions: FunctionRegistry, options: ProjectOptions) -> Self {
        let context = FunctionContext::new(Arc::new(Environment::capture()), options.http.clone());
        Self {
            document: Arc::new(document),
            evaluator: Arc::new(QueryEvaluator::new(functions, context)),
            cache: Arc::new(RwLock::new(HashMap::new())),
            source: None,
            options,
        }
    }

    /// Load a project from a TOML string
    pub fn from_toml(toml: &str) -> Result<Self> {
        Ok(Self::new(Document::from_toml(toml)?))
    }

    /// Load a project from a TOML string with options
    pub fn from_toml_with_options(toml: &str, options: ProjectOptions) -> Result<Self> {
        Ok(Self::with_options(Document::from_toml(toml)?, options))
    }

    /// Load a project from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_toml_file_with_options(path, ProjectOptions::default())
    }

    fn from_toml_file_with_options(path: impl AsRef<Path>, options: ProjectOptions) -> Result<Self> {
        let path = path.as_ref();
        let document = Document::from_toml_file(path)?;
        let mut project = Self::with_options(document, options);
        project.source = Some(path.to_path_buf());
        Ok(project)
    }

    /// Find the project document in `cwd`.
    ///
    /// The first of [`CONFIG_FILE_NAMES`] that exists is loaded. When none
    /// exists the document is just `project.name`, taken from the directory
    /// name. The namespace defaults to [`DEFAULT_NAMESPACE`].
    pub fn discover(cwd: impl AsRef<Path>, mut options: ProjectOptions) -> Result<Self> {
        let cwd = cwd.as_ref();
        if options.namespace.is_none() {
            options.namespace = Some(DEFAULT_NAMESPACE.to_string());
        }

        for name in CONFIG_FILE_NAMES {
            let candidate = cwd.join(name);
            if candidate.is_file() {
                log::debug!("Loading project from {}", candidate.display());
                return Self::from_toml_file_with_options(&candidate, options);
            }
        }

        let dir_name = std::fs::canonicalize(cwd)
            .unwrap_or_else(|_| cwd.to_path_buf())
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        log::debug!(
            "No project file in {}; using directory name '{dir_name}'",
            cwd.display()
        );

        let mut project = IndexMap::new();
        project.insert("name".to_string(), Value::String(dir_name));
        let mut root = IndexMap::new();
        root.insert("project".to_string(), Value::Mapping(project));

        Ok(Self::with_options(Document::new(Value::Mapping(root)), options))
    }

    /// A fresh call-scoped resolver over this project
    pub fn resolver(&self) -> Resolver<'_> {
        let resolver = Resolver::new(&self.document, &self.evaluator);
        match &self.options.namespace {
            Some(ns) => resolver.with_namespace(ns.as_str()),
            None => resolver,
        }
    }

    /// Get the raw (unresolved) value at a path
    pub fn get_raw(&self, path: &str) -> Result<&Value> {
        let path = expand_path(self.namespace(), path);
        self.document.get(&path)
    }

    /// Get a fully resolved value at a path
    ///
    /// Successful results are cached for subsequent accesses.
    pub fn get(&self, path: &str) -> Result<Value> {
        let key = expand_path(self.namespace(), path);
        {
            let cache = self.cache.read().unwrap_or_else(PoisonError::into_inner);
            if let Some(cached) = cache.get(&key) {
                log::trace!("Cache hit for '{key}'");
                return Ok(cached.clone());
            }
        }

        log::debug!("Resolving '{key}'");
        let resolved = self.resolver().resolve(&key)?;

        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, resolved.clone());
        Ok(resolved)
    }

    /// Get a resolved value rendered as text
    ///
    /// Strings come back verbatim, everything else in its inline form
    /// (compact JSON, or RFC 3339 for datetimes).
    pub fn get_string(&self, path: &str) -> Result<String> {
        Ok(self.get(path)?.render())
    }

    /// Resolve the whole document, failing on the first error
    pub fn resolve_all(&self) -> Result<()> {
        self.get("").map(|_| ())
    }

    /// Export the document as a Value
    ///
    /// With `resolve` false the raw document is returned, placeholders and all.
    pub fn to_value(&self, resolve: bool) -> Result<Value> {
        if resolve {
            self.get("")
        } else {
            Ok(self.document.root().clone())
        }
    }

    /// Export the document as pretty-printed JSON
    pub fn to_json(&self, resolve: bool) -> Result<String> {
        let value = self.to_value(resolve)?;
        serde_json::to_string_pretty(&value).map_err(export_failed)
    }

    /// Clear the resolution cache
    pub fn clear_cache(&self) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn functions(&self) -> &FunctionRegistry {
        self.evaluator.registry()
    }

    pub fn options(&self) -> &ProjectOptions {
        &self.options
    }

    /// File the document was loaded from
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    fn namespace(&self) -> Option<&str> {
        self.options.namespace.as_deref()
    }
}

impl Clone for Project {
    fn clone(&self) -> Self {
        Self {
            document: Arc::clone(&self.document),
            evaluator: Arc::clone(&self.evaluator),
            cache: Arc::new(RwLock::new(HashMap::new())),
            source: self.source.clone(),
            options: self.options.clone(),
        }
    }
}

impl std::fmt::Debug for Project {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Project")
            .field("source", &self.source)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

fn export_failed(err: serde_json::Error) -> Error {
    Error::query_eval(format!("Failed to export document as JSON: {err}"))
}
