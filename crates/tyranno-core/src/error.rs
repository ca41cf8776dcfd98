//! Error types for tyranno
//!
//! Every failure carries a kind, the path it happened at (when known),
//! an optional source location and an actionable help message.

use std::fmt;

/// Result type alias for tyranno operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for tyranno operations
#[derive(Debug, Clone)]
pub struct Error {
    /// The kind of error that occurred
    pub kind: ErrorKind,
    /// Document path where the error occurred (e.g., "project.version")
    pub path: Option<String>,
    /// Source location (file, line) if available
    pub source_location: Option<SourceLocation>,
    /// Actionable help message
    pub help: Option<String>,
    /// Underlying cause (as string for Clone compatibility)
    pub cause: Option<String>,
}

/// Location in a source file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: Option<usize>,
    pub column: Option<usize>,
}

/// Categories of errors that can occur
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
    /// Malformed input document
    #[error("Parse error")]
    Parse,
    /// Malformed query expression
    #[error("Query parse error: {query}")]
    QueryParse { query: String },
    /// A referenced key is absent, or a scalar was indexed further
    #[error("Path not found")]
    PathNotFound,
    /// A placeholder chain came back to a path that is still being resolved
    #[error("Circular reference detected")]
    CircularReference { chain: Vec<String> },
    /// A query called a function nobody registered
    #[error("Unknown function: {name}")]
    UnknownFunction { name: String },
    /// Wrong argument count or argument type for a registered function
    #[error("Invalid arguments for function '{name}'")]
    ArityOrType { name: String },
    /// A network-backed function failed or returned malformed data
    #[error(
        "Upstream request failed: {url}{}",
        .status.map(|s| format!(" (status {s})")).unwrap_or_default()
    )]
    Upstream { url: String, status: Option<u16> },
    /// Query evaluation failed for any other reason
    #[error("Query evaluation failed")]
    QueryEval,
    /// A function name is already taken in the registry
    #[error("Function '{name}' is already registered")]
    AlreadyRegistered { name: String },
    /// I/O error (file not readable, etc.)
    #[error("I/O error")]
    Io,
}

impl Error {
    fn from_kind(kind: ErrorKind) -> Self {
        Self {
            kind,
            path: None,
            source_location: None,
            help: None,
            cause: None,
        }
    }

    /// Create a document parse error
    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::Parse)
        }
    }

    /// Create a query parse error
    pub fn query_parse(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            help: Some("Check the query against the JMESPath grammar".into()),
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::QueryParse {
                query: query.into(),
            })
        }
    }

    /// Create a path not found error
    pub fn path_not_found(path: impl Into<String>) -> Self {
        let path_str = path.into();
        Self {
            help: Some(format!("Check that '{path_str}' exists in the document")),
            path: Some(path_str),
            ..Self::from_kind(ErrorKind::PathNotFound)
        }
    }

    /// Create a circular reference error
    ///
    /// `chain` is the in-progress stack followed by the path that closed the loop.
    pub fn circular_reference(path: impl Into<String>, chain: Vec<String>) -> Self {
        let chain_str = chain.join(" → ");
        Self {
            path: Some(path.into()),
            help: Some("Break the circular dependency by removing one of the references".into()),
            cause: Some(format!("Chain: {chain_str}")),
            ..Self::from_kind(ErrorKind::CircularReference { chain })
        }
    }

    /// Create an unknown function error
    pub fn unknown_function(name: impl Into<String>) -> Self {
        let n = name.into();
        let help = format!("Register the '{n}' function or check for typos");
        Self {
            help: Some(help),
            ..Self::from_kind(ErrorKind::UnknownFunction { name: n })
        }
    }

    /// Create an arity or argument type error
    pub fn arity_or_type(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::ArityOrType { name: name.into() })
        }
    }

    /// Create a function already registered error
    pub fn already_registered(name: impl Into<String>) -> Self {
        let n = name.into();
        let help = format!("Use register_with_force(..., true) to override the '{n}' function");
        Self {
            help: Some(help),
            ..Self::from_kind(ErrorKind::AlreadyRegistered { name: n })
        }
    }

    /// Create an upstream (network) error
    pub fn upstream(url: impl Into<String>, status: Option<u16>, message: impl Into<String>) -> Self {
        let url_str = url.into();
        let help = format!("Check that '{url_str}' is reachable and returns the expected payload");
        Self {
            help: Some(help),
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::Upstream {
                url: url_str,
                status,
            })
        }
    }

    /// Create a query evaluation error
    pub fn query_eval(message: impl Into<String>) -> Self {
        Self {
            cause: Some(message.into()),
            ..Self::from_kind(ErrorKind::QueryEval)
        }
    }

    /// Create an error for a function that rejected its (well-typed) input
    pub fn function_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        let n = name.into();
        Self {
            help: Some(format!("Check the input passed to '{n}'")),
            cause: Some(format!("{n}: {}", message.into())),
            ..Self::from_kind(ErrorKind::QueryEval)
        }
    }

    /// Create an I/O error
    pub fn io(file: impl Into<String>, err: &std::io::Error) -> Self {
        let file_str = file.into();
        Self {
            cause: Some(format!("Failed to read '{file_str}': {err}")),
            ..Self::from_kind(ErrorKind::Io)
        }
    }

    /// Add path context to the error
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Add source location to the error
    pub fn with_source_location(mut self, loc: SourceLocation) -> Self {
        self.source_location = Some(loc);
        self
    }

    /// Add help message to the error
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.help = Some(help.into());
        self
    }

    /// The cycle chain, if this is a circular reference error
    pub fn cycle_chain(&self) -> Option<&[String]> {
        match &self.kind {
            ErrorKind::CircularReference { chain } => Some(chain),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;

        if let Some(path) = &self.path {
            write!(f, "\n  Path: {path}")?;
        }

        if let Some(loc) = &self.source_location {
            write!(f, "\n  File: {}", loc.file)?;
            if let Some(line) = loc.line {
                write!(f, ":{line}")?;
            }
        }

        if let Some(cause) = &self.cause {
            write!(f, "\n  {cause}")?;
        }

        if let Some(help) = &self.help {
            write!(f, "\n  Help: {help}")?;
        }

        Ok(())
    }
}

impl std::error::Error for Error {}
