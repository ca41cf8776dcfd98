//! The read-only document model
//!
//! A `Document` is loaded once from TOML and never mutated afterwards.
//! Paths handed to it are absolute; namespace expansion happens in
//! [`expand_path`] before lookup.

use std::path::Path;

use crate::error::{Error, Result, SourceLocation};
use crate::value::Value;

/// An immutable tree of values loaded from a TOML document
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    root: Value,
}

impl Document {
    /// Wrap an already-built value tree
    pub fn new(root: Value) -> Self {
        Self { root }
    }

    /// Load a document from raw bytes (UTF-8 TOML)
    pub fn load(bytes: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| Error::parse(format!("Document is not valid UTF-8: {e}")))?;
        Self::from_toml(text)
    }

    /// Load a document from TOML text
    pub fn from_toml(text: &str) -> Result<Self> {
        parse_toml(text, None)
    }

    /// Load a document from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).map_err(|e| Error::io(path.display().to_string(), &e))?;
        parse_toml(&content, Some(path))
    }

    /// The root of the tree
    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Fetch the raw (unresolved) node at an absolute path
    pub fn get(&self, path: &str) -> Result<&Value> {
        self.root.get_path(path)
    }
}

fn parse_toml(text: &str, file: Option<&Path>) -> Result<Document> {
    let table: toml::Table = toml::from_str(text).map_err(|e| {
        let mut err = Error::parse(e.message().to_string());
        if let Some(span) = e.span() {
            err = err.with_source_location(SourceLocation {
                file: file
                    .map(|p| p.display().to_string())
                    .unwrap_or_else(|| "<string>".to_string()),
                line: Some(line_of(text, span.start)),
                column: None,
            });
        }
        err
    })?;
    Ok(Document::new(Value::from(table)))
}

/// 1-based line number of a byte offset
fn line_of(text: &str, offset: usize) -> usize {
    text.as_bytes()
        .iter()
        .take(offset)
        .filter(|b| **b == b'\n')
        .count()
        + 1
}

/// Expand a user-facing path into an absolute document path.
///
/// - `""` is the document root
/// - `"."` is the namespace root
/// - `".a.b"` is `a.b` under the namespace
/// - anything else is already absolute
pub fn expand_path(namespace: Option<&str>, path: &str) -> String {
    let ns = namespace.unwrap_or_default();
    match path.strip_prefix('.') {
        Some(rest) if rest.is_empty() => ns.to_string(),
        Some(rest) if ns.is_empty() => rest.to_string(),
        Some(rest) => format!("{ns}.{rest}"),
        None => path.to_string(),
    }
}
