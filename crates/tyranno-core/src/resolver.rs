//! Recursive placeholder resolution
//!
//! A [`Resolver`] owns the state of one top-level resolution: the stack of
//! paths currently in progress (for cycle detection) and a memo of paths it
//! has already finished. Create one per call and throw it away afterwards;
//! the [`Document`] and [`QueryEvaluator`] it borrows are shared freely.

use std::collections::HashMap;

use indexmap::IndexMap;

use crate::document::{expand_path, Document};
use crate::error::{Error, Result};
use crate::placeholder;
use crate::query::QueryEvaluator;
use crate::value::{join_keys, segments, Value};

/// Exact key sequence of a node; keys may contain dots
type Keys = Vec<String>;

/// Call-scoped resolution state
#[derive(Debug)]
pub struct Resolver<'a> {
    document: &'a Document,
    evaluator: &'a QueryEvaluator,
    namespace: Option<String>,
    /// Nodes whose resolution has started but not finished, outermost first
    stack: Vec<Keys>,
    memo: HashMap<Keys, Value>,
}

impl<'a> Resolver<'a> {
    pub fn new(document: &'a Document, evaluator: &'a QueryEvaluator) -> Self {
        Self {
            document,
            evaluator,
            namespace: None,
            stack: Vec::new(),
            memo: HashMap::new(),
        }
    }

    /// Set the prefix that leading-dot paths expand under
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        let ns = namespace.into();
        self.namespace = (!ns.is_empty()).then_some(ns);
        self
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Fully resolve the node at `path`.
    ///
    /// `path` may be relative to the namespace (`.version`) or absolute.
    pub fn resolve(&mut self, path: &str) -> Result<Value> {
        let keys = self.keys_of(path);
        self.resolve_keys(&keys)
    }

    /// Number of finished nodes remembered by this resolver
    pub fn memoized(&self) -> usize {
        self.memo.len()
    }

    fn keys_of(&self, path: &str) -> Keys {
        segments(&expand_path(self.namespace.as_deref(), path))
            .map(str::to_string)
            .collect()
    }

    fn resolve_keys(&mut self, keys: &[String]) -> Result<Value> {
        if self.stack.iter().any(|k| k.as_slice() == keys) {
            let chain: Vec<String> = self
                .stack
                .iter()
                .map(|k| join_keys(k.as_slice()))
                .chain(std::iter::once(join_keys(keys)))
                .collect();
            log::debug!("Cycle detected: {}", chain.join(" -> "));
            return Err(Error::circular_reference(join_keys(keys), chain));
        }

        if let Some(hit) = self.memo.get(keys) {
            log::trace!("Memo hit for '{}'", join_keys(keys));
            return Ok(hit.clone());
        }

        self.stack.push(keys.to_vec());
        let result = self.resolve_node(keys);
        self.stack.pop();

        let value = result?;
        self.memo.insert(keys.to_vec(), value.clone());
        Ok(value)
    }

    fn resolve_node(&mut self, keys: &[String]) -> Result<Value> {
        let document = self.document;
        match document.root().get_in(keys)? {
            Value::Mapping(map) => {
                let mut resolved = IndexMap::with_capacity(map.len());
                for key in map.keys() {
                    let value = self.resolve_keys(&child(keys, key.clone()))?;
                    resolved.insert(key.clone(), value);
                }
                Ok(Value::Mapping(resolved))
            }
            Value::Sequence(items) => (0..items.len())
                .map(|i| self.resolve_keys(&child(keys, i.to_string())))
                .collect::<Result<Vec<_>>>()
                .map(Value::Sequence),
            Value::String(text) => self.resolve_text(keys, text),
            scalar => Ok(scalar.clone()),
        }
    }

    fn resolve_text(&mut self, keys: &[String], text: &str) -> Result<Value> {
        let matches = placeholder::scan(text);
        if matches.is_empty() {
            return Ok(Value::String(text.to_string()));
        }

        let path = join_keys(keys);
        let mut replacements = Vec::with_capacity(matches.len());
        for m in &matches {
            let target = self.keys_of(&m.placeholder.path);
            let mut value = self.resolve_keys(&target)?;

            if let Some(query) = &m.placeholder.query {
                value = self.evaluator.evaluate(&value, query).map_err(|e| {
                    if e.path.is_none() {
                        e.with_path(path.as_str())
                    } else {
                        e
                    }
                })?;
            }

            log::trace!("'{path}': {} -> {}", &text[m.span.clone()], value.render());
            replacements.push(value.render());
        }

        Ok(Value::String(placeholder::substitute(
            text,
            &matches,
            &replacements,
        )))
    }
}

fn child(parent: &[String], key: String) -> Keys {
    let mut keys = Vec::with_capacity(parent.len() + 1);
    keys.extend_from_slice(parent);
    keys.push(key);
    keys
}
