//! Document value types
//!
//! A `Value` is one node of a metadata document: a scalar leaf
//! (string, integer, float, boolean, datetime, null), a sequence,
//! or a mapping from string keys to values.

use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::fmt;

use crate::error::{Error, Result};

pub use toml::value::Datetime;

/// A document node that may contain unresolved placeholders
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    /// Null value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value
    Integer(i64),
    /// Floating point value
    Float(f64),
    /// String value (may contain placeholders like ${project.version})
    String(String),
    /// Date, time, or date-time (offset or local)
    Datetime(Datetime),
    /// Sequence of values
    Sequence(Vec<Value>),
    /// Mapping of string keys to values
    Mapping(IndexMap<String, Value>),
}

impl Value {
    /// Check if this value is null
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Check if this value is a string
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    /// Check if this value is a sequence or a mapping
    pub fn is_container(&self) -> bool {
        matches!(self, Value::Sequence(_) | Value::Mapping(_))
    }

    /// Get as boolean if this is a Bool
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Get as i64 if this is an Integer
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// Get as f64 if this is a Float or Integer
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Get as str if this is a String
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get as slice if this is a Sequence
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Value::Sequence(s) => Some(s),
            _ => None,
        }
    }

    /// Get as mapping if this is a Mapping
    pub fn as_mapping(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Value::Mapping(m) => Some(m),
            _ => None,
        }
    }

    /// Get a value by dotted path (e.g., "project.version" or "authors.0.name")
    ///
    /// An all-digit segment indexes into a sequence; on a mapping it is an
    /// ordinary key. The empty path is this value itself.
    pub fn get_path(&self, path: &str) -> Result<&Value> {
        let keys: Vec<&str> = segments(path).collect();
        self.get_in(&keys)
    }

    /// Get a value by an exact key sequence.
    ///
    /// Keys are used verbatim, so a key may contain dots or be empty.
    pub fn get_in<K: AsRef<str>>(&self, keys: &[K]) -> Result<&Value> {
        let mut current = self;

        for key in keys {
            let key = key.as_ref();
            current = match current {
                Value::Mapping(map) => map
                    .get(key)
                    .ok_or_else(|| Error::path_not_found(join_keys(keys)))?,
                Value::Sequence(seq) => key
                    .parse::<usize>()
                    .ok()
                    .and_then(|idx| seq.get(idx))
                    .ok_or_else(|| Error::path_not_found(join_keys(keys)))?,
                _ => {
                    return Err(Error::path_not_found(join_keys(keys)).with_help(format!(
                        "'{key}' indexes into a {}, which has no children",
                        current.type_name()
                    )))
                }
            };
        }

        Ok(current)
    }

    /// Returns the type name of this value
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Datetime(_) => "datetime",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
        }
    }

    /// Render this value as text for substitution into a string.
    ///
    /// Strings are inlined verbatim and datetimes use their RFC 3339 text.
    /// Everything else is compact JSON, matching JMESPath's `to_string`.
    pub fn render(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Datetime(dt) => dt.to_string(),
            other => serde_json::to_string(other).unwrap_or_else(|_| "null".to_string()),
        }
    }
}

/// Split a dotted path into its non-empty key segments
pub(crate) fn segments(path: &str) -> impl Iterator<Item = &str> {
    path.split('.').filter(|s| !s.is_empty())
}

/// Dotted rendering of a key sequence, for diagnostics
pub(crate) fn join_keys<K: AsRef<str>>(keys: &[K]) -> String {
    keys.iter().map(AsRef::as_ref).collect::<Vec<_>>().join(".")
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Integer(i) => serializer.serialize_i64(*i),
            Value::Float(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Datetime(dt) => serializer.collect_str(dt),
            Value::Sequence(seq) => serializer.collect_seq(seq),
            Value::Mapping(map) => serializer.collect_map(map),
        }
    }
}

impl From<toml::Value> for Value {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => Value::String(s),
            toml::Value::Integer(i) => Value::Integer(i),
            toml::Value::Float(f) => Value::Float(f),
            toml::Value::Boolean(b) => Value::Bool(b),
            toml::Value::Datetime(dt) => Value::Datetime(dt),
            toml::Value::Array(items) => Value::Sequence(items.into_iter().map(Into::into).collect()),
            toml::Value::Table(table) => Value::from(table),
        }
    }
}

impl From<toml::Table> for Value {
    fn from(table: toml::Table) -> Self {
        Value::Mapping(table.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Integer(i),
                None => n.as_f64().map_or(Value::Null, Value::Float),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Sequence(items.into_iter().map(Into::into).collect())
            }
            serde_json::Value::Object(map) => {
                Value::Mapping(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

impl From<&Value> for serde_json::Value {
    fn from(value: &Value) -> Self {
        match value {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::Integer(i) => serde_json::Value::from(*i),
            Value::Float(f) => serde_json::Value::from(*f),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Datetime(dt) => serde_json::Value::String(dt.to_string()),
            Value::Sequence(seq) => serde_json::Value::Array(seq.iter().map(Into::into).collect()),
            Value::Mapping(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.into())).collect(),
            ),
        }
    }
}

// Convenient From implementations
impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Integer(i)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(m: IndexMap<String, Value>) -> Self {
        Value::Mapping(m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> Value {
        let mut author = IndexMap::new();
        author.insert("name".into(), Value::from("Ada"));
        let mut project = IndexMap::new();
        project.insert("version".into(), Value::from("1.2.3"));
        project.insert("authors".into(), Value::Sequence(vec![Value::Mapping(author)]));
        let mut root = IndexMap::new();
        root.insert("project".into(), Value::Mapping(project));
        Value::Mapping(root)
    }

    #[test]
    fn test_get_path_dotted() {
        let value = sample();
        assert_eq!(
            value.get_path("project.version").unwrap().as_str(),
            Some("1.2.3")
        );
    }

    #[test]
    fn test_get_path_sequence_index() {
        let value = sample();
        assert_eq!(
            value.get_path("project.authors.0.name").unwrap().as_str(),
            Some("Ada")
        );
        assert!(value.get_path("project.authors.1").is_err());
        assert!(value.get_path("project.authors.first").is_err());
    }

    #[test]
    fn test_get_path_empty_is_root() {
        let value = sample();
        assert_eq!(value.get_path("").unwrap(), &value);
    }

    #[test]
    fn test_get_path_through_scalar_fails() {
        let value = sample();
        let err = value.get_path("project.version.major").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::PathNotFound);
        assert_eq!(err.path.as_deref(), Some("project.version.major"));
    }

    #[test]
    fn test_render_scalars() {
        assert_eq!(Value::from("plain").render(), "plain");
        assert_eq!(Value::Integer(42).render(), "42");
        assert_eq!(Value::Float(2.5).render(), "2.5");
        assert_eq!(Value::Bool(true).render(), "true");
        assert_eq!(Value::Null.render(), "null");
    }

    #[test]
    fn test_render_containers_as_compact_json() {
        let seq = Value::from(vec!["a", "b"]);
        assert_eq!(seq.render(), r#"["a","b"]"#);

        let mut map = IndexMap::new();
        map.insert("z".into(), Value::Integer(1));
        map.insert("a".into(), Value::from("x"));
        assert_eq!(Value::Mapping(map).render(), r#"{"z":1,"a":"x"}"#);
    }

    #[test]
    fn test_render_datetime() {
        let dt: Datetime = "1979-05-27T07:32:00Z".parse().unwrap();
        assert_eq!(Value::Datetime(dt).render(), "1979-05-27T07:32:00Z");
    }

    #[test]
    fn test_from_json_numbers() {
        let value = Value::from(serde_json::json!({"i": 3, "f": 1.5}));
        assert_eq!(value.get_path("i").unwrap().as_i64(), Some(3));
        assert_eq!(value.get_path("f").unwrap().as_f64(), Some(1.5));
    }

    #[test]
    fn test_get_in_uses_keys_verbatim() {
        let mut ignores = IndexMap::new();
        ignores.insert("__init__.py".into(), Value::from("F401"));
        ignores.insert("".into(), Value::Integer(1));
        let value = Value::Mapping(ignores);

        assert_eq!(value.get_in(&["__init__.py"]).unwrap(), &Value::from("F401"));
        assert_eq!(value.get_in(&[""]).unwrap(), &Value::Integer(1));
        assert!(value.get_path("__init__.py").is_err());
    }

    #[test]
    fn test_serialize_keeps_document_order() {
        let mut map = IndexMap::new();
        map.insert("zeta".into(), Value::Integer(1));
        map.insert("alpha".into(), Value::from(vec!["a", "b"]));
        let json = serde_json::to_string(&Value::Mapping(map)).unwrap();
        assert_eq!(json, r#"{"zeta":1,"alpha":["a","b"]}"#);
    }

    #[test]
    fn test_join_keys() {
        assert_eq!(join_keys::<&str>(&[]), "");
        assert_eq!(join_keys(&["project", "name"]), "project.name");
    }
}
