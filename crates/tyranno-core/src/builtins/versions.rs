//! Semantic version functions

use semver::Version;

use crate::error::{Error, Result};
use crate::function::{ArgType, FunctionRegistry, Signature};
use crate::value::Value;

const LIST_OR_STRING: ArgType = ArgType::OneOf(&[ArgType::List, ArgType::String]);

#[derive(Debug, Clone, Copy)]
enum Component {
    Major,
    Minor,
    Patch,
}

impl Component {
    fn of(self, version: &Version) -> u64 {
        match self {
            Component::Major => version.major,
            Component::Minor => version.minor,
            Component::Patch => version.patch,
        }
    }
}

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register_fn(
        "semver_max",
        Signature::new(vec![LIST_OR_STRING]),
        |args, _ctx| extreme("semver_max", &args[0], Iterator::max),
    );
    registry.register_fn(
        "semver_min",
        Signature::new(vec![LIST_OR_STRING]),
        |args, _ctx| extreme("semver_min", &args[0], Iterator::min),
    );

    for (name, component) in [
        ("semver_major", Component::Major),
        ("semver_minor", Component::Minor),
        ("semver_patch", Component::Patch),
    ] {
        registry.register_fn(
            name,
            Signature::new(vec![ArgType::String]),
            move |args, _ctx| {
                let version = parse(name, &args[0])?;
                Ok(Value::String(component.of(&version).to_string()))
            },
        );

        let list_name = format!("{name}_list");
        registry.register_fn(
            list_name.clone(),
            Signature::new(vec![ArgType::List]),
            move |args, _ctx| {
                let versions = parse_all(&list_name, &args[0])?;
                Ok(Value::Sequence(
                    versions
                        .iter()
                        .map(|v| Value::String(component.of(v).to_string()))
                        .collect(),
                ))
            },
        );
    }
}

/// Largest or smallest version, normalized. A single string is just normalized.
fn extreme(
    name: &str,
    arg: &Value,
    pick: fn(std::vec::IntoIter<Version>) -> Option<Version>,
) -> Result<Value> {
    let versions = match arg {
        Value::String(_) => vec![parse(name, arg)?],
        _ => parse_all(name, arg)?,
    };

    pick(versions.into_iter())
        .map(|v| Value::String(v.to_string()))
        .ok_or_else(|| Error::function_failed(name, "cannot pick from an empty list"))
}

fn parse(name: &str, value: &Value) -> Result<Version> {
    let text = value.as_str().ok_or_else(|| {
        Error::arity_or_type(name, format!("expected a version string, got {}", value.type_name()))
    })?;
    Version::parse(text.trim())
        .map_err(|e| Error::function_failed(name, format!("'{text}' is not a semantic version: {e}")))
}

fn parse_all(name: &str, value: &Value) -> Result<Vec<Version>> {
    value
        .as_sequence()
        .unwrap_or_default()
        .iter()
        .map(|item| parse(name, item))
        .collect()
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::function::{FunctionContext, FunctionRegistry};
    use crate::value::Value;
    use pretty_assertions::assert_eq;

    fn call(name: &str, arg: Value) -> crate::error::Result<Value> {
        FunctionRegistry::with_builtins().call(name, &[arg], &FunctionContext::default())
    }

    #[test]
    fn test_semver_max_of_list() {
        let versions = Value::from(vec!["1.0.0", "2.3.1", "1.9.9"]);
        assert_eq!(call("semver_max", versions).unwrap(), Value::from("2.3.1"));
    }

    #[test]
    fn test_semver_min_of_list() {
        let versions = Value::from(vec!["1.10.0", "1.9.0", "1.9.0-rc.1"]);
        assert_eq!(call("semver_min", versions).unwrap(), Value::from("1.9.0-rc.1"));
    }

    #[test]
    fn test_semver_max_orders_numerically() {
        let versions = Value::from(vec!["1.9.0", "1.10.0"]);
        assert_eq!(call("semver_max", versions).unwrap(), Value::from("1.10.0"));
    }

    #[test]
    fn test_semver_max_single_string() {
        assert_eq!(call("semver_max", Value::from(" 3.0.0 ")).unwrap(), Value::from("3.0.0"));
    }

    #[test]
    fn test_semver_max_empty_list() {
        let err = call("semver_max", Value::Sequence(vec![])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::QueryEval);
    }

    #[test]
    fn test_semver_max_invalid_version() {
        let err = call("semver_max", Value::from(vec!["1.0.0", "banana"])).unwrap_err();
        assert_eq!(err.kind, ErrorKind::QueryEval);
        assert!(err.to_string().contains("'banana' is not a semantic version"));
    }

    #[test]
    fn test_semver_max_non_string_element() {
        let err = call("semver_max", Value::Sequence(vec![Value::Integer(1)])).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::ArityOrType {
                name: "semver_max".into()
            }
        );
    }

    #[test]
    fn test_components() {
        assert_eq!(call("semver_major", Value::from("4.5.6")).unwrap(), Value::from("4"));
        assert_eq!(call("semver_minor", Value::from("4.5.6")).unwrap(), Value::from("5"));
        assert_eq!(call("semver_patch", Value::from("4.5.6")).unwrap(), Value::from("6"));
    }

    #[test]
    fn test_component_lists() {
        let versions = Value::from(vec!["1.2.3", "4.5.6"]);
        assert_eq!(
            call("semver_minor_list", versions).unwrap(),
            Value::from(vec!["2", "5"])
        );
    }

    #[test]
    fn test_component_rejects_list() {
        let err = call("semver_major", Value::from(vec!["1.2.3"])).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::ArityOrType {
                name: "semver_major".into()
            }
        );
    }
}
