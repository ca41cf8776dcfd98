//! Package registry (PyPI JSON API) lookup

use crate::error::{Error, Result};
use crate::function::{ArgType, FunctionContext, FunctionRegistry, Signature};
use crate::http::{fetch_text, join_url};
use crate::value::Value;

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register_fn(
        "pypi_data",
        Signature::new(vec![ArgType::Mapping]),
        |args, ctx| {
            let name = field(&args[0], "name")?.ok_or_else(|| {
                Error::function_failed("pypi_data", "argument must have a 'name' key")
            })?;
            let version = field(&args[0], "version")?;

            let key = match version {
                Some(v) => format!("pypi:{name}=={v}"),
                None => format!("pypi:{name}"),
            };
            ctx.cached_lookup(&key, || lookup(name, version, ctx))
        },
    );
}

/// Read an optional string key; null counts as absent
fn field<'a>(arg: &'a Value, key: &str) -> Result<Option<&'a str>> {
    match arg.as_mapping().and_then(|m| m.get(key)) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if !s.is_empty() => Ok(Some(s)),
        Some(Value::String(_)) => Ok(None),
        Some(other) => Err(Error::arity_or_type(
            "pypi_data",
            format!("'{key}' must be string, got {}", other.type_name()),
        )),
    }
}

fn lookup(name: &str, version: Option<&str>, ctx: &FunctionContext) -> Result<Value> {
    let mut segments = vec!["pypi", name];
    segments.extend(version);
    segments.push("json");

    let url = join_url(&ctx.http.registry_base_url, &segments)?;
    let body = fetch_text(&url, &ctx.http)?;
    let payload: serde_json::Value = serde_json::from_str(&body)
        .map_err(|e| Error::upstream(&url, None, format!("Malformed registry response: {e}")))?;

    log::debug!("Fetched registry metadata for {name}");
    Ok(Value::from(payload))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use indexmap::IndexMap;
    use mockito::Server;
    use pretty_assertions::assert_eq;

    use crate::environment::Environment;
    use crate::error::ErrorKind;
    use crate::function::{FunctionContext, FunctionRegistry};
    use crate::http::HttpOptions;
    use crate::value::Value;

    fn ctx(server: &Server) -> FunctionContext {
        FunctionContext::new(
            Arc::new(Environment::capture()),
            HttpOptions::default().with_registry_base_url(server.url()),
        )
    }

    fn package(name: &str, version: Option<&str>) -> Value {
        let mut m = IndexMap::new();
        m.insert("name".to_string(), Value::from(name));
        if let Some(v) = version {
            m.insert("version".to_string(), Value::from(v));
        }
        Value::Mapping(m)
    }

    #[test]
    fn test_pypi_data_latest() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/pypi/widget/json")
            .with_status(200)
            .with_body(r#"{"info": {"name": "widget", "version": "2.0.1"}, "urls": []}"#)
            .create();

        let data = FunctionRegistry::with_builtins()
            .call("pypi_data", &[package("widget", None)], &ctx(&server))
            .unwrap();
        assert_eq!(data.get_path("info.version").unwrap(), &Value::from("2.0.1"));

        mock.assert();
    }

    #[test]
    fn test_pypi_data_specific_version() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/pypi/widget/1.0.0/json")
            .with_status(200)
            .with_body(r#"{"info": {"version": "1.0.0"}}"#)
            .create();

        let data = FunctionRegistry::with_builtins()
            .call("pypi_data", &[package("widget", Some("1.0.0"))], &ctx(&server))
            .unwrap();
        assert_eq!(data.get_path("info.version").unwrap(), &Value::from("1.0.0"));

        mock.assert();
    }

    #[test]
    fn test_pypi_data_not_found() {
        let mut server = Server::new();
        let mock = server.mock("GET", "/pypi/nope/json").with_status(404).create();

        let err = FunctionRegistry::with_builtins()
            .call("pypi_data", &[package("nope", None)], &ctx(&server))
            .unwrap_err();
        assert!(matches!(
            err.kind,
            ErrorKind::Upstream {
                status: Some(404),
                ..
            }
        ));

        mock.assert();
    }

    #[test]
    fn test_pypi_data_malformed_json() {
        let mut server = Server::new();
        let mock = server
            .mock("GET", "/pypi/widget/json")
            .with_status(200)
            .with_body("<html>maintenance</html>")
            .create();

        let err = FunctionRegistry::with_builtins()
            .call("pypi_data", &[package("widget", None)], &ctx(&server))
            .unwrap_err();
        assert!(matches!(err.kind, ErrorKind::Upstream { .. }));

        mock.assert();
    }

    #[test]
    fn test_pypi_data_requires_name() {
        let err = FunctionRegistry::with_builtins()
            .call(
                "pypi_data",
                &[Value::Mapping(IndexMap::new())],
                &FunctionContext::default(),
            )
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::QueryEval);
    }
}
