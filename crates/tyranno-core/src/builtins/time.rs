//! Timestamp functions
//!
//! `now_utc()` / `now_local()` render the instant captured in the
//! [`Environment`](crate::environment::Environment), not the wall clock at
//! call time. Parsing accepts RFC 3339, naive date-times (taken as UTC),
//! and bare dates.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};

use crate::error::{Error, Result};
use crate::function::{ArgType, FunctionRegistry, Signature};
use crate::value::Value;

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register_fn("now_utc", Signature::nullary(), |_args, ctx| {
        Ok(Value::String(ctx.environment.utc_timestamp()))
    });
    registry.register_fn("now_local", Signature::nullary(), |_args, ctx| {
        Ok(Value::String(ctx.environment.local_timestamp()))
    });
    registry.register_fn(
        "format_datetime",
        Signature::new(vec![ArgType::String, ArgType::String]),
        |args, _ctx| {
            let fmt = args[1].as_str().unwrap_or_default();
            format("format_datetime", &args[0], fmt)
        },
    );
    registry.register_fn(
        "year",
        Signature::new(vec![ArgType::String]),
        |args, _ctx| format("year", &args[0], "%Y"),
    );
    registry.register_fn(
        "date",
        Signature::new(vec![ArgType::String]),
        |args, _ctx| format("date", &args[0], "%Y-%m-%d"),
    );
}

fn format(name: &str, value: &Value, fmt: &str) -> Result<Value> {
    let text = value.as_str().unwrap_or_default();
    let dt = parse_datetime(text)
        .ok_or_else(|| Error::function_failed(name, format!("'{text}' is not an ISO 8601 datetime")))?;

    let items: Vec<Item<'_>> = StrftimeItems::new(fmt).collect();
    if items.contains(&Item::Error) {
        return Err(Error::function_failed(
            name,
            format!("'{fmt}' is not a valid strftime format"),
        ));
    }

    Ok(Value::String(dt.format_with_items(items.iter()).to_string()))
}

fn parse_datetime(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt);
    }

    let utc = FixedOffset::east_opt(0)?;
    NAIVE_FORMATS
        .iter()
        .find_map(|f| NaiveDateTime::parse_from_str(text, f).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .and_then(|naive| utc.from_local_datetime(&naive).single())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use crate::environment::Environment;
    use crate::error::ErrorKind;
    use crate::function::{FunctionContext, FunctionRegistry};
    use crate::http::HttpOptions;
    use crate::value::Value;

    fn ctx() -> FunctionContext {
        let instant = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 15).unwrap();
        FunctionContext::new(Arc::new(Environment::at(instant)), HttpOptions::default())
    }

    fn call(name: &str, args: &[Value]) -> crate::error::Result<Value> {
        FunctionRegistry::with_builtins().call(name, args, &ctx())
    }

    #[test]
    fn test_now_utc_uses_captured_instant() {
        assert_eq!(
            call("now_utc", &[]).unwrap(),
            Value::from("2024-03-01T12:30:15.000000Z")
        );
    }

    #[test]
    fn test_now_utc_takes_no_arguments() {
        let err = call("now_utc", &[Value::from("x")]).unwrap_err();
        assert_eq!(
            err.kind,
            ErrorKind::ArityOrType {
                name: "now_utc".into()
            }
        );
    }

    #[test]
    fn test_year_and_date() {
        let ts = Value::from("2021-07-04T09:15:00Z");
        assert_eq!(call("year", &[ts.clone()]).unwrap(), Value::from("2021"));
        assert_eq!(call("date", &[ts]).unwrap(), Value::from("2021-07-04"));
    }

    #[test]
    fn test_format_datetime_with_offset() {
        let result = call(
            "format_datetime",
            &[
                Value::from("2021-07-04T09:15:00+02:00"),
                Value::from("%d %B %Y %H:%M %z"),
            ],
        )
        .unwrap();
        assert_eq!(result, Value::from("04 July 2021 09:15 +0200"));
    }

    #[test]
    fn test_parse_naive_and_bare_date() {
        assert_eq!(
            call("year", &[Value::from("1999-12-31T23:59:59.5")]).unwrap(),
            Value::from("1999")
        );
        assert_eq!(
            call("date", &[Value::from("2000-02-29")]).unwrap(),
            Value::from("2000-02-29")
        );
    }

    #[test]
    fn test_format_roundtrips_captured_now() {
        let now = call("now_utc", &[]).unwrap();
        assert_eq!(call("date", &[now]).unwrap(), Value::from("2024-03-01"));
    }

    #[test]
    fn test_invalid_datetime() {
        let err = call("year", &[Value::from("last tuesday")]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::QueryEval);
    }

    #[test]
    fn test_invalid_format() {
        let err = call(
            "format_datetime",
            &[Value::from("2021-07-04"), Value::from("%Q")],
        )
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::QueryEval);
        assert!(err.to_string().contains("not a valid strftime format"));
    }
}
