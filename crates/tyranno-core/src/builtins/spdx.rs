//! SPDX license lookup

use indexmap::IndexMap;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::function::{ArgType, FunctionContext, FunctionRegistry, Signature};
use crate::http::{fetch_text, join_url};
use crate::value::Value;

/// The subset of a license-list-data details file that we read
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LicenseDetails {
    name: String,
    license_text: String,
    #[serde(default)]
    cross_ref: Vec<CrossRef>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CrossRef {
    url: String,
    #[serde(default)]
    is_valid: bool,
    #[serde(default)]
    is_live: bool,
    #[serde(default)]
    order: i64,
}

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register_fn(
        "spdx_license",
        Signature::new(vec![ArgType::String]),
        |args, ctx| {
            let id = args[0].as_str().unwrap_or_default();
            ctx.cached_lookup(&format!("spdx:{id}"), || lookup(id, ctx))
        },
    );
}

fn lookup(id: &str, ctx: &FunctionContext) -> Result<Value> {
    if id.is_empty() {
        return Err(Error::function_failed(
            "spdx_license",
            "license identifier is empty",
        ));
    }

    let url = join_url(&ctx.http.spdx_base_url, &[&format!("{id}.json")])?;
    let body = fetch_text(&url, &ctx.http)?;
    let details: LicenseDetails = serde_json::from_str(&body)
        .map_err(|e| Error::upstream(&url, None, format!("Malformed license record: {e}")))?;

    Ok(license_record(id, details))
}

fn license_record(id: &str, details: LicenseDetails) -> Value {
    let mut refs: Vec<CrossRef> = details
        .cross_ref
        .into_iter()
        .filter(|r| {
            let keep = r.is_valid && r.is_live;
            if !keep {
                log::warn!(
                    "Dropping cross-reference {} for {id} (valid: {}, live: {})",
                    r.url,
                    r.is_valid,
                    r.is_live
                );
            }
            keep
        })
        .collect();
    refs.sort_by_key(|r| r.order);

    let urls: Vec<Value> = refs
        .into_iter()
        .map(|r| Value::String(secure(&r.url)))
        .collect();

    let mut record = IndexMap::new();
    record.insert("id".to_string(), Value::from(id));
    record.insert("name".to_string(), Value::String(details.name));
    record.insert(
        "url".to_string(),
        Value::String(format!("https://spdx.org/licenses/{id}.html")),
    );
    record.insert("urls".to_string(), Value::Sequence(urls));
    record.insert(
        "header".to_string(),
        Value::String(format!("SPDX-License-Identifier: {id}")),
    );
    record.insert("text".to_string(), Value::String(details.license_text));
    Value::Mapping(record)
}

fn secure(url: &str) -> String {
    match url.strip_prefix("http://") {
        Some(rest) => format!("https://{rest}"),
        None => url.to_string(),
    }
}
