//! Blocking HTTP access for network-backed functions

use std::time::Duration;

/// Default SPDX license-list-data location (one JSON file per license id)
pub const DEFAULT_SPDX_BASE_URL: &str =
    "https://raw.githubusercontent.com/spdx/license-list-data/main/json/details";
/// Default package registry (PyPI JSON API)
pub const DEFAULT_REGISTRY_BASE_URL: &str = "https://pypi.org";

/// Network settings for functions that fetch upstream data
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Global per-request timeout; expiry is reported as an upstream error
    pub timeout: Duration,
    /// Base URL for SPDX license details
    pub spdx_base_url: String,
    /// Base URL for the package registry
    pub registry_base_url: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            spdx_base_url: DEFAULT_SPDX_BASE_URL.to_string(),
            registry_base_url: DEFAULT_REGISTRY_BASE_URL.to_string(),
        }
    }
}

impl HttpOptions {
    /// Set the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Point SPDX lookups somewhere else (a mirror or a test server)
    pub fn with_spdx_base_url(mut self, url: impl Into<String>) -> Self {
        self.spdx_base_url = url.into();
        self
    }

    /// Point package registry lookups somewhere else
    pub fn with_registry_base_url(mut self, url: impl Into<String>) -> Self {
        self.registry_base_url = url.into();
        self
    }
}

#[cfg(feature = "http")]
pub(crate) use fetch::{fetch_text, join_url};

#[cfg(feature = "http")]
mod fetch {
    use super::HttpOptions;
    use crate::error::{Error, Result};

    /// Append path segments to a base URL, percent-encoding each one
    pub(crate) fn join_url(base: &str, segments: &[&str]) -> Result<String> {
        let mut url = url::Url::parse(base)
            .map_err(|e| Error::upstream(base, None, format!("Invalid base URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|()| Error::upstream(base, None, "Base URL cannot have path segments"))?
            .pop_if_empty()
            .extend(segments);
        Ok(url.to_string())
    }

    /// GET a URL and return the body; any non-success outcome is an upstream error
    pub(crate) fn fetch_text(url: &str, options: &HttpOptions) -> Result<String> {
        let config = ureq::Agent::config_builder()
            .timeout_global(Some(options.timeout))
            .build();
        let agent: ureq::Agent = config.into();

        log::debug!("GET {url}");
        let response = agent.get(url).call().map_err(|e| {
            let (status, error_msg) = match &e {
                ureq::Error::StatusCode(code) => (Some(*code), format!("HTTP {code}")),
                ureq::Error::Timeout(kind) => (None, format!("Request timeout: {kind:?}")),
                ureq::Error::Io(io_err) => (None, format!("Connection error: {io_err}")),
                _ => (None, format!("HTTP request failed: {e}")),
            };
            log::warn!("GET {url} failed: {error_msg}");
            Error::upstream(url, status, error_msg)
        })?;

        response
            .into_body()
            .read_to_string()
            .map_err(|e| Error::upstream(url, None, e.to_string()))
    }

}
