//! Shared HTTP plumbing for the connectors
//!
//! Every connector wraps one `reqwest::Client` built with a per-request
//! timeout. Retries are not built in: a failed call surfaces as a
//! collaborator error and the caller decides what it means.

use sendcheck_core::{Error, Result};
use std::time::Duration;

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Longest slice of a response body quoted in an error message
const BODY_EXCERPT_CHARS: usize = 200;

/// Connection settings common to every HTTP collaborator
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Base URL of the service, without a trailing slash
    pub base_url: String,

    /// API key sent with each request
    pub api_key: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl HttpConfig {
    /// Create settings with the default timeout
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Override the request timeout
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    /// Base URL with any trailing slash removed
    pub fn trimmed_base(&self) -> String {
        self.base_url.trim_end_matches('/').to_string()
    }
}

/// Build a client with the configured timeout
pub(crate) fn build_client(
    collaborator: &'static str,
    timeout_secs: u64,
) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| {
            Error::collaborator(collaborator, format!("failed to build HTTP client: {}", e))
        })
}

/// Send a request, mapping transport failures to collaborator errors
pub(crate) async fn send(
    collaborator: &'static str,
    request: reqwest::RequestBuilder,
) -> Result<reqwest::Response> {
    request.send().await.map_err(|e| {
        if e.is_timeout() {
            Error::collaborator(collaborator, "request timed out")
        } else {
            Error::collaborator(collaborator, format!("request failed: {}", e))
        }
    })
}

/// Fail on any non-success status, quoting the start of the body
pub(crate) async fn require_success(
    collaborator: &'static str,
    response: reqwest::Response,
) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(Error::collaborator(
        collaborator,
        format!("HTTP {}: {}", status, excerpt(&body)),
    ))
}

pub(crate) fn excerpt(body: &str) -> String {
    body.chars().take(BODY_EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trimmed_base() {
        let config = HttpConfig::new("https://api.example.com/", "k");
        assert_eq!(config.trimmed_base(), "https://api.example.com");
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.with_timeout(5).timeout_secs, 5);
    }

    #[test]
    fn test_excerpt_bounds_characters() {
        let long = "é".repeat(500);
        assert_eq!(excerpt(&long).chars().count(), BODY_EXCERPT_CHARS);
    }
}
