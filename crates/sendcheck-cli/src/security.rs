//! Security utilities for the SendCheck CLI
//!
//! Operator access gate and collaborator endpoint validation.

use std::net::IpAddr;
use subtle::ConstantTimeEq;
use thiserror::Error;
use url::Url;

/// Security-related errors
#[derive(Debug, Error)]
pub enum SecurityError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("URL scheme '{0}' is not allowed, only HTTPS is permitted")]
    InvalidScheme(String),

    #[error("Host '{0}' is blocked: internal/private IP addresses are not allowed")]
    BlockedHost(String),

    #[error("URL must have a host")]
    MissingHost,
}

/// Hostnames that must never receive recipient data or API keys
const BLOCKED_HOSTNAMES: &[&str] = &[
    "localhost",
    "localhost.localdomain",
    "ip6-localhost",
    "ip6-loopback",
    // Cloud metadata services
    "metadata.google.internal",
    "metadata.goog",
    "169.254.169.254",
    "fd00:ec2::254",
];

/// Configuration for URL validation
#[derive(Debug, Clone, Default)]
pub struct UrlValidationConfig {
    /// Allow HTTP scheme (development only)
    pub allow_http: bool,
    /// Allow localhost/loopback addresses (development only)
    pub allow_localhost: bool,
    /// Allow private/internal IP ranges
    pub allow_private_ips: bool,
}

impl UrlValidationConfig {
    /// Development configuration that allows local mock servers
    pub fn development() -> Self {
        Self {
            allow_http: true,
            allow_localhost: true,
            allow_private_ips: true,
        }
    }

    /// Strict unless `SENDCHECK_DEV_MODE` is set
    pub fn from_env() -> Self {
        if std::env::var("SENDCHECK_DEV_MODE").is_ok() {
            Self::development()
        } else {
            Self::default()
        }
    }
}

/// Validate a collaborator endpoint before any request is sent to it
///
/// Rejects non-HTTPS schemes, loopback and metadata hosts, and private or
/// link-local IP literals unless the configuration relaxes them.
pub fn validate_endpoint_url(
    url_str: &str,
    config: &UrlValidationConfig,
) -> Result<Url, SecurityError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "https" => {}
        "http" if config.allow_http => {}
        scheme => return Err(SecurityError::InvalidScheme(scheme.to_string())),
    }

    let host = url.host_str().ok_or(SecurityError::MissingHost)?;

    if !config.allow_localhost {
        let host_lower = host.to_lowercase();
        for blocked in BLOCKED_HOSTNAMES {
            if host_lower == *blocked || host_lower.ends_with(&format!(".{}", blocked)) {
                return Err(SecurityError::BlockedHost(host.to_string()));
            }
        }
    }

    // IPv6 literals arrive bracketed from host_str
    let bare = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = bare.parse::<IpAddr>() {
        if !config.allow_localhost && ip.is_loopback() {
            return Err(SecurityError::BlockedHost(host.to_string()));
        }
        if !config.allow_private_ips && is_private_ip(&ip) {
            return Err(SecurityError::BlockedHost(host.to_string()));
        }
        if is_link_local(&ip) {
            return Err(SecurityError::BlockedHost(host.to_string()));
        }
    }

    Ok(url)
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private()
                // 100.64.0.0/10 (carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
                || v4.octets()[0] == 0
        }
        // fc00::/7
        IpAddr::V6(v6) => (v6.segments()[0] & 0xfe00) == 0xfc00,
    }
}

fn is_link_local(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => v4.octets()[0] == 169 && v4.octets()[1] == 254,
        IpAddr::V6(v6) => (v6.segments()[0] & 0xffc0) == 0xfe80,
    }
}

/// Operator access gate over a small allow-list of keys
pub struct AccessGate {
    keys: Vec<String>,
}

impl AccessGate {
    /// Gate accepting any of `keys`; blank entries are dropped
    pub fn new<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keys: keys
                .into_iter()
                .map(Into::into)
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect(),
        }
    }

    /// Gate from a comma-separated list
    pub fn from_list(list: &str) -> Self {
        Self::new(list.split(','))
    }

    /// Whether no key is configured (everything is denied)
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Check `token` against every configured key in constant time
    pub fn is_authorized(&self, token: &str) -> bool {
        let token = token.trim().as_bytes();
        if token.is_empty() {
            return false;
        }
        // no early exit: every key is compared
        self.keys
            .iter()
            .fold(subtle::Choice::from(0u8), |found, key| {
                found | key.as_bytes().ct_eq(token)
            })
            .into()
    }
}
