//! Core data types for domain lookups.
//!
//! This module defines the canonical result schema shared by the RDAP and
//! WHOIS paths, and the configuration object that carries endpoints, the
//! cache root and timeouts into each client.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Canonical IANA RDAP bootstrap document for DNS.
pub const DEFAULT_BOOTSTRAP_URL: &str = "https://data.iana.org/rdap/dns.json";

/// WHOIS aggregation API base URL.
pub const DEFAULT_WHOIS_API_URL: &str = "https://api.domaindetails.io";

/// Directory (under the home directory) holding the bootstrap cache.
pub const DEFAULT_CACHE_DIR_NAME: &str = ".domaindetails";

/// User agent sent with every outbound request.
pub const USER_AGENT: &str = concat!("domaindetails/", env!("CARGO_PKG_VERSION"));

/// Result of a single domain lookup.
///
/// Whichever protocol answered, callers receive this shape. An available
/// domain never carries a `ParsedRecord`; a registered one always does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LookupResult {
    /// Normalized lowercase domain name (e.g., "example.com")
    pub domain: String,

    /// Whether the registry reported the domain as unregistered
    pub available: bool,

    /// Which protocol produced this result
    pub method: LookupMethod,

    /// Human readable note, set when the domain is available
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    /// Normalized registration facts (registered domains only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parsed: Option<ParsedRecord>,

    /// Raw upstream payload, only when the caller asked for it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw: Option<String>,
}

impl LookupResult {
    /// Build the "domain available" outcome.
    pub fn available<D: Into<String>, M: Into<String>>(
        domain: D,
        method: LookupMethod,
        message: M,
    ) -> Self {
        Self {
            domain: domain.into(),
            available: true,
            method,
            message: Some(message.into()),
            parsed: None,
            raw: None,
        }
    }

    /// Build the "domain registered" outcome.
    pub fn registered<D: Into<String>>(
        domain: D,
        method: LookupMethod,
        parsed: ParsedRecord,
        raw: Option<String>,
    ) -> Self {
        Self {
            domain: domain.into(),
            available: false,
            method,
            message: None,
            parsed: Some(parsed),
            raw,
        }
    }

    /// Drop the raw payload.
    pub fn without_raw(mut self) -> Self {
        self.raw = None;
        self
    }
}

/// Normalized registration facts.
///
/// Dates are kept as the opaque strings the upstream returned; formatting is
/// left to the consumer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedRecord {
    #[serde(default, skip_serializing_if = "is_blank")]
    pub domain_name: Option<String>,

    #[serde(default, skip_serializing_if = "is_blank")]
    pub registrar: Option<String>,

    #[serde(default, skip_serializing_if = "is_blank")]
    pub registrant: Option<String>,

    #[serde(default, skip_serializing_if = "is_blank")]
    pub creation_date: Option<String>,

    #[serde(default, skip_serializing_if = "is_blank")]
    pub expiration_date: Option<String>,

    #[serde(default, skip_serializing_if = "is_blank")]
    pub last_modified: Option<String>,

    /// Nameservers in upstream order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub nameservers: Vec<String>,

    /// Status codes in upstream order (e.g., "client transfer prohibited")
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub status: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dnssec: Option<DnssecState>,

    /// WHOIS server that answered (WHOIS path only)
    #[serde(default, skip_serializing_if = "is_blank")]
    pub whois_server: Option<String>,
}

/// Empty strings carry no information and are left out of the JSON output.
fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

/// DNSSEC delegation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DnssecState {
    Signed,
    Unsigned,
}

/// Protocol that produced a lookup result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LookupMethod {
    /// Answered by the authoritative RDAP server
    #[serde(rename = "rdap")]
    Rdap,

    /// Answered by the WHOIS aggregation API
    #[serde(rename = "whois")]
    Whois,
}

/// Configuration shared by every client in the pipeline.
///
/// Nothing in the library reads global state: endpoints, the cache root and
/// timeouts all flow from here, which lets tests point the pipeline at local
/// servers and temporary directories.
#[derive(Debug, Clone)]
pub struct LookupConfig {
    /// IANA bootstrap document URL
    pub bootstrap_url: String,

    /// WHOIS aggregation API base URL (without the `/api/whois` path)
    pub whois_api_url: String,

    /// Directory holding the bootstrap snapshot and its metadata
    pub cache_dir: PathBuf,

    /// Timeout for each RDAP request
    /// Default: 10 seconds
    pub rdap_timeout: Duration,

    /// Timeout for each WHOIS API request
    /// Default: 15 seconds
    pub whois_timeout: Duration,

    /// Timeout for fetching the bootstrap document
    /// Default: 30 seconds
    pub bootstrap_timeout: Duration,

    /// Whether results carry the raw upstream payload
    /// Default: false
    pub include_raw: bool,

    /// User agent for outbound requests
    pub user_agent: String,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            bootstrap_url: DEFAULT_BOOTSTRAP_URL.to_string(),
            whois_api_url: DEFAULT_WHOIS_API_URL.to_string(),
            cache_dir: default_cache_dir(),
            rdap_timeout: Duration::from_secs(10),
            whois_timeout: Duration::from_secs(15),
            bootstrap_timeout: Duration::from_secs(30),
            include_raw: false,
            user_agent: USER_AGENT.to_string(),
        }
    }
}

impl LookupConfig {
    /// Use a different bootstrap document URL.
    pub fn with_bootstrap_url<S: Into<String>>(mut self, url: S) -> Self {
        self.bootstrap_url = url.into();
        self
    }

    /// Use a different WHOIS API base URL.
    pub fn with_whois_api_url<S: Into<String>>(mut self, url: S) -> Self {
        self.whois_api_url = url.into();
        self
    }

    /// Keep the bootstrap cache under `dir`.
    pub fn with_cache_dir<P: Into<PathBuf>>(mut self, dir: P) -> Self {
        self.cache_dir = dir.into();
        self
    }

    /// Set the RDAP request timeout.
    pub fn with_rdap_timeout(mut self, timeout: Duration) -> Self {
        self.rdap_timeout = timeout;
        self
    }

    /// Set the WHOIS API request timeout.
    pub fn with_whois_timeout(mut self, timeout: Duration) -> Self {
        self.whois_timeout = timeout;
        self
    }

    /// Set the bootstrap fetch timeout.
    pub fn with_bootstrap_timeout(mut self, timeout: Duration) -> Self {
        self.bootstrap_timeout = timeout;
        self
    }

    /// Include the raw upstream payload in results.
    pub fn with_raw(mut self, include_raw: bool) -> Self {
        self.include_raw = include_raw;
        self
    }
}

/// `~/.domaindetails`, or `./.domaindetails` when no home directory is known.
pub fn default_cache_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(DEFAULT_CACHE_DIR_NAME)
}

impl std::fmt::Display for LookupMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LookupMethod::Rdap => write!(f, "RDAP"),
            LookupMethod::Whois => write!(f, "WHOIS"),
        }
    }
}

impl std::fmt::Display for DnssecState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DnssecState::Signed => write!(f, "signed"),
            DnssecState::Unsigned => write!(f, "unsigned"),
        }
    }
}
