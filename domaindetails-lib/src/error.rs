//! Error handling for domain lookups.
//!
//! This module defines the error type shared by the bootstrap cache, the RDAP
//! client, the WHOIS API client and the fallback orchestration.

use std::fmt;
use std::time::Duration;

/// Main error type for lookup operations.
///
/// A 404 from either protocol is never represented here: it is the
/// "domain available" outcome and is returned as a successful result.
#[derive(Debug, Clone)]
pub enum DomainDetailsError {
    /// Malformed domain argument
    InvalidDomain { domain: String, reason: String },

    /// Missing cache metadata, or TLD absent from the bootstrap registry
    NotFound { subject: String, message: String },

    /// Transport failure reaching the bootstrap, RDAP or WHOIS endpoints
    Fetch { url: String, message: String },

    /// Request exceeded its fixed timeout
    Timeout { operation: String, duration: Duration },

    /// Response body does not decode into the expected shape
    Parse {
        message: String,
        content: Option<String>,
    },

    /// Non-success status code or explicit error field from a service
    Upstream {
        service: String,
        message: String,
        status_code: Option<u16>,
    },

    /// Reading or writing the on-disk cache failed
    CacheIo { path: String, message: String },

    /// Invalid configuration file or value
    Config { message: String },

    /// Both RDAP and the WHOIS fallback failed
    LookupFailed {
        domain: String,
        rdap: Box<DomainDetailsError>,
        whois: Box<DomainDetailsError>,
    },
}

impl DomainDetailsError {
    /// Create a new invalid domain error.
    pub fn invalid_domain<D: Into<String>, R: Into<String>>(domain: D, reason: R) -> Self {
        Self::InvalidDomain {
            domain: domain.into(),
            reason: reason.into(),
        }
    }

    /// Create a new not-found error.
    pub fn not_found<S: Into<String>, M: Into<String>>(subject: S, message: M) -> Self {
        Self::NotFound {
            subject: subject.into(),
            message: message.into(),
        }
    }

    /// Create a new fetch error.
    pub fn fetch<U: Into<String>, M: Into<String>>(url: U, message: M) -> Self {
        Self::Fetch {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a new timeout error.
    pub fn timeout<O: Into<String>>(operation: O, duration: Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            duration,
        }
    }

    /// Create a new parse error.
    pub fn parse<M: Into<String>>(message: M) -> Self {
        Self::Parse {
            message: message.into(),
            content: None,
        }
    }

    /// Create a new upstream error without a status code.
    pub fn upstream<S: Into<String>, M: Into<String>>(service: S, message: M) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
            status_code: None,
        }
    }

    /// Create a new upstream error carrying the HTTP status code.
    pub fn upstream_with_status<S: Into<String>, M: Into<String>>(
        service: S,
        message: M,
        status_code: u16,
    ) -> Self {
        Self::Upstream {
            service: service.into(),
            message: message.into(),
            status_code: Some(status_code),
        }
    }

    /// Create a new cache I/O error.
    pub fn cache_io<P: Into<String>, M: Into<String>>(path: P, message: M) -> Self {
        Self::CacheIo {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Create a new configuration error.
    pub fn config<M: Into<String>>(message: M) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Combine the RDAP and WHOIS failures for one domain.
    pub fn lookup_failed<D: Into<String>>(
        domain: D,
        rdap: DomainDetailsError,
        whois: DomainDetailsError,
    ) -> Self {
        Self::LookupFailed {
            domain: domain.into(),
            rdap: Box::new(rdap),
            whois: Box::new(whois),
        }
    }

    /// Map a reqwest failure for `url` onto `Timeout` or `Fetch`.
    ///
    /// Unlike the `From` conversion this records the configured timeout.
    pub(crate) fn from_request(err: reqwest::Error, url: &str, timeout: Duration) -> Self {
        if err.is_timeout() {
            Self::timeout(format!("GET {}", url), timeout)
        } else if err.is_connect() {
            Self::fetch(url, format!("Connection failed: {}", err))
        } else {
            Self::fetch(url, format!("Request failed: {}", err))
        }
    }

    /// Whether this is a transport-level failure (including timeouts).
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::Timeout { .. })
    }
}

impl fmt::Display for DomainDetailsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDomain { domain, reason } => {
                write!(f, "Invalid domain '{}': {}", domain, reason)
            }
            Self::NotFound { subject, message } => {
                write!(f, "Not found '{}': {}", subject, message)
            }
            Self::Fetch { url, message } => {
                write!(f, "Fetch error for {}: {}", url, message)
            }
            Self::Timeout {
                operation,
                duration,
            } => {
                write!(f, "Timeout after {:?} during: {}", duration, operation)
            }
            Self::Parse {
                message,
                content: _,
            } => {
                write!(f, "Parse error: {}", message)
            }
            Self::Upstream {
                service,
                message,
                status_code,
            } => {
                if let Some(code) = status_code {
                    write!(f, "{} error (HTTP {}): {}", service, code, message)
                } else {
                    write!(f, "{} error: {}", service, message)
                }
            }
            Self::CacheIo { path, message } => {
                write!(f, "Cache error at '{}': {}", path, message)
            }
            Self::Config { message } => {
                write!(f, "Configuration error: {}", message)
            }
            Self::LookupFailed {
                domain,
                rdap,
                whois,
            } => {
                write!(
                    f,
                    "Lookup failed for '{}': RDAP: {}; WHOIS: {}",
                    domain, rdap, whois
                )
            }
        }
    }
}

impl std::error::Error for DomainDetailsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::LookupFailed { whois, .. } => Some(whois.as_ref()),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for DomainDetailsError {
    fn from(err: reqwest::Error) -> Self {
        let url = err
            .url()
            .map(|u| u.to_string())
            .unwrap_or_else(|| "<unknown>".to_string());

        if err.is_timeout() {
            Self::Timeout {
                operation: format!("GET {}", url),
                duration: Duration::ZERO,
            }
        } else {
            Self::Fetch {
                url,
                message: err.to_string(),
            }
        }
    }
}

impl From<serde_json::Error> for DomainDetailsError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse {
            message: format!("JSON parsing failed: {}", err),
            content: None,
        }
    }
}
