//! IANA RDAP bootstrap registry model and TLD extraction.
//!
//! The bootstrap document maps TLD labels to the RDAP servers authoritative
//! for them. This module decodes that document, answers TLD→server queries,
//! and derives the effective TLD of a domain name.

use crate::error::DomainDetailsError;
use serde::Deserialize;

/// Second-level public suffixes treated as a single effective TLD.
///
/// This is a fixed allow-list, not a public suffix algorithm: a domain under
/// any other multi-label suffix resolves against its last label only.
pub const COMPOUND_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "me.uk", "com.au", "net.au", "org.au", "co.nz", "net.nz", "org.nz",
    "co.za", "co.in", "com.br",
];

/// One service entry: the TLDs it covers and its candidate RDAP base URLs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub tlds: Vec<String>,
    pub urls: Vec<String>,
}

/// A decoded IANA bootstrap snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawBootstrap")]
pub struct BootstrapRegistry {
    pub description: String,
    pub publication: String,
    pub version: String,
    /// Entries in document order; lookups are first-match
    pub services: Vec<ServiceEntry>,
}

/// Wire shape: `services` is a list of `[[tld...], [url...]]` pairs.
#[derive(Deserialize)]
struct RawBootstrap {
    #[serde(default)]
    description: String,
    #[serde(default)]
    publication: String,
    #[serde(default)]
    version: String,
    services: Vec<Vec<Vec<String>>>,
}

impl From<RawBootstrap> for BootstrapRegistry {
    fn from(raw: RawBootstrap) -> Self {
        let services = raw
            .services
            .into_iter()
            .filter_map(|service| {
                // Entries without a URL list are skipped
                let mut parts = service.into_iter();
                let tlds = parts.next()?;
                let urls = parts.next()?;
                Some(ServiceEntry { tlds, urls })
            })
            .collect();

        Self {
            description: raw.description,
            publication: raw.publication,
            version: raw.version,
            services,
        }
    }
}

impl BootstrapRegistry {
    /// Decode a bootstrap document.
    ///
    /// # Errors
    ///
    /// Returns `DomainDetailsError::Parse` if the bytes are not a bootstrap
    /// document (e.g., missing `services`, wrong nesting).
    pub fn from_slice(bytes: &[u8]) -> Result<Self, DomainDetailsError> {
        serde_json::from_slice(bytes).map_err(|e| {
            DomainDetailsError::parse(format!("Invalid bootstrap document: {}", e))
        })
    }

    /// Total number of TLD labels across all entries.
    pub fn tld_count(&self) -> usize {
        self.services.iter().map(|s| s.tlds.len()).sum()
    }

    /// First candidate URL of the first entry listing `tld`.
    ///
    /// Matching is case-insensitive. An entry that lists the TLD but has no
    /// URLs does not stop the scan.
    pub fn find_server(&self, tld: &str) -> Option<&str> {
        let tld_lower = tld.to_lowercase();

        self.services
            .iter()
            .filter(|service| service.tlds.iter().any(|t| t.eq_ignore_ascii_case(&tld_lower)))
            .find_map(|service| service.urls.first().map(String::as_str))
    }
}

/// Extract the effective TLD from a domain name.
///
/// Uses the two-label suffix when it appears in [`COMPOUND_SUFFIXES`] and the
/// domain has at least three labels (`sub.co.uk` -> `co.uk`), otherwise the
/// last label (`example.com` -> `com`, `co.uk` -> `uk`).
///
/// # Errors
///
/// Returns `DomainDetailsError::InvalidDomain` for names with fewer than two
/// labels.
pub fn extract_tld(domain: &str) -> Result<String, DomainDetailsError> {
    let domain = domain.trim().trim_end_matches('.').to_lowercase();
    let parts: Vec<&str> = domain.split('.').collect();

    if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
        return Err(DomainDetailsError::invalid_domain(
            domain.as_str(),
            "Domain must contain at least two non-empty labels",
        ));
    }

    let last = parts[parts.len() - 1];
    if parts.len() >= 3 {
        let two_level = format!("{}.{}", parts[parts.len() - 2], last);
        if COMPOUND_SUFFIXES.contains(&two_level.as_str()) {
            return Ok(two_level);
        }
    }

    Ok(last.to_string())
}
