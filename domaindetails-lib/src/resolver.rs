//! Main domain resolver implementation.
//!
//! This module provides the `DomainResolver` struct that orchestrates a lookup:
//! RDAP first, the WHOIS aggregation API as a substitute when RDAP fails.

use crate::cache::BootstrapCache;
use crate::error::DomainDetailsError;
use crate::protocols::{RdapClient, WhoisClient};
use crate::types::{LookupConfig, LookupResult};
use crate::utils::prepare_domain;
use tracing::{debug, warn};

/// Main resolver that coordinates domain lookups.
///
/// # Example
///
/// ```rust,no_run
/// use domaindetails_lib::DomainResolver;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let resolver = DomainResolver::new()?;
///     let result = resolver.lookup("example.com").await?;
///     println!("{} available: {}", result.domain, result.available);
///     Ok(())
/// }
/// ```
pub struct DomainResolver {
    /// Configuration settings for this resolver instance
    config: LookupConfig,
    /// Bootstrap cache shared with the RDAP client
    cache: BootstrapCache,
    /// RDAP client for the primary lookup
    rdap_client: RdapClient,
    /// WHOIS API client for the fallback lookup
    whois_client: WhoisClient,
}

impl DomainResolver {
    /// Create a resolver with default configuration.
    ///
    /// Default settings:
    /// - Cache: `~/.domaindetails`
    /// - RDAP timeout: 10 seconds
    /// - WHOIS timeout: 15 seconds
    /// - Raw payloads: excluded
    pub fn new() -> Result<Self, DomainDetailsError> {
        Self::with_config(LookupConfig::default())
    }

    /// Create a resolver with custom configuration.
    ///
    /// # Example
    ///
    /// ```rust
    /// use domaindetails_lib::{DomainResolver, LookupConfig};
    /// use std::time::Duration;
    ///
    /// let config = LookupConfig::default()
    ///     .with_cache_dir("/tmp/domaindetails-cache")
    ///     .with_rdap_timeout(Duration::from_secs(5))
    ///     .with_raw(true);
    ///
    /// let resolver = DomainResolver::with_config(config).unwrap();
    /// ```
    pub fn with_config(config: LookupConfig) -> Result<Self, DomainDetailsError> {
        let cache = BootstrapCache::with_config(&config)?;
        let rdap_client = RdapClient::with_config(cache.clone(), &config)?;
        let whois_client = WhoisClient::with_config(&config)?;

        Ok(Self {
            config,
            cache,
            rdap_client,
            whois_client,
        })
    }

    /// Look up a domain: RDAP first, WHOIS on any RDAP failure.
    ///
    /// The process:
    /// 1. Normalizes and validates the domain (no network on failure)
    /// 2. Attempts RDAP through the bootstrap cache
    /// 3. On any RDAP error, attempts the WHOIS API exactly once
    /// 4. Returns whichever result succeeded, never a merge of both
    ///
    /// # Errors
    ///
    /// Returns `DomainDetailsError` if:
    /// - The domain name is invalid
    /// - Both RDAP and WHOIS fail (`LookupFailed`, carrying both causes)
    pub async fn lookup(&self, domain: &str) -> Result<LookupResult, DomainDetailsError> {
        let domain = prepare_domain(domain)?;
        debug!("Looking up domain: {}", domain);

        let rdap_error = match self.rdap_client.lookup(&domain).await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if rdap_error.is_fetch_failure() {
            warn!("RDAP unreachable for {}: {}, falling back to WHOIS", domain, rdap_error);
        } else {
            warn!("RDAP lookup failed for {}: {}, falling back to WHOIS", domain, rdap_error);
        }

        self.whois_client
            .lookup(&domain)
            .await
            .map_err(|whois_error| {
                DomainDetailsError::lookup_failed(domain.as_str(), rdap_error, whois_error)
            })
    }

    /// Look up a domain over RDAP only.
    pub async fn lookup_rdap(&self, domain: &str) -> Result<LookupResult, DomainDetailsError> {
        let domain = prepare_domain(domain)?;
        self.rdap_client.lookup(&domain).await
    }

    /// Look up a domain through the WHOIS API only.
    pub async fn lookup_whois(&self, domain: &str) -> Result<LookupResult, DomainDetailsError> {
        let domain = prepare_domain(domain)?;
        self.whois_client.lookup(&domain).await
    }

    /// The bootstrap cache backing RDAP server discovery.
    pub fn cache(&self) -> &BootstrapCache {
        &self.cache
    }

    /// Get the current configuration for this resolver.
    pub fn config(&self) -> &LookupConfig {
        &self.config
    }
}
