//! # DomainDetails Library
//!
//! Domain registration lookups over RDAP, with a WHOIS aggregation API as the
//! fallback and a locally cached IANA bootstrap registry for RDAP server
//! discovery.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use domaindetails_lib::DomainResolver;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let resolver = DomainResolver::new()?;
//!     let result = resolver.lookup("example.com").await?;
//!
//!     println!("Domain: {} - Available: {} (via {})", result.domain, result.available, result.method);
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **RDAP Protocol**: Structured registration data from the authoritative server
//! - **WHOIS Fallback**: Pre-parsed WHOIS fields when RDAP fails for any reason
//! - **Bootstrap Cache**: IANA TLD -> server map kept on disk with a 24 hour TTL
//! - **Single Schema**: Both paths produce the same `LookupResult`

// Re-export main public API types and functions
// This makes them available as domaindetails_lib::TypeName
pub use cache::{
    is_fresh, BootstrapCache, CacheInfo, CacheMetadata, BOOTSTRAP_FILE, BOOTSTRAP_TTL_HOURS,
    META_FILE,
};
pub use config::{
    load_env_config, load_env_config_with, parse_bool, parse_timeout, CacheConfig,
    ConfigManager, DefaultsConfig, EndpointsConfig, EnvConfig, FileConfig, TimeoutsConfig,
};
pub use error::DomainDetailsError;
pub use protocols::rdap::RDAP_NOT_FOUND_MESSAGE;
pub use protocols::whois::WHOIS_NOT_FOUND_MESSAGE;
pub use protocols::{
    build_query_url, extract_tld, parse_dnssec, parse_rdap_response, parse_whois_response,
    BootstrapRegistry, RdapClient, ServiceEntry, WhoisClient, COMPOUND_SUFFIXES,
};
pub use resolver::DomainResolver;
pub use types::{
    default_cache_dir, DnssecState, LookupConfig, LookupMethod, LookupResult, ParsedRecord,
    DEFAULT_BOOTSTRAP_URL, DEFAULT_CACHE_DIR_NAME, DEFAULT_WHOIS_API_URL, USER_AGENT,
};
pub use utils::{normalize_domain, prepare_domain, validate_domain};

// Internal modules - these are not part of the public API
mod cache;
mod config;
mod error;
mod protocols;
mod resolver;
mod types;
mod utils;

// Type alias for convenience
pub type Result<T> = std::result::Result<T, DomainDetailsError>;

// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
