//! Protocol implementations for domain lookups.
//!
//! This module contains the RDAP client, the WHOIS aggregation API client,
//! and the IANA bootstrap registry model both of them rely on.

/// RDAP (Registration Data Access Protocol) implementation
pub mod rdap;

/// WHOIS aggregation API client
pub mod whois;

/// Bootstrap registry model and TLD extraction
pub mod registry;

// Re-export commonly used functions and types
pub use rdap::{build_query_url, parse_rdap_response, RdapClient};
pub use registry::{extract_tld, BootstrapRegistry, ServiceEntry, COMPOUND_SUFFIXES};
pub use whois::{parse_dnssec, parse_whois_response, WhoisClient};
