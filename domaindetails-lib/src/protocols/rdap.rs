//! RDAP (Registration Data Access Protocol) implementation.
//!
//! This module resolves the authoritative RDAP server for a domain through the
//! bootstrap cache, queries it, and maps the structured JSON response onto the
//! shared [`ParsedRecord`] schema. A 404 from the server is the "available"
//! outcome, not an error.

use crate::cache::BootstrapCache;
use crate::error::DomainDetailsError;
use crate::protocols::registry::extract_tld;
use crate::types::{DnssecState, LookupConfig, LookupMethod, LookupResult, ParsedRecord};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer};
use std::time::Duration;
use tracing::debug;

/// Message attached to results for domains the registry does not know.
pub const RDAP_NOT_FOUND_MESSAGE: &str = "Domain not found in registry";

const RDAP_ACCEPT: &str = "application/rdap+json, application/json";

/// RDAP client for domain lookups.
///
/// This client handles server discovery through the bootstrap cache, request
/// formatting, response decoding, and error mapping.
#[derive(Clone)]
pub struct RdapClient {
    /// Source of TLD -> RDAP server mappings
    cache: BootstrapCache,
    /// HTTP client for RDAP requests
    http_client: reqwest::Client,
    /// Timeout for RDAP requests
    timeout: Duration,
    /// Whether results carry the raw response body
    include_raw: bool,
}

impl RdapClient {
    /// Create a new RDAP client reading servers from `cache`.
    pub fn with_config(
        cache: BootstrapCache,
        config: &LookupConfig,
    ) -> Result<Self, DomainDetailsError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.rdap_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            cache,
            http_client,
            timeout: config.rdap_timeout,
            include_raw: config.include_raw,
        })
    }

    /// Look up a domain using RDAP.
    ///
    /// # Arguments
    ///
    /// * `domain` - Normalized domain name (e.g., "example.com")
    ///
    /// # Returns
    ///
    /// A `LookupResult` tagged `rdap`: available on 404, registered with a
    /// `ParsedRecord` on 200.
    ///
    /// # Errors
    ///
    /// Returns `DomainDetailsError` if:
    /// - No RDAP server is known for the TLD
    /// - The request fails or times out
    /// - The server answers with any status other than 200 or 404
    /// - The response body cannot be decoded
    pub async fn lookup(&self, domain: &str) -> Result<LookupResult, DomainDetailsError> {
        let tld = extract_tld(domain)?;
        debug!("Extracted TLD: {}", tld);

        let server = self.cache.resolve_server(&tld).await?;
        debug!("Using RDAP server: {}", server);

        let url = build_query_url(&server, domain);
        debug!("Querying: {}", url);

        let response = self
            .http_client
            .get(&url)
            .header(ACCEPT, RDAP_ACCEPT)
            .send()
            .await
            .map_err(|e| DomainDetailsError::from_request(e, &url, self.timeout))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| DomainDetailsError::from_request(e, &url, self.timeout))?;

        match status {
            StatusCode::OK => parse_rdap_response(domain, &body, self.include_raw),
            StatusCode::NOT_FOUND => Ok(LookupResult::available(
                domain,
                LookupMethod::Rdap,
                RDAP_NOT_FOUND_MESSAGE,
            )),
            code => Err(status_error(code, &body)),
        }
    }
}

/// Join an RDAP base URL and a domain into a domain query URL.
///
/// Bootstrap base URLs end with `/`; one is added when missing.
pub fn build_query_url(base: &str, domain: &str) -> String {
    if base.ends_with('/') {
        format!("{}domain/{}", base, domain)
    } else {
        format!("{}/domain/{}", base, domain)
    }
}

/// Decode a 200 RDAP response body into a registered `LookupResult`.
///
/// # Errors
///
/// Returns `DomainDetailsError::Parse` if the body is not an RDAP domain
/// object.
pub fn parse_rdap_response(
    domain: &str,
    body: &[u8],
    include_raw: bool,
) -> Result<LookupResult, DomainDetailsError> {
    let rdap: RdapDomain = serde_json::from_slice(body).map_err(|e| {
        DomainDetailsError::parse(format!("Failed to parse RDAP response: {}", e))
    })?;

    let raw = include_raw.then(|| String::from_utf8_lossy(body).into_owned());

    Ok(LookupResult::registered(
        domain,
        LookupMethod::Rdap,
        map_record(rdap),
        raw,
    ))
}

/// Build the error for a status other than 200/404, folding in the RDAP
/// error object when the body is one.
fn status_error(status: StatusCode, body: &[u8]) -> DomainDetailsError {
    let mut message = format!("RDAP server returned status {}", status.as_u16());

    if let Ok(error) = serde_json::from_slice::<RdapErrorObject>(body) {
        let mut details: Vec<String> = Vec::new();
        if let Some(title) = error.title.filter(|t| !t.is_empty()) {
            details.push(title);
        }
        details.extend(error.description.into_iter().filter(|d| !d.is_empty()));

        if !details.is_empty() {
            message = format!("{}: {}", message, details.join(" - "));
        }
    }

    DomainDetailsError::upstream_with_status("RDAP", message, status.as_u16())
}

/// Map an RDAP domain object onto the shared record.
fn map_record(rdap: RdapDomain) -> ParsedRecord {
    let mut record = ParsedRecord {
        domain_name: Some(rdap.ldh_name).filter(|n| !n.is_empty()),
        status: rdap.status,
        ..ParsedRecord::default()
    };

    // Later events overwrite earlier ones with the same action
    for event in rdap.events {
        match event.event_action.as_str() {
            "registration" => record.creation_date = Some(event.event_date),
            "expiration" => record.expiration_date = Some(event.event_date),
            "last changed" => record.last_modified = Some(event.event_date),
            _ => {}
        }
    }

    record.nameservers = rdap
        .nameservers
        .into_iter()
        .map(|ns| ns.ldh_name)
        .filter(|name| !name.is_empty())
        .collect();

    // Top-level entities only; the last entity carrying a role wins
    for entity in &rdap.entities {
        if entity.has_role("registrar") {
            record.registrar = Some(entity_name(entity));
        }
        if entity.has_role("registrant") {
            record.registrant = Some(entity_name(entity));
        }
    }

    record.dnssec = rdap.secure_dns.map(|dns| {
        if dns.delegation_signed {
            DnssecState::Signed
        } else {
            DnssecState::Unsigned
        }
    });

    record
}

/// Entity display name: handle, else vCard `fn`, else empty.
fn entity_name(entity: &RdapEntity) -> String {
    if !entity.handle.is_empty() {
        return entity.handle.clone();
    }

    entity
        .vcard_array
        .as_ref()
        .and_then(extract_vcard_name)
        .unwrap_or_default()
}

/// Extract the formatted name from a jCard array.
fn extract_vcard_name(vcard: &serde_json::Value) -> Option<String> {
    vcard
        .as_array()
        .and_then(|a| a.get(1))
        .and_then(|a| a.as_array())
        .and_then(|items| {
            items
                .iter()
                .filter_map(|item| item.as_array())
                .filter(|item| item.len() >= 4)
                .find(|item| item.first().and_then(|f| f.as_str()) == Some("fn"))
                .and_then(|item| item.get(3))
                .and_then(|n| n.as_str())
                .map(String::from)
        })
}

/// Deserialize a member that servers send as `null` as its default value.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// RDAP domain object, reduced to the members the record uses.
///
/// Every member tolerates both absence and `null`.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RdapDomain {
    #[serde(deserialize_with = "null_as_default")]
    ldh_name: String,
    #[serde(deserialize_with = "null_as_default")]
    status: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    events: Vec<RdapEvent>,
    #[serde(deserialize_with = "null_as_default")]
    entities: Vec<RdapEntity>,
    #[serde(deserialize_with = "null_as_default")]
    nameservers: Vec<RdapNameserver>,
    #[serde(rename = "secureDNS")]
    secure_dns: Option<RdapSecureDns>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RdapEvent {
    #[serde(deserialize_with = "null_as_default")]
    event_action: String,
    #[serde(deserialize_with = "null_as_default")]
    event_date: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RdapEntity {
    #[serde(deserialize_with = "null_as_default")]
    handle: String,
    #[serde(deserialize_with = "null_as_default")]
    roles: Vec<String>,
    /// Kept untyped: jCard arrays are heterogeneous
    vcard_array: Option<serde_json::Value>,
}

impl RdapEntity {
    fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RdapNameserver {
    #[serde(deserialize_with = "null_as_default")]
    ldh_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct RdapSecureDns {
    #[serde(deserialize_with = "null_as_default")]
    delegation_signed: bool,
}

/// RDAP error response (RFC 9083 section 6); `errorCode` repeats the status.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RdapErrorObject {
    title: Option<String>,
    #[serde(deserialize_with = "null_as_default")]
    description: Vec<String>,
}
