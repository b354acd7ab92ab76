//! WHOIS fallback through the domaindetails aggregation API.
//!
//! Port-43 WHOIS output is free text that differs per registry. Instead of
//! parsing it locally, this client asks an HTTP API that returns the WHOIS
//! record already split into fields, and copies those fields onto the shared
//! [`ParsedRecord`] schema.

use crate::error::DomainDetailsError;
use crate::types::{DnssecState, LookupConfig, LookupMethod, LookupResult, ParsedRecord};
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

/// Message attached to results for domains the API reports as unregistered.
pub const WHOIS_NOT_FOUND_MESSAGE: &str = "Domain not found";

const SERVICE: &str = "WHOIS API";

/// Client for the WHOIS aggregation API.
#[derive(Clone)]
pub struct WhoisClient {
    /// HTTP client for API requests
    http_client: reqwest::Client,
    /// Full `.../api/whois` endpoint
    endpoint: String,
    /// Timeout for API requests
    timeout: Duration,
    /// Whether results carry the raw WHOIS text
    include_raw: bool,
}

impl WhoisClient {
    /// Create a new WHOIS client against `config.whois_api_url`.
    pub fn with_config(config: &LookupConfig) -> Result<Self, DomainDetailsError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.whois_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            http_client,
            endpoint: format!("{}/api/whois", config.whois_api_url.trim_end_matches('/')),
            timeout: config.whois_timeout,
            include_raw: config.include_raw,
        })
    }

    /// Look up a domain through the WHOIS API.
    ///
    /// # Arguments
    ///
    /// * `domain` - Normalized domain name (e.g., "example.com")
    ///
    /// # Returns
    ///
    /// A `LookupResult` tagged `whois`: available on 404, registered otherwise.
    ///
    /// # Errors
    ///
    /// Returns `DomainDetailsError` if:
    /// - The request fails or times out
    /// - The API answers with a status other than 200 or 404
    /// - The API reports an error in a 200 body
    /// - The body cannot be decoded
    pub async fn lookup(&self, domain: &str) -> Result<LookupResult, DomainDetailsError> {
        debug!("Querying WHOIS API: {}?domain={}", self.endpoint, domain);

        let response = self
            .http_client
            .get(&self.endpoint)
            .query(&[("domain", domain)])
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| DomainDetailsError::from_request(e, &self.endpoint, self.timeout))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| DomainDetailsError::from_request(e, &self.endpoint, self.timeout))?;

        match status {
            StatusCode::OK => parse_whois_response(domain, &body, self.include_raw),
            StatusCode::NOT_FOUND => Ok(LookupResult::available(
                domain,
                LookupMethod::Whois,
                WHOIS_NOT_FOUND_MESSAGE,
            )),
            code => {
                let message = serde_json::from_slice::<ApiResponse>(&body)
                    .ok()
                    .and_then(|r| r.error)
                    .filter(|e| !e.is_empty())
                    .map(|e| format!("API error: {}", e))
                    .unwrap_or_else(|| format!("API returned status {}", code.as_u16()));

                Err(DomainDetailsError::upstream_with_status(
                    SERVICE,
                    message,
                    code.as_u16(),
                ))
            }
        }
    }
}

/// Decode a 200 API body into a registered `LookupResult`.
///
/// # Errors
///
/// - `Parse` if the body is not an API response
/// - `Upstream` if the body carries a non-empty `error` field
pub fn parse_whois_response(
    domain: &str,
    body: &[u8],
    include_raw: bool,
) -> Result<LookupResult, DomainDetailsError> {
    let response: ApiResponse = serde_json::from_slice(body).map_err(|e| {
        DomainDetailsError::parse(format!("Failed to parse WHOIS API response: {}", e))
    })?;

    if let Some(error) = response.error.filter(|e| !e.is_empty()) {
        return Err(DomainDetailsError::upstream(
            SERVICE,
            format!("API error: {}", error),
        ));
    }

    let record = response.parsed_data.map(map_record).unwrap_or_default();
    let raw = response
        .raw_data
        .filter(|raw| include_raw && !raw.is_empty());

    Ok(LookupResult::registered(
        domain,
        LookupMethod::Whois,
        record,
        raw,
    ))
}

/// Map a WHOIS `dnssec` value by keyword.
///
/// Registries spell this field many ways ("signedDelegation", "unsigned",
/// "yes", "Inactive"); unrecognized values map to `None`.
pub fn parse_dnssec(value: &str) -> Option<DnssecState> {
    let value = value.trim().to_lowercase();

    if value.is_empty() {
        return None;
    }
    if value.contains("unsigned") || matches!(value.as_str(), "no" | "false" | "inactive") {
        return Some(DnssecState::Unsigned);
    }
    if value.contains("signed") || matches!(value.as_str(), "yes" | "true" | "active") {
        return Some(DnssecState::Signed);
    }
    None
}

/// `parse_dnssec`, logging values that carry text but map to no state.
fn map_dnssec(value: &str) -> Option<DnssecState> {
    let state = parse_dnssec(value);
    if state.is_none() && !value.trim().is_empty() {
        debug!("Unrecognized WHOIS dnssec value dropped: {:?}", value);
    }
    state
}

fn map_record(data: ApiParsedData) -> ParsedRecord {
    ParsedRecord {
        domain_name: non_empty(data.domain_name),
        registrar: non_empty(data.registrar),
        registrant: non_empty(data.registrant),
        creation_date: non_empty(data.creation_date),
        expiration_date: non_empty(data.expiration_date),
        last_modified: non_empty(data.last_modified),
        nameservers: data.nameservers.unwrap_or_default(),
        status: data.status.unwrap_or_default(),
        dnssec: data.dnssec.as_deref().and_then(map_dnssec),
        whois_server: non_empty(data.whois_server),
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

/// API response envelope.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ApiResponse {
    parsed_data: Option<ApiParsedData>,
    raw_data: Option<String>,
    error: Option<String>,
}

/// Pre-parsed WHOIS fields; any of them may be null or missing.
#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct ApiParsedData {
    domain_name: Option<String>,
    registrar: Option<String>,
    registrant: Option<String>,
    creation_date: Option<String>,
    expiration_date: Option<String>,
    last_modified: Option<String>,
    nameservers: Option<Vec<String>>,
    status: Option<Vec<String>>,
    dnssec: Option<String>,
    whois_server: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: serde_json::Value, include_raw: bool) -> Result<LookupResult, DomainDetailsError> {
        let body = serde_json::to_vec(&value).unwrap();
        parse_whois_response("example.com", &body, include_raw)
    }

    #[test]
    fn test_parsed_data_copied_field_for_field() {
        let result = parse(
            json!({
                "parsedData": {
                    "domainName": "EXAMPLE.COM",
                    "registrar": "RESERVED-Internet Assigned Numbers Authority",
                    "registrant": "",
                    "creationDate": "1995-08-14T04:00:00Z",
                    "expirationDate": "2025-08-13T04:00:00Z",
                    "lastModified": "2024-08-14T07:01:34Z",
                    "nameservers": ["A.IANA-SERVERS.NET", "B.IANA-SERVERS.NET"],
                    "status": ["clientDeleteProhibited"],
                    "dnssec": "signedDelegation",
                    "whoisServer": "whois.iana.org"
                },
                "rawData": "Domain Name: EXAMPLE.COM"
            }),
            false,
        )
        .unwrap();

        assert!(!result.available);
        assert_eq!(result.method, LookupMethod::Whois);
        assert!(result.raw.is_none());

        let record = result.parsed.unwrap();
        assert_eq!(record.domain_name.as_deref(), Some("EXAMPLE.COM"));
        assert_eq!(
            record.registrar.as_deref(),
            Some("RESERVED-Internet Assigned Numbers Authority")
        );
        assert_eq!(record.registrant, None);
        assert_eq!(record.creation_date.as_deref(), Some("1995-08-14T04:00:00Z"));
        assert_eq!(record.expiration_date.as_deref(), Some("2025-08-13T04:00:00Z"));
        assert_eq!(record.last_modified.as_deref(), Some("2024-08-14T07:01:34Z"));
        assert_eq!(record.nameservers, vec!["A.IANA-SERVERS.NET", "B.IANA-SERVERS.NET"]);
        assert_eq!(record.status, vec!["clientDeleteProhibited"]);
        assert_eq!(record.dnssec, Some(DnssecState::Signed));
        assert_eq!(record.whois_server.as_deref(), Some("whois.iana.org"));
    }

    #[test]
    fn test_null_parsed_data_yields_empty_record() {
        let result = parse(json!({"parsedData": null, "rawData": "raw text"}), true).unwrap();
        assert_eq!(result.parsed, Some(ParsedRecord::default()));
        assert_eq!(result.raw.as_deref(), Some("raw text"));
    }

    #[test]
    fn test_error_field_in_success_body() {
        let err = parse(json!({"error": "rate limited"}), false).unwrap_err();
        assert_eq!(err.to_string(), "WHOIS API error: API error: rate limited");

        // An empty error field is not an error
        assert!(parse(json!({"error": "", "parsedData": {}}), false).is_ok());
    }

    #[test]
    fn test_undecodable_body_is_parse_error() {
        assert!(matches!(
            parse_whois_response("example.com", b"not json", false),
            Err(DomainDetailsError::Parse { .. })
        ));
    }

    #[test]
    fn test_unrecognized_dnssec_keeps_rest_of_record() {
        let body = br#"{"parsedData": {"domainName": "example.de", "dnssec": "DS-Data: 12345 8 2"}}"#;
        let record = parse_whois_response("example.de", body, false)
            .unwrap()
            .parsed
            .unwrap();
        assert_eq!(record.dnssec, None);
        assert_eq!(record.domain_name.as_deref(), Some("example.de"));
        assert_eq!(map_dnssec("  "), None);
        assert_eq!(map_dnssec("signedDelegation; DS records: 2"), Some(DnssecState::Signed));
    }

    #[test]
    fn test_parse_dnssec_keywords() {
        assert_eq!(parse_dnssec("unsigned"), Some(DnssecState::Unsigned));
        assert_eq!(parse_dnssec("Unsigned delegation"), Some(DnssecState::Unsigned));
        assert_eq!(parse_dnssec("no"), Some(DnssecState::Unsigned));
        assert_eq!(parse_dnssec("Inactive"), Some(DnssecState::Unsigned));
        assert_eq!(parse_dnssec("signedDelegation"), Some(DnssecState::Signed));
        assert_eq!(parse_dnssec("yes"), Some(DnssecState::Signed));
        assert_eq!(parse_dnssec(""), None);
        assert_eq!(parse_dnssec("unknown"), None);
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let config = LookupConfig::default().with_whois_api_url("http://127.0.0.1:8080/");
        let client = WhoisClient::with_config(&config).unwrap();
        assert_eq!(client.endpoint, "http://127.0.0.1:8080/api/whois");
    }
}
