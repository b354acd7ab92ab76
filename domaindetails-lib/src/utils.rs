//! Utility functions for domain processing and validation.
//!
//! Every lookup entry point normalizes and validates its argument here before
//! any network activity happens.

use crate::error::DomainDetailsError;

/// Shortest accepted domain, e.g. "a.b".
const MIN_DOMAIN_LEN: usize = 3;
/// RFC 1035 limit on a full name.
const MAX_DOMAIN_LEN: usize = 253;
/// RFC 1035 limit on a single label.
const MAX_LABEL_LEN: usize = 63;

/// Trim surrounding whitespace and lowercase a domain argument.
pub fn normalize_domain(domain: &str) -> String {
    domain.trim().to_lowercase()
}

/// Validate a normalized domain name.
///
/// Accepts 3 to 253 characters, at least two labels, each label 1 to 63
/// characters of `[a-z0-9-]` that neither starts nor ends with a hyphen.
/// Internationalized names must be passed in their ASCII (punycode) form.
///
/// # Arguments
///
/// * `domain` - The domain name to validate, already normalized
///
/// # Returns
///
/// `Ok(())` if valid, `Err(DomainDetailsError::InvalidDomain)` if invalid.
pub fn validate_domain(domain: &str) -> Result<(), DomainDetailsError> {
    if domain.is_empty() {
        return Err(DomainDetailsError::invalid_domain(
            domain,
            "Domain name cannot be empty",
        ));
    }

    if domain.len() < MIN_DOMAIN_LEN || domain.len() > MAX_DOMAIN_LEN {
        return Err(DomainDetailsError::invalid_domain(
            domain,
            format!(
                "Domain length must be between {} and {} characters",
                MIN_DOMAIN_LEN, MAX_DOMAIN_LEN
            ),
        ));
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(DomainDetailsError::invalid_domain(
            domain,
            "Domain must contain at least two labels",
        ));
    }

    for label in labels {
        if label.is_empty() || label.len() > MAX_LABEL_LEN {
            return Err(DomainDetailsError::invalid_domain(
                domain,
                format!("Each label must be 1 to {} characters", MAX_LABEL_LEN),
            ));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(DomainDetailsError::invalid_domain(
                domain,
                format!("Label '{}' cannot start or end with a hyphen", label),
            ));
        }

        if !label
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        {
            return Err(DomainDetailsError::invalid_domain(
                domain,
                format!("Label '{}' contains invalid characters", label),
            ));
        }
    }

    Ok(())
}

/// Normalize then validate, returning the normalized name.
pub fn prepare_domain(domain: &str) -> Result<String, DomainDetailsError> {
    let normalized = normalize_domain(domain);
    validate_domain(&normalized)?;
    Ok(normalized)
}
