//! Challenge record naming
//!
//! The shapes here must exactly match what a dns-01 validation expects:
//! `_acme-challenge.<domain>` is the queried TXT name, and for automated
//! domains that name is a CNAME to `_acme-challenge.<prefix>.<zone>` on the
//! intermediate authority.

use crate::error::DnsError;

/// Label prefix queried by dns-01 validators
pub const ACME_CHALLENGE_LABEL: &str = "_acme-challenge";

/// The TXT name a certificate authority resolves for `domain`
pub fn challenge_record_fqdn(domain: &str) -> String {
    format!("{}.{}", ACME_CHALLENGE_LABEL, domain)
}

/// The record name installed on the intermediate authority zone,
/// namespaced by the subdomain prefix so concurrent requests never collide
pub fn intermediate_record_name(prefix: &str, intermediate_zone: &str) -> String {
    format!("{}.{}.{}", ACME_CHALLENGE_LABEL, prefix, intermediate_zone)
}

/// Validate a record name before handing it to a provider API.
///
/// Rejects empty names, embedded whitespace, empty labels, and names over
/// the 253-octet DNS limit. Leading underscores are allowed (service labels
/// such as `_acme-challenge` depend on them).
pub fn validate_record_name(name: &str) -> Result<(), DnsError> {
    let invalid = |reason: &str| DnsError::InvalidRecord {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    if name.is_empty() {
        return Err(invalid("name is empty"));
    }
    if name.len() > 253 {
        return Err(invalid("name exceeds 253 characters"));
    }
    for label in name.split('.') {
        if label.is_empty() {
            return Err(invalid("name contains an empty label"));
        }
        if label.len() > 63 {
            return Err(invalid("label exceeds 63 characters"));
        }
        if !label
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(invalid("label contains an invalid character"));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_challenge_record_fqdn() {
        assert_eq!(
            challenge_record_fqdn("example.com"),
            "_acme-challenge.example.com"
        );
        assert_eq!(
            challenge_record_fqdn("demo1.example-service.com"),
            "_acme-challenge.demo1.example-service.com"
        );
    }

    #[test]
    fn test_intermediate_record_name() {
        assert_eq!(
            intermediate_record_name("demo1", "acme-proxy.example.net"),
            "_acme-challenge.demo1.acme-proxy.example.net"
        );
    }

    #[test]
    fn test_validate_record_name() {
        assert!(validate_record_name("_acme-challenge.example.com").is_ok());
        assert!(validate_record_name("a-b.example.com").is_ok());

        assert!(validate_record_name("").is_err());
        assert!(validate_record_name("bad name.example.com").is_err());
        assert!(validate_record_name("double..dot.com").is_err());
        assert!(validate_record_name(&format!("{}.com", "a".repeat(64))).is_err());
        assert!(validate_record_name(&"a.".repeat(140)).is_err());
    }

    #[test]
    fn test_validation_failure_is_not_retryable() {
        let err = validate_record_name("bad name").unwrap_err();
        assert!(!err.is_retryable());
    }
}
