//! Certificate request model and lifecycle states

use certflow_acme::CaProvider;
use chrono::{DateTime, Utc};

/// Lifecycle state of a certificate request.
///
/// `PendingVerification → Verifying → Verified → Issuing → Issued`, with
/// failure exits to `Failed` and operator retry back to
/// `PendingVerification`. `Expired` and `Revoked` exist for issued
/// certificates that age out; no transition logic targets them here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestStatus {
    PendingVerification,
    Verifying,
    Verified,
    Issuing,
    Issued,
    Failed,
    Expired,
    Revoked,
}

impl RequestStatus {
    /// Terminal states do not count against the one-active-request-per-
    /// domain rule and are the only states a request may be recreated over
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RequestStatus::Failed | RequestStatus::Expired | RequestStatus::Revoked
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::PendingVerification => "pending_verification",
            RequestStatus::Verifying => "verifying",
            RequestStatus::Verified => "verified",
            RequestStatus::Issuing => "issuing",
            RequestStatus::Issued => "issued",
            RequestStatus::Failed => "failed",
            RequestStatus::Expired => "expired",
            RequestStatus::Revoked => "revoked",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending_verification" => Some(RequestStatus::PendingVerification),
            "verifying" => Some(RequestStatus::Verifying),
            "verified" => Some(RequestStatus::Verified),
            "issuing" => Some(RequestStatus::Issuing),
            "issued" => Some(RequestStatus::Issued),
            "failed" => Some(RequestStatus::Failed),
            "expired" => Some(RequestStatus::Expired),
            "revoked" => Some(RequestStatus::Revoked),
            _ => None,
        }
    }

    /// Every status value, for exhaustive precondition tests
    pub fn all() -> [RequestStatus; 8] {
        [
            RequestStatus::PendingVerification,
            RequestStatus::Verifying,
            RequestStatus::Verified,
            RequestStatus::Issuing,
            RequestStatus::Issued,
            RequestStatus::Failed,
            RequestStatus::Expired,
            RequestStatus::Revoked,
        ]
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the requested domain relates to the service's own domains.
///
/// Classification is about matching rules only; whether DNS provisioning
/// can be automated is a separate capability axis carried on
/// [`CertificateRequest::dns_automatable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainType {
    /// `<prefix>.<service-domain>` for an operator-controlled service domain
    Subdomain,
    /// Any other domain, customer-owned
    Custom,
}

impl DomainType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainType::Subdomain => "subdomain",
            DomainType::Custom => "custom",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "subdomain" => Some(DomainType::Subdomain),
            "custom" => Some(DomainType::Custom),
            _ => None,
        }
    }
}

impl std::fmt::Display for DomainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The unit of work: one domain-validated certificate request and its
/// persisted lifecycle state.
///
/// `challenge_record_target` and `intermediate_record_id` are set together
/// and torn down together; `issued_certificate` is populated exactly when
/// status is `Issued`. The certificate, key, and CA chain fields are
/// secrets.
#[derive(Debug, Clone)]
pub struct CertificateRequest {
    pub id: String,
    pub domain: String,
    pub domain_type: DomainType,
    pub provider: CaProvider,
    /// Weak reference to the hosting account responsible for DNS
    /// delegation; used for lookup and authorization only
    pub owner_account_id: String,
    pub status: RequestStatus,
    /// Random value used as the challenge TXT record content
    pub verification_token: String,
    /// Record name on the intermediate authority zone
    pub challenge_record_name: Option<String>,
    /// CNAME target installed on the account's zone
    pub challenge_record_target: Option<String>,
    /// Provider id of the intermediate record, required for deletion;
    /// owned exclusively by this request
    pub intermediate_record_id: Option<String>,
    pub issued_certificate: Option<String>,
    pub private_key: Option<String>,
    pub ca_certificate: Option<String>,
    /// Human-readable diagnostic, cleared on successful transition
    pub last_error: Option<String>,
    pub retry_count: u32,
    /// Whether both halves of the challenge delegation can be provisioned
    /// without operator intervention
    pub dns_automatable: bool,
    pub created_at: DateTime<Utc>,
    pub verified_at: Option<DateTime<Utc>>,
    pub issued_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(RequestStatus::Failed.is_terminal());
        assert!(RequestStatus::Expired.is_terminal());
        assert!(RequestStatus::Revoked.is_terminal());

        assert!(!RequestStatus::PendingVerification.is_terminal());
        assert!(!RequestStatus::Verifying.is_terminal());
        assert!(!RequestStatus::Verified.is_terminal());
        assert!(!RequestStatus::Issuing.is_terminal());
        assert!(!RequestStatus::Issued.is_terminal());
    }

    #[test]
    fn test_status_string_round_trip() {
        for status in RequestStatus::all() {
            assert_eq!(RequestStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RequestStatus::parse("bogus"), None);
    }

    #[test]
    fn test_domain_type_string_round_trip() {
        for domain_type in [DomainType::Subdomain, DomainType::Custom] {
            assert_eq!(DomainType::parse(domain_type.as_str()), Some(domain_type));
        }
    }
}
