use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use certflow_acme::CaProvider;
use certflow_core::{CertificateRequest, DomainType, RequestStatus};

/// Lifecycle status of a certificate request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CertificateStatus {
    /// Waiting for the challenge record to be placed
    PendingVerification,
    /// Propagation checks are running
    Verifying,
    /// Challenge record confirmed visible
    Verified,
    /// ACME exchange in progress
    Issuing,
    /// Certificate material available
    Issued,
    /// Last attempt failed, eligible for retry
    Failed,
    /// Certificate aged out
    Expired,
    /// Certificate was revoked
    Revoked,
}

impl From<RequestStatus> for CertificateStatus {
    fn from(status: RequestStatus) -> Self {
        match status {
            RequestStatus::PendingVerification => CertificateStatus::PendingVerification,
            RequestStatus::Verifying => CertificateStatus::Verifying,
            RequestStatus::Verified => CertificateStatus::Verified,
            RequestStatus::Issuing => CertificateStatus::Issuing,
            RequestStatus::Issued => CertificateStatus::Issued,
            RequestStatus::Failed => CertificateStatus::Failed,
            RequestStatus::Expired => CertificateStatus::Expired,
            RequestStatus::Revoked => CertificateStatus::Revoked,
        }
    }
}

/// Whether the domain is a managed service sub-domain or customer-owned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum DomainKind {
    Subdomain,
    Custom,
}

impl From<DomainType> for DomainKind {
    fn from(domain_type: DomainType) -> Self {
        match domain_type {
            DomainType::Subdomain => DomainKind::Subdomain,
            DomainType::Custom => DomainKind::Custom,
        }
    }
}

/// Certificate authority choices
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CertificateAuthority {
    LetsEncrypt,
    Buypass,
}

impl From<CertificateAuthority> for CaProvider {
    fn from(authority: CertificateAuthority) -> Self {
        match authority {
            CertificateAuthority::LetsEncrypt => CaProvider::LetsEncrypt,
            CertificateAuthority::Buypass => CaProvider::Buypass,
        }
    }
}

impl From<CaProvider> for CertificateAuthority {
    fn from(provider: CaProvider) -> Self {
        match provider {
            CaProvider::LetsEncrypt => CertificateAuthority::LetsEncrypt,
            CaProvider::Buypass => CertificateAuthority::Buypass,
        }
    }
}

/// Certificate request as exposed over the API.
///
/// Certificate material and private keys are deliberately absent; they
/// are only available through the bundle endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CertificateRequestInfo {
    /// Unique request identifier
    pub id: String,
    /// Domain the certificate covers
    pub domain: String,
    pub domain_kind: DomainKind,
    pub authority: CertificateAuthority,
    pub status: CertificateStatus,
    /// Hosting account responsible for the domain's DNS
    pub owner_account_id: String,
    /// Whether challenge DNS records are managed automatically
    pub dns_automatable: bool,
    /// Number of operator retries so far
    pub retry_count: u32,
    /// Diagnostic from the most recent failure
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub issued_at: Option<DateTime<Utc>>,
}

impl From<&CertificateRequest> for CertificateRequestInfo {
    fn from(request: &CertificateRequest) -> Self {
        Self {
            id: request.id.clone(),
            domain: request.domain.clone(),
            domain_kind: request.domain_type.into(),
            authority: request.provider.into(),
            status: request.status.into(),
            owner_account_id: request.owner_account_id.clone(),
            dns_automatable: request.dns_automatable,
            retry_count: request.retry_count,
            last_error: request.last_error.clone(),
            created_at: request.created_at,
            verified_at: request.verified_at,
            issued_at: request.issued_at,
        }
    }
}

/// Request to create a certificate request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCertificateRequest {
    /// Domain to request a certificate for
    pub domain: String,
    /// Certificate authority (defaults to Let's Encrypt)
    #[serde(default)]
    pub authority: Option<CertificateAuthority>,
}

/// TXT record the operator must install for non-automatable domains
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ManualDnsInstruction {
    /// Fully qualified record name
    pub record_name: String,
    /// Required TXT value
    pub record_value: String,
}

/// Response when creating a certificate request
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CreateCertificateResponse {
    pub request: CertificateRequestInfo,
    /// Present only when the operator must place the record themselves
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manual_record: Option<ManualDnsInstruction>,
}

/// List of certificate requests
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CertificateRequestList {
    pub requests: Vec<CertificateRequestInfo>,
    pub total: usize,
}

/// Issued certificate material, admin only
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct CertificateBundle {
    /// Leaf certificate, PEM
    pub certificate: String,
    /// Private key, PEM
    pub private_key: String,
    /// Intermediate chain, PEM
    pub ca_certificate: String,
}

/// Query parameters for the issuance log endpoint
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LogQuery {
    /// Number of trailing lines to return (default: 50)
    pub lines: Option<usize>,
}

/// Tail of an in-flight issuance log
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IssuanceLogResponse {
    pub lines: Vec<String>,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
