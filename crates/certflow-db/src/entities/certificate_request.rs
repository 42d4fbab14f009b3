//! CertificateRequest entity persisting the issuance lifecycle

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status as stored
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(24))")]
pub enum Status {
    #[sea_orm(string_value = "pending_verification")]
    PendingVerification,

    #[sea_orm(string_value = "verifying")]
    Verifying,

    #[sea_orm(string_value = "verified")]
    Verified,

    #[sea_orm(string_value = "issuing")]
    Issuing,

    #[sea_orm(string_value = "issued")]
    Issued,

    #[sea_orm(string_value = "failed")]
    Failed,

    #[sea_orm(string_value = "expired")]
    Expired,

    #[sea_orm(string_value = "revoked")]
    Revoked,
}

/// Whether the domain is a service sub-domain or customer-owned
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum DomainKind {
    #[sea_orm(string_value = "subdomain")]
    Subdomain,

    #[sea_orm(string_value = "custom")]
    Custom,
}

/// Issuing certificate authority
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum Authority {
    #[sea_orm(string_value = "lets_encrypt")]
    LetsEncrypt,

    #[sea_orm(string_value = "buypass")]
    Buypass,
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "certificate_requests")]
pub struct Model {
    /// Unique request ID (primary key)
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Domain the certificate covers
    #[sea_orm(indexed)]
    pub domain: String,

    pub domain_kind: DomainKind,

    pub authority: Authority,

    /// Hosting account responsible for DNS delegation
    pub owner_account_id: String,

    pub status: Status,

    /// Random TXT value used to confirm propagation
    #[sea_orm(column_type = "Text")]
    pub verification_token: String,

    /// TXT record name on the intermediate authority zone
    #[sea_orm(column_type = "Text", nullable)]
    pub challenge_record_name: Option<String>,

    /// CNAME target installed on the account's zone
    #[sea_orm(column_type = "Text", nullable)]
    pub challenge_record_target: Option<String>,

    /// Intermediate provider's id for the TXT record, needed for deletion
    #[sea_orm(column_type = "Text", nullable)]
    pub intermediate_record_id: Option<String>,

    /// Leaf certificate, PEM
    #[sea_orm(column_type = "Text", nullable)]
    pub issued_certificate: Option<String>,

    /// Private key, PEM
    #[sea_orm(column_type = "Text", nullable)]
    pub private_key: Option<String>,

    /// Intermediate chain, PEM
    #[sea_orm(column_type = "Text", nullable)]
    pub ca_certificate: Option<String>,

    /// Diagnostic from the most recent failure, cleared on success
    #[sea_orm(column_type = "Text", nullable)]
    pub last_error: Option<String>,

    pub retry_count: i32,

    /// Whether both challenge records can be provisioned automatically
    pub dns_automatable: bool,

    pub created_at: ChronoDateTimeUtc,

    pub verified_at: Option<ChronoDateTimeUtc>,

    pub issued_at: Option<ChronoDateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<certflow_core::RequestStatus> for Status {
    fn from(status: certflow_core::RequestStatus) -> Self {
        use certflow_core::RequestStatus::*;
        match status {
            PendingVerification => Status::PendingVerification,
            Verifying => Status::Verifying,
            Verified => Status::Verified,
            Issuing => Status::Issuing,
            Issued => Status::Issued,
            Failed => Status::Failed,
            Expired => Status::Expired,
            Revoked => Status::Revoked,
        }
    }
}

impl From<Status> for certflow_core::RequestStatus {
    fn from(status: Status) -> Self {
        use certflow_core::RequestStatus::*;
        match status {
            Status::PendingVerification => PendingVerification,
            Status::Verifying => Verifying,
            Status::Verified => Verified,
            Status::Issuing => Issuing,
            Status::Issued => Issued,
            Status::Failed => Failed,
            Status::Expired => Expired,
            Status::Revoked => Revoked,
        }
    }
}

impl From<certflow_core::DomainType> for DomainKind {
    fn from(domain_type: certflow_core::DomainType) -> Self {
        match domain_type {
            certflow_core::DomainType::Subdomain => DomainKind::Subdomain,
            certflow_core::DomainType::Custom => DomainKind::Custom,
        }
    }
}

impl From<DomainKind> for certflow_core::DomainType {
    fn from(kind: DomainKind) -> Self {
        match kind {
            DomainKind::Subdomain => certflow_core::DomainType::Subdomain,
            DomainKind::Custom => certflow_core::DomainType::Custom,
        }
    }
}

impl From<certflow_acme::CaProvider> for Authority {
    fn from(provider: certflow_acme::CaProvider) -> Self {
        match provider {
            certflow_acme::CaProvider::LetsEncrypt => Authority::LetsEncrypt,
            certflow_acme::CaProvider::Buypass => Authority::Buypass,
        }
    }
}

impl From<Authority> for certflow_acme::CaProvider {
    fn from(authority: Authority) -> Self {
        match authority {
            Authority::LetsEncrypt => certflow_acme::CaProvider::LetsEncrypt,
            Authority::Buypass => certflow_acme::CaProvider::Buypass,
        }
    }
}
