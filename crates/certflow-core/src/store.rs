//! Persistence seam for certificate requests

use async_trait::async_trait;
use thiserror::Error;

use crate::request::CertificateRequest;

/// Opaque backend failure from an account or request store
#[derive(Debug, Error)]
#[error("Store error: {0}")]
pub struct StoreError(pub String);

/// Durable storage for [`CertificateRequest`] records.
///
/// The persisted record is the single source of truth for status; the
/// orchestrator writes through this trait after every transition.
#[async_trait]
pub trait RequestStore: Send + Sync {
    async fn insert(&self, request: &CertificateRequest) -> Result<(), StoreError>;

    /// Persist the full current state of an existing request
    async fn update(&self, request: &CertificateRequest) -> Result<(), StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<CertificateRequest>, StoreError>;

    /// Find the non-terminal request for a domain, if any. Backs the
    /// one-active-request-per-domain invariant.
    async fn find_active_by_domain(
        &self,
        domain: &str,
    ) -> Result<Option<CertificateRequest>, StoreError>;

    async fn list(&self) -> Result<Vec<CertificateRequest>, StoreError>;

    async fn delete(&self, id: &str) -> Result<(), StoreError>;
}
