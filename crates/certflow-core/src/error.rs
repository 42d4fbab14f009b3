//! Orchestrator error taxonomy
//!
//! Classification errors are user-actionable and synchronous; DNS and CA
//! errors are caught at the orchestrator boundary and converted to
//! `last_error` plus a status transition; precondition violations are API
//! misuse, not certificate failures, and are rejected before any side
//! effect.

use thiserror::Error;

use crate::classify::ClassifyError;
use crate::request::RequestStatus;
use crate::store::StoreError;
use certflow_dns::DnsError;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error(transparent)]
    Classification(#[from] ClassifyError),

    /// One non-terminal request per domain at a time
    #[error("A certificate request for '{domain}' already exists")]
    DuplicateRequest { domain: String },

    #[error("DNS provisioning failed: {0}")]
    Dns(#[from] DnsError),

    /// CA-side failure; the message carries the CA's words verbatim and
    /// the category is the generic operator-facing bucket
    #[error("Issuance failed [{category}]: {message}")]
    Issuance {
        category: &'static str,
        message: String,
    },

    /// Wrong-state call, rejected before any side effect
    #[error("Operation '{operation}' is not allowed while the request is {status}")]
    Precondition {
        operation: &'static str,
        status: RequestStatus,
    },

    /// Issuing and issued requests must go through revocation instead
    #[error("A request in status {0} cannot be deleted")]
    DeleteForbidden(RequestStatus),

    #[error("Certificate request '{0}' not found")]
    NotFound(String),

    #[error("Hosting account '{0}' not found")]
    AccountNotFound(String),

    #[error("Hosting account '{0}' has no DNS credentials")]
    MissingDnsCredentials(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl OrchestratorError {
    /// Stable machine-readable code for API surfaces
    pub fn code(&self) -> &'static str {
        match self {
            OrchestratorError::Classification(ClassifyError::QuotaExceeded) => "NO_SLOT_AVAILABLE",
            OrchestratorError::Classification(ClassifyError::HostingRequired(_)) => {
                "HOSTING_REQUIRED"
            }
            OrchestratorError::Classification(ClassifyError::HostingNotActive(_)) => {
                "HOSTING_NOT_ACTIVE"
            }
            OrchestratorError::Classification(ClassifyError::ApprovalRequired(_)) => {
                "APPROVAL_REQUIRED"
            }
            OrchestratorError::Classification(ClassifyError::Store(_)) => "STORE_ERROR",
            OrchestratorError::DuplicateRequest { .. } => "REQUEST_EXISTS",
            OrchestratorError::Dns(_) => "DNS_PROVISIONING_FAILED",
            OrchestratorError::Issuance { .. } => "ISSUANCE_FAILED",
            OrchestratorError::Precondition { .. } => "INVALID_STATE",
            OrchestratorError::DeleteForbidden(_) => "DELETE_FORBIDDEN",
            OrchestratorError::NotFound(_) => "REQUEST_NOT_FOUND",
            OrchestratorError::AccountNotFound(_) => "ACCOUNT_NOT_FOUND",
            OrchestratorError::MissingDnsCredentials(_) => "MISSING_DNS_CREDENTIALS",
            OrchestratorError::Store(_) => "STORE_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classification_codes_are_distinct() {
        let codes = [
            OrchestratorError::Classification(ClassifyError::QuotaExceeded).code(),
            OrchestratorError::Classification(ClassifyError::HostingRequired("d".into())).code(),
            OrchestratorError::Classification(ClassifyError::HostingNotActive("d".into())).code(),
            OrchestratorError::Classification(ClassifyError::ApprovalRequired("d".into())).code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }

    #[test]
    fn test_precondition_is_distinct_from_failure() {
        let err = OrchestratorError::Precondition {
            operation: "issue",
            status: RequestStatus::Verifying,
        };
        assert_eq!(err.code(), "INVALID_STATE");
        assert!(err.to_string().contains("issue"));
        assert!(err.to_string().contains("verifying"));
    }
}
