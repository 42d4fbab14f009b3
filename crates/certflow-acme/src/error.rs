//! Issuer error types

use thiserror::Error;

/// Errors from the certificate issuance exchange.
///
/// Every variant is terminal for the attempt; the orchestrator decides
/// whether an operator retry is offered. `category` gives the generic
/// operator-facing bucket while the display string carries the CA's
/// message verbatim.
#[derive(Debug, Error)]
pub enum IssuerError {
    #[error("Account registration failed: {0}")]
    AccountRegistration(String),

    #[error("Order creation failed: {0}")]
    OrderCreation(String),

    #[error("CA offered no dns-01 challenge for domain '{0}'")]
    NoDns01Challenge(String),

    #[error("Challenge setup failed: {0}")]
    ChallengeSetup(String),

    #[error("Challenge rejected for domain '{domain}': {message}")]
    ChallengeRejected { domain: String, message: String },

    #[error("Certificate finalization failed: {0}")]
    Finalization(String),

    #[error("Timed out waiting for CA: {0}")]
    Timeout(String),

    #[error("Unknown certificate provider '{0}'")]
    UnknownProvider(String),
}

impl IssuerError {
    /// Generic category for operator display
    pub fn category(&self) -> &'static str {
        match self {
            IssuerError::AccountRegistration(_) => "account-registration",
            IssuerError::OrderCreation(_) => "order-creation",
            IssuerError::NoDns01Challenge(_) => "challenge-unavailable",
            IssuerError::ChallengeSetup(_) => "challenge-setup",
            IssuerError::ChallengeRejected { .. } => "challenge-rejected",
            IssuerError::Finalization(_) => "finalization",
            IssuerError::Timeout(_) => "timeout",
            IssuerError::UnknownProvider(_) => "configuration",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_and_verbatim_message() {
        let err = IssuerError::ChallengeRejected {
            domain: "demo1.example-service.com".to_string(),
            message: "Incorrect TXT record".to_string(),
        };
        assert_eq!(err.category(), "challenge-rejected");
        assert!(err.to_string().contains("Incorrect TXT record"));
    }
}
