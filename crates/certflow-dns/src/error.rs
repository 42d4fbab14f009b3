//! Error types for DNS provider operations

use thiserror::Error;

/// Which step of the panel session handshake failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStep {
    /// Credential login against the hosting panel
    Login,
    /// DNS-scope grant for an already logged-in session
    DnsGrant,
    /// Session release
    Logout,
}

impl std::fmt::Display for SessionStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionStep::Login => write!(f, "login"),
            SessionStep::DnsGrant => write!(f, "dns-grant"),
            SessionStep::Logout => write!(f, "logout"),
        }
    }
}

/// Errors that can occur during DNS provider operations
#[derive(Debug, Error)]
pub enum DnsError {
    /// Token or credentials rejected by the provider
    #[error("DNS provider authentication failed: {0}")]
    Authentication(String),

    /// Panel session handshake failed; the step identifies which party
    /// the error belongs to (session layer, not the DNS operation itself)
    #[error("Panel session {step} failed: {message}")]
    Session { step: SessionStep, message: String },

    /// Malformed record name or content, permanent
    #[error("Invalid DNS record '{name}': {reason}")]
    InvalidRecord { name: String, reason: String },

    /// Record creation rejected by the provider
    #[error("Failed to create {kind} record '{name}': {message}")]
    RecordCreation {
        kind: &'static str,
        name: String,
        message: String,
    },

    /// Record deletion failed (a missing record is not an error)
    #[error("Failed to delete record '{record_id}': {message}")]
    RecordDeletion { record_id: String, message: String },

    /// Transport or provider-side failure
    #[error("DNS API request failed: {0}")]
    Api(String),

    /// The verification resolver itself is unreachable or misbehaving,
    /// distinct from "record not visible yet"
    #[error("DNS resolver failure: {0}")]
    Resolver(String),
}

impl DnsError {
    /// Whether the failure is transient and worth retrying.
    ///
    /// Validation failures are permanent; network, auth, and provider-side
    /// failures can succeed on a later attempt (auth because tokens rotate).
    pub fn is_retryable(&self) -> bool {
        !matches!(self, DnsError::InvalidRecord { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_record_is_permanent() {
        let err = DnsError::InvalidRecord {
            name: "bad name".to_string(),
            reason: "contains spaces".to_string(),
        };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_transport_errors_are_retryable() {
        assert!(DnsError::Api("connection reset".to_string()).is_retryable());
        assert!(DnsError::Authentication("expired token".to_string()).is_retryable());
        assert!(DnsError::Session {
            step: SessionStep::Login,
            message: "timeout".to_string(),
        }
        .is_retryable());
    }

    #[test]
    fn test_session_step_attribution_in_message() {
        let err = DnsError::Session {
            step: SessionStep::DnsGrant,
            message: "scope denied".to_string(),
        };
        assert!(err.to_string().contains("dns-grant"));

        let err = DnsError::Session {
            step: SessionStep::Login,
            message: "bad password".to_string(),
        };
        assert!(err.to_string().contains("login"));
    }
}
