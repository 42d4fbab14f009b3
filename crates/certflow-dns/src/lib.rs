//! DNS plumbing for dns-01 certificate validation
//!
//! Two record backends cooperate to delegate a challenge lookup away from
//! the customer's zone:
//!
//! - the intermediate authority (operator-controlled zone, stateless
//!   token-authenticated API) holds the actual TXT record, and
//! - the customer's hosting account zone carries a CNAME pointing
//!   `_acme-challenge.<domain>` at the intermediate record.
//!
//! The [`VerificationPoller`] confirms the delegation chain resolves before
//! the certificate authority is asked to validate it.

pub mod account;
pub mod credentials;
pub mod error;
pub mod intermediate;
pub mod propagation;
pub mod record;

pub use account::{AccountDnsProvider, PanelDnsClient};
pub use credentials::{AccountDnsCredentials, IntermediateCredentials};
pub use error::{DnsError, SessionStep};
pub use intermediate::{HttpIntermediateProvider, IntermediateDnsProvider};
pub use propagation::{PollerConfig, VerificationPoller};
pub use record::{challenge_record_fqdn, intermediate_record_name, ACME_CHALLENGE_LABEL};
