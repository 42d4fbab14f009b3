//! Certificate lifecycle orchestration
//!
//! Coordinates domain classification, challenge-record provisioning across
//! the two DNS backends, propagation verification, and ACME issuance, with
//! every status transition persisted before the next step begins so a
//! process crash leaves each request recoverable from its last durable
//! state.

pub mod accounts;
pub mod classify;
pub mod error;
pub mod log_buffer;
pub mod orchestrator;
pub mod request;
pub mod secrets;
pub mod store;
pub mod tasks;

pub use accounts::{AccountStore, HostingAccount};
pub use classify::{Classification, ClassifyError, DomainClassifier};
pub use error::OrchestratorError;
pub use log_buffer::IssuanceLogBuffer;
pub use orchestrator::{
    AccountProviderFactory, ChallengeVerifier, CreateOutcome, IntermediateProviderFactory,
    ManualTxtRecord, Orchestrator, OrchestratorConfig, VerificationPolicy,
};
pub use request::{CertificateRequest, DomainType, RequestStatus};
pub use secrets::{OrchestratorSecrets, SecretsSource, StaticSecrets};
pub use store::{RequestStore, StoreError};
pub use tasks::TaskRegistry;
