//! Certificate issuance against ACME certificate authorities
//!
//! Abstracts the two supported CA backends behind one [`CertificateIssuer`]
//! interface. The backend is chosen per request at creation time and is
//! immutable afterward. CA-side rejections are terminal for the attempt;
//! retries are an orchestrator-level, operator-visible decision.

pub mod error;
pub mod issuer;
pub mod provider;

pub use error::IssuerError;
pub use issuer::{
    AcmeIssuer, CertificateIssuer, ChallengeInstaller, IssueOrder, IssuedCertificate, ProgressLog,
};
pub use provider::{AcmeEnvironment, CaProvider};
