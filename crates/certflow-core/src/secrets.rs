//! Secrets configuration source
//!
//! Secrets are read once per operation rather than cached on the
//! orchestrator, so rotating the intermediate API token or switching the
//! CA environment takes effect on the next call.

use async_trait::async_trait;
use certflow_acme::AcmeEnvironment;
use certflow_dns::IntermediateCredentials;

use crate::store::StoreError;

/// Everything the orchestrator needs from operator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorSecrets {
    /// Intermediate-authority zone API credentials
    pub intermediate: IntermediateCredentials,
    /// Contact email registered with the CA
    pub contact_email: String,
    /// Staging vs production CA endpoints
    pub environment: AcmeEnvironment,
}

/// Per-operation secrets lookup
#[async_trait]
pub trait SecretsSource: Send + Sync {
    async fn load(&self) -> Result<OrchestratorSecrets, StoreError>;
}

/// Fixed secrets, for deployments configured at startup and for tests
pub struct StaticSecrets(pub OrchestratorSecrets);

#[async_trait]
impl SecretsSource for StaticSecrets {
    async fn load(&self) -> Result<OrchestratorSecrets, StoreError> {
        Ok(self.0.clone())
    }
}
