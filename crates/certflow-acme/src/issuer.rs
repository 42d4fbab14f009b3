//! ACME issuance flow
//!
//! Drives account registration, order creation, the dns-01 challenge,
//! validation polling, and certificate download against either supported
//! CA directory. The actual challenge value is placed through the
//! [`ChallengeInstaller`] seam, since where the TXT record lives depends on
//! whether the domain's DNS is automated.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use instant_acme::{
    Account, AuthorizationStatus, ChallengeType, Identifier, NewAccount, NewOrder, OrderStatus,
    RetryPolicy,
};
use tracing::{debug, info};

use crate::error::IssuerError;
use crate::provider::{AcmeEnvironment, CaProvider};

/// How long to wait for the CA to validate the challenge and sign
const ORDER_TIMEOUT: Duration = Duration::from_secs(120);

/// Initial delay between order status polls
const POLL_INITIAL_DELAY: Duration = Duration::from_secs(2);

/// Callback receiving timestamped human-readable progress lines.
///
/// Issuance can take tens of seconds; the orchestrator surfaces these
/// lines to the operator while the background task runs.
pub type ProgressLog = Arc<dyn Fn(String) + Send + Sync>;

/// One issuance attempt, fully specified at request-creation time
#[derive(Debug, Clone)]
pub struct IssueOrder {
    pub domain: String,
    pub provider: CaProvider,
    pub environment: AcmeEnvironment,
    pub contact_email: String,
}

/// The issued chain, split for storage
#[derive(Debug, Clone)]
pub struct IssuedCertificate {
    /// Leaf certificate, PEM
    pub certificate: String,
    /// Private key, PEM (secret)
    pub private_key: String,
    /// Remainder of the chain (intermediates), PEM
    pub ca_certificate: String,
}

/// Places the CA-supplied dns-01 value where the CA will find it
#[async_trait]
pub trait ChallengeInstaller: Send + Sync {
    /// Make `value` resolvable for `_acme-challenge.<domain>` and return
    /// once it should be visible to the CA's resolvers
    async fn install(&self, domain: &str, value: &str) -> Result<(), IssuerError>;

    /// Best-effort cleanup after the attempt, success or failure
    async fn cleanup(&self, domain: &str);
}

/// Certificate issuance behind a mockable seam
#[async_trait]
pub trait CertificateIssuer: Send + Sync {
    async fn issue(
        &self,
        order: &IssueOrder,
        installer: &dyn ChallengeInstaller,
        progress: Option<ProgressLog>,
    ) -> Result<IssuedCertificate, IssuerError>;
}

/// Real issuer speaking ACME via instant-acme
pub struct AcmeIssuer {
    order_timeout: Duration,
}

impl AcmeIssuer {
    pub fn new() -> Self {
        Self {
            order_timeout: ORDER_TIMEOUT,
        }
    }

    pub fn with_order_timeout(order_timeout: Duration) -> Self {
        Self { order_timeout }
    }

    async fn run_exchange(
        &self,
        issue_order: &IssueOrder,
        installer: &dyn ChallengeInstaller,
        progress: &Option<ProgressLog>,
    ) -> Result<IssuedCertificate, IssuerError> {
        let directory = issue_order
            .provider
            .directory_url(issue_order.environment)
            .to_owned();

        report(
            progress,
            format!(
                "Registering account with {}",
                issue_order.provider.display_name()
            ),
        );

        let (account, _credentials) = Account::builder()
            .map_err(|e| IssuerError::AccountRegistration(e.to_string()))?
            .create(
                &NewAccount {
                    contact: &[&format!("mailto:{}", issue_order.contact_email)],
                    terms_of_service_agreed: true,
                    only_return_existing: false,
                },
                directory,
                None,
            )
            .await
            .map_err(|e| IssuerError::AccountRegistration(e.to_string()))?;

        report(
            progress,
            format!("Creating order for {}", issue_order.domain),
        );

        let identifiers = [Identifier::Dns(issue_order.domain.clone())];
        let mut order = account
            .new_order(&NewOrder::new(&identifiers))
            .await
            .map_err(|e| IssuerError::OrderCreation(e.to_string()))?;

        // Authorization handles borrow the order; keep this scope tight so
        // the later status polls can take it again.
        {
            let mut authorizations = order.authorizations();
            while let Some(result) = authorizations.next().await {
                let mut authz = result.map_err(|e| {
                    IssuerError::OrderCreation(format!("Failed to get authorization: {}", e))
                })?;

                if authz.status == AuthorizationStatus::Valid {
                    debug!(domain = %issue_order.domain, "Authorization already valid");
                    continue;
                }

                let mut challenge = authz
                    .challenge(ChallengeType::Dns01)
                    .ok_or_else(|| IssuerError::NoDns01Challenge(issue_order.domain.clone()))?;

                let key_authorization = challenge.key_authorization();
                let dns_value = key_authorization.dns_value();

                report(progress, "Installing dns-01 challenge record".to_string());
                installer.install(&issue_order.domain, &dns_value).await?;

                report(progress, "Submitting challenge for validation".to_string());
                challenge.set_ready().await.map_err(|e| {
                    IssuerError::ChallengeRejected {
                        domain: issue_order.domain.clone(),
                        message: e.to_string(),
                    }
                })?;
            }
        }

        report(progress, "Waiting for CA validation".to_string());

        let retry_policy = RetryPolicy::new()
            .timeout(self.order_timeout)
            .initial_delay(POLL_INITIAL_DELAY);

        let status = order
            .poll_ready(&retry_policy)
            .await
            .map_err(|e| IssuerError::Timeout(format!("order did not become ready: {}", e)))?;

        match status {
            OrderStatus::Ready | OrderStatus::Valid => {}
            other => {
                return Err(IssuerError::ChallengeRejected {
                    domain: issue_order.domain.clone(),
                    message: format!("order ended in status {:?}", other),
                });
            }
        }

        report(progress, "Finalizing order".to_string());

        let private_key = order
            .finalize()
            .await
            .map_err(|e| IssuerError::Finalization(e.to_string()))?;

        let chain = order
            .poll_certificate(&retry_policy)
            .await
            .map_err(|e| IssuerError::Finalization(format!("certificate download: {}", e)))?;

        let (certificate, ca_certificate) = split_pem_chain(&chain);

        info!(
            domain = %issue_order.domain,
            provider = %issue_order.provider,
            "Certificate issued"
        );
        report(progress, "Certificate issued".to_string());

        Ok(IssuedCertificate {
            certificate,
            private_key,
            ca_certificate,
        })
    }
}

impl Default for AcmeIssuer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CertificateIssuer for AcmeIssuer {
    async fn issue(
        &self,
        order: &IssueOrder,
        installer: &dyn ChallengeInstaller,
        progress: Option<ProgressLog>,
    ) -> Result<IssuedCertificate, IssuerError> {
        let result = self.run_exchange(order, installer, &progress).await;
        // The challenge record is per-attempt state either way
        installer.cleanup(&order.domain).await;
        result
    }
}

/// Emit a timestamped progress line if a sink is attached
fn report(progress: &Option<ProgressLog>, line: String) {
    if let Some(sink) = progress {
        let stamped = format!("[{}] {}", chrono::Utc::now().format("%Y-%m-%d %H:%M:%S"), line);
        sink(stamped);
    }
}

/// Split a PEM chain into leaf and remaining CA certificates
fn split_pem_chain(chain: &str) -> (String, String) {
    const END_MARKER: &str = "-----END CERTIFICATE-----";

    match chain.find(END_MARKER) {
        Some(pos) => {
            let split = pos + END_MARKER.len();
            let leaf = chain[..split].trim_start().to_string();
            let rest = chain[split..].trim_start().to_string();
            (leaf, rest)
        }
        None => (chain.to_string(), String::new()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FAKE_CHAIN: &str = "-----BEGIN CERTIFICATE-----\nleafdata\n-----END CERTIFICATE-----\n-----BEGIN CERTIFICATE-----\ncadata\n-----END CERTIFICATE-----\n";

    #[test]
    fn test_split_pem_chain() {
        let (leaf, ca) = split_pem_chain(FAKE_CHAIN);
        assert!(leaf.contains("leafdata"));
        assert!(!leaf.contains("cadata"));
        assert!(ca.contains("cadata"));
    }

    #[test]
    fn test_split_pem_chain_single_certificate() {
        let single = "-----BEGIN CERTIFICATE-----\nleafdata\n-----END CERTIFICATE-----\n";
        let (leaf, ca) = split_pem_chain(single);
        assert!(leaf.contains("leafdata"));
        assert!(ca.trim().is_empty());
    }

    #[test]
    fn test_progress_lines_are_timestamped() {
        let lines = Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = {
            let lines = lines.clone();
            Some(Arc::new(move |line: String| {
                lines.lock().unwrap().push(line);
            }) as ProgressLog)
        };

        report(&sink, "Creating order".to_string());

        let captured = lines.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert!(captured[0].starts_with('['));
        assert!(captured[0].ends_with("Creating order"));
    }
}
