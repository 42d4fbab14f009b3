//! Lifecycle orchestrator
//!
//! Sequences classification, DNS provisioning, propagation verification,
//! and issuance for each certificate request. Every transition is written
//! to durable storage before the next step begins; a crash mid-flow leaves
//! the record in its last completed state, recoverable via the manual
//! verify/issue/retry operations. Status preconditions, not locks,
//! arbitrate between concurrent manual and background transitions.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use rand::distributions::Alphanumeric;
use rand::Rng;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use certflow_acme::{
    CaProvider, CertificateIssuer, ChallengeInstaller, IssueOrder, IssuedCertificate, IssuerError,
    ProgressLog,
};
use certflow_dns::{
    challenge_record_fqdn, intermediate_record_name, AccountDnsCredentials, AccountDnsProvider,
    DnsError, IntermediateCredentials, IntermediateDnsProvider, VerificationPoller,
    ACME_CHALLENGE_LABEL,
};

use crate::accounts::{AccountStore, HostingAccount};
use crate::classify::DomainClassifier;
use crate::error::OrchestratorError;
use crate::log_buffer::IssuanceLogBuffer;
use crate::request::{CertificateRequest, RequestStatus};
use crate::secrets::SecretsSource;
use crate::store::RequestStore;
use crate::tasks::TaskRegistry;

/// Builds an intermediate provider from freshly-loaded credentials
pub type IntermediateProviderFactory = Arc<
    dyn Fn(&IntermediateCredentials) -> Result<Arc<dyn IntermediateDnsProvider>, DnsError>
        + Send
        + Sync,
>;

/// Builds a panel DNS client scoped to one hosting account
pub type AccountProviderFactory = Arc<
    dyn Fn(&AccountDnsCredentials) -> Result<Arc<dyn AccountDnsProvider>, DnsError> + Send + Sync,
>;

/// Seam over the propagation check so tests can script visibility
#[async_trait]
pub trait ChallengeVerifier: Send + Sync {
    async fn verify(
        &self,
        domain: &str,
        expected_value: &str,
        cname_hint: Option<&str>,
    ) -> Result<bool, DnsError>;
}

#[async_trait]
impl ChallengeVerifier for VerificationPoller {
    async fn verify(
        &self,
        domain: &str,
        expected_value: &str,
        cname_hint: Option<&str>,
    ) -> Result<bool, DnsError> {
        VerificationPoller::verify(self, domain, expected_value, cname_hint).await
    }
}

/// Wait/retry schedule for propagation polling.
///
/// The defaults mirror the original panel behavior: a fixed 30 second
/// wait, then at most one more poll after another fixed wait, with no
/// backoff.
#[derive(Debug, Clone)]
pub struct VerificationPolicy {
    /// Delay before the first poll, allowing propagation to start
    pub initial_delay: Duration,
    /// Delay between polls
    pub retry_delay: Duration,
    /// Total poll attempts before giving up and requiring manual verify
    pub max_attempts: u32,
}

impl Default for VerificationPolicy {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(30),
            retry_delay: Duration::from_secs(30),
            max_attempts: 2,
        }
    }
}

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Operator-controlled domains whose sub-domains are managed
    pub service_domains: Vec<String>,
    pub verification: VerificationPolicy,
    /// Lines retained per in-flight request log
    pub log_capacity: usize,
}

impl OrchestratorConfig {
    pub fn new(service_domains: Vec<String>) -> Self {
        Self {
            service_domains,
            verification: VerificationPolicy::default(),
            log_capacity: 200,
        }
    }
}

/// TXT instructions returned for domains whose DNS the operator must
/// provision themselves
#[derive(Debug, Clone)]
pub struct ManualTxtRecord {
    pub name: String,
    pub value: String,
}

/// Result of a create call
#[derive(Debug, Clone)]
pub struct CreateOutcome {
    pub request: CertificateRequest,
    /// Present only for non-automatable domains
    pub manual_txt_record: Option<ManualTxtRecord>,
}

/// The coordinating component tying the DNS providers, the verification
/// poller, and the certificate issuer together
pub struct Orchestrator {
    config: OrchestratorConfig,
    classifier: DomainClassifier,
    accounts: Arc<dyn AccountStore>,
    requests: Arc<dyn RequestStore>,
    secrets: Arc<dyn SecretsSource>,
    intermediate_factory: IntermediateProviderFactory,
    account_factory: AccountProviderFactory,
    verifier: Arc<dyn ChallengeVerifier>,
    issuer: Arc<dyn CertificateIssuer>,
    tasks: TaskRegistry,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: OrchestratorConfig,
        accounts: Arc<dyn AccountStore>,
        requests: Arc<dyn RequestStore>,
        secrets: Arc<dyn SecretsSource>,
        intermediate_factory: IntermediateProviderFactory,
        account_factory: AccountProviderFactory,
        verifier: Arc<dyn ChallengeVerifier>,
        issuer: Arc<dyn CertificateIssuer>,
    ) -> Arc<Self> {
        let classifier = DomainClassifier::new(config.service_domains.clone());
        let tasks = TaskRegistry::new(config.log_capacity);
        Arc::new(Self {
            config,
            classifier,
            accounts,
            requests,
            secrets,
            intermediate_factory,
            account_factory,
            verifier,
            issuer,
            tasks,
        })
    }

    /// Create a certificate request for `domain`.
    ///
    /// Automatable domains get both challenge records provisioned
    /// synchronously and enter `Verifying` with a detached background
    /// verify-and-issue task. Non-automatable domains stay in
    /// `PendingVerification` and the caller receives the TXT record the
    /// operator must install.
    pub async fn create(
        self: &Arc<Self>,
        domain: &str,
        provider: CaProvider,
        requesting_owner_id: &str,
    ) -> Result<CreateOutcome, OrchestratorError> {
        if self.requests.find_active_by_domain(domain).await?.is_some() {
            return Err(OrchestratorError::DuplicateRequest {
                domain: domain.to_string(),
            });
        }

        let classification = self
            .classifier
            .classify(self.accounts.as_ref(), domain, requesting_owner_id)
            .await?;

        let mut request = CertificateRequest {
            id: Uuid::new_v4().to_string(),
            domain: domain.to_string(),
            domain_type: classification.domain_type,
            provider,
            owner_account_id: classification.account.id.clone(),
            status: RequestStatus::PendingVerification,
            verification_token: generate_token(),
            challenge_record_name: None,
            challenge_record_target: None,
            intermediate_record_id: None,
            issued_certificate: None,
            private_key: None,
            ca_certificate: None,
            last_error: None,
            retry_count: 0,
            dns_automatable: classification.dns_automatable,
            created_at: Utc::now(),
            verified_at: None,
            issued_at: None,
        };

        if classification.dns_automatable {
            // Provisioning happens before the record exists; any failure
            // here leaves no persisted request and no partial DNS state.
            self.provision_challenge(
                &mut request,
                &classification.account,
                classification.prefix.as_deref(),
            )
            .await?;

            request.status = RequestStatus::Verifying;
            self.requests.insert(&request).await?;
            info!(domain = %domain, request_id = %request.id, "Certificate request created, verification scheduled");

            self.spawn_verify_and_issue(&request);

            Ok(CreateOutcome {
                request,
                manual_txt_record: None,
            })
        } else {
            self.requests.insert(&request).await?;
            info!(domain = %domain, request_id = %request.id, "Certificate request created, awaiting operator DNS setup");

            let manual_txt_record = Some(ManualTxtRecord {
                name: challenge_record_fqdn(domain),
                value: request.verification_token.clone(),
            });
            Ok(CreateOutcome {
                request,
                manual_txt_record,
            })
        }
    }

    /// Operator-triggered single poll, without the propagation wait.
    /// Legal only from `PendingVerification` or `Verifying`.
    pub async fn verify(&self, request_id: &str) -> Result<CertificateRequest, OrchestratorError> {
        let mut request = self.load(request_id).await?;
        match request.status {
            RequestStatus::PendingVerification | RequestStatus::Verifying => {}
            status => {
                return Err(OrchestratorError::Precondition {
                    operation: "verify",
                    status,
                })
            }
        }

        let visible = self
            .verifier
            .verify(
                &request.domain,
                &request.verification_token,
                request.challenge_record_target.as_deref(),
            )
            .await?;

        if visible {
            request = self.mark_verified(request).await?;
        } else {
            request.last_error = Some("challenge record not visible yet".to_string());
            self.requests.update(&request).await?;
        }

        Ok(request)
    }

    /// Drive issuance for a verified request. Legal only from `Verified`;
    /// the entry check makes it safe to call even when a background task
    /// already attempted it.
    pub async fn issue(&self, request_id: &str) -> Result<CertificateRequest, OrchestratorError> {
        self.run_issue(request_id, None).await
    }

    /// Operator retry out of `Failed`: clears the diagnostic, bumps the
    /// retry counter, and re-enters the create flow without re-running
    /// classification.
    pub async fn retry(
        self: &Arc<Self>,
        request_id: &str,
    ) -> Result<CertificateRequest, OrchestratorError> {
        let mut request = self.load(request_id).await?;
        if request.status != RequestStatus::Failed {
            return Err(OrchestratorError::Precondition {
                operation: "retry",
                status: request.status,
            });
        }

        request.status = RequestStatus::PendingVerification;
        request.last_error = None;
        request.retry_count += 1;
        self.requests.update(&request).await?;
        info!(request_id = %request.id, retry_count = request.retry_count, "Certificate request reset for retry");

        if request.dns_automatable {
            let account = self
                .accounts
                .find_by_id(&request.owner_account_id)
                .await?
                .ok_or_else(|| {
                    OrchestratorError::AccountNotFound(request.owner_account_id.clone())
                })?;
            let prefix = self
                .classifier
                .service_match(&request.domain)
                .map(|(prefix, _)| prefix);

            self.provision_challenge(&mut request, &account, prefix.as_deref())
                .await?;

            request.status = RequestStatus::Verifying;
            self.requests.update(&request).await?;
            self.spawn_verify_and_issue(&request);
        }

        Ok(request)
    }

    /// Delete a request and tear down its challenge delegation.
    ///
    /// Rejected for `Issuing`/`Issued` (revocation is a separate path).
    /// Teardown runs in reverse creation order, CNAME then TXT, and each
    /// failure is logged without blocking deletion of the record itself.
    pub async fn delete(&self, request_id: &str) -> Result<(), OrchestratorError> {
        let request = self.load(request_id).await?;
        if matches!(
            request.status,
            RequestStatus::Issuing | RequestStatus::Issued
        ) {
            return Err(OrchestratorError::DeleteForbidden(request.status));
        }

        self.tasks.abort(request_id);

        if let Some(record_id) = &request.intermediate_record_id {
            self.teardown_cname(&request).await;

            match self.secrets.load().await {
                Ok(secrets) => match (self.intermediate_factory)(&secrets.intermediate) {
                    Ok(provider) => {
                        if let Err(e) = provider.delete_record(record_id).await {
                            warn!(request_id = %request.id, error = %e, "TXT teardown failed");
                        }
                    }
                    Err(e) => {
                        warn!(request_id = %request.id, error = %e, "Intermediate provider unavailable for teardown")
                    }
                },
                Err(e) => {
                    warn!(request_id = %request.id, error = %e, "Secrets unavailable for teardown")
                }
            }
        }

        self.requests.delete(request_id).await?;
        info!(request_id = %request_id, domain = %request.domain, "Certificate request deleted");
        Ok(())
    }

    pub async fn get(&self, request_id: &str) -> Result<CertificateRequest, OrchestratorError> {
        self.load(request_id).await
    }

    pub async fn list(&self) -> Result<Vec<CertificateRequest>, OrchestratorError> {
        Ok(self.requests.list().await?)
    }

    /// Requests bound to hosting accounts the given user owns
    pub async fn list_for_owner(
        &self,
        owner_id: &str,
    ) -> Result<Vec<CertificateRequest>, OrchestratorError> {
        let accounts = self.accounts.find_by_owner(owner_id).await?;
        let account_ids: std::collections::HashSet<&str> =
            accounts.iter().map(|account| account.id.as_str()).collect();

        Ok(self
            .requests
            .list()
            .await?
            .into_iter()
            .filter(|request| account_ids.contains(request.owner_account_id.as_str()))
            .collect())
    }

    /// Whether `owner_id` owns the hosting account a request is bound to.
    ///
    /// A request whose account has disappeared is owned by nobody.
    pub async fn owns_request(
        &self,
        request_id: &str,
        owner_id: &str,
    ) -> Result<bool, OrchestratorError> {
        let request = self.load(request_id).await?;
        let account = self.accounts.find_by_id(&request.owner_account_id).await?;
        Ok(account.is_some_and(|account| account.owner_id == owner_id))
    }

    /// Tail of the in-flight progress log; empty once the task has
    /// completed and its outcome is persisted
    pub async fn log_tail(
        &self,
        request_id: &str,
        lines: usize,
    ) -> Result<Vec<String>, OrchestratorError> {
        self.load(request_id).await?;
        Ok(self
            .tasks
            .log(request_id)
            .map(|log| log.tail(lines))
            .unwrap_or_default())
    }

    async fn load(&self, request_id: &str) -> Result<CertificateRequest, OrchestratorError> {
        self.requests
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| OrchestratorError::NotFound(request_id.to_string()))
    }

    /// Provision the TXT record on the intermediate authority and the
    /// CNAME on the account zone. If the CNAME fails after the TXT
    /// succeeded, the TXT is deleted before the error is returned;
    /// partial DNS state is never left behind.
    async fn provision_challenge(
        &self,
        request: &mut CertificateRequest,
        account: &HostingAccount,
        prefix: Option<&str>,
    ) -> Result<(), OrchestratorError> {
        let secrets = self.secrets.load().await?;
        let intermediate = (self.intermediate_factory)(&secrets.intermediate)?;

        let namespace = prefix
            .map(str::to_string)
            .unwrap_or_else(|| request.domain.replace('.', "-"));
        let record_name = request
            .challenge_record_name
            .clone()
            .unwrap_or_else(|| intermediate_record_name(&namespace, &secrets.intermediate.zone));

        // A retrying request may still own its TXT record; never create a
        // second one for the same request.
        let (record_id, fresh_txt) = match &request.intermediate_record_id {
            Some(id) => (id.clone(), false),
            None => (
                intermediate
                    .create_txt(&record_name, &request.verification_token)
                    .await?,
                true,
            ),
        };

        let rollback_txt = |reason: &'static str| {
            let intermediate = intermediate.clone();
            let record_id = record_id.clone();
            async move {
                if let Err(e) = intermediate.delete_record(&record_id).await {
                    error!(record_id = %record_id, error = %e, "Failed to roll back TXT record after {}", reason);
                }
            }
        };

        let credentials = match account.dns_credentials.clone() {
            Some(credentials) => credentials,
            None => {
                if fresh_txt {
                    rollback_txt("missing account credentials").await;
                }
                return Err(OrchestratorError::MissingDnsCredentials(account.id.clone()));
            }
        };

        let account_provider = match (self.account_factory)(&credentials) {
            Ok(provider) => provider,
            Err(e) => {
                if fresh_txt {
                    rollback_txt("account provider setup failure").await;
                }
                return Err(e.into());
            }
        };

        if let Err(e) = account_provider
            .create_cname(ACME_CHALLENGE_LABEL, &request.domain, &record_name)
            .await
        {
            if fresh_txt {
                rollback_txt("CNAME provisioning failure").await;
            }
            return Err(e.into());
        }

        request.challenge_record_name = Some(record_name.clone());
        request.challenge_record_target = Some(record_name);
        request.intermediate_record_id = Some(record_id);
        Ok(())
    }

    fn spawn_verify_and_issue(self: &Arc<Self>, request: &CertificateRequest) {
        let orchestrator = Arc::clone(self);
        let request_id = request.id.clone();
        let log = self.tasks.log_for(&request_id);

        let handle = tokio::spawn(async move {
            orchestrator.run_verify_and_issue(&request_id, log).await;
            orchestrator.tasks.complete(&request_id);
        });
        self.tasks.register(&request.id, handle);
    }

    /// Background pipeline: wait, poll, verify, issue. Poll exhaustion is
    /// a soft failure (the request stays `Verifying` with `last_error`
    /// set); issuance failures land in `Failed`. Nothing escapes this
    /// function, so a background error can never strand a request.
    async fn run_verify_and_issue(&self, request_id: &str, log: Arc<IssuanceLogBuffer>) {
        let policy = self.config.verification.clone();

        log_line(
            &log,
            format!(
                "Waiting {}s for DNS propagation",
                policy.initial_delay.as_secs()
            ),
        );
        tokio::time::sleep(policy.initial_delay).await;

        for attempt in 1..=policy.max_attempts {
            let request = match self.requests.find_by_id(request_id).await {
                Ok(Some(request)) => request,
                Ok(None) => {
                    debug!(request_id = %request_id, "Request deleted while verifying");
                    return;
                }
                Err(e) => {
                    error!(request_id = %request_id, error = %e, "Store unavailable in background verify");
                    return;
                }
            };

            // A manual verify (or delete/retry) may have advanced the
            // request; the status check decides, not this task.
            if request.status != RequestStatus::Verifying {
                debug!(request_id = %request_id, status = %request.status, "Request advanced elsewhere, background task ending");
                return;
            }

            log_line(
                &log,
                format!(
                    "Checking DNS propagation (attempt {} of {})",
                    attempt, policy.max_attempts
                ),
            );

            let outcome = self
                .verifier
                .verify(
                    &request.domain,
                    &request.verification_token,
                    request.challenge_record_target.as_deref(),
                )
                .await;

            match outcome {
                Ok(true) => {
                    log_line(&log, "Challenge record verified".to_string());
                    let request = match self.mark_verified(request).await {
                        Ok(request) => request,
                        Err(e) => {
                            error!(request_id = %request_id, error = %e, "Failed to persist verified status");
                            return;
                        }
                    };

                    if let Err(e) = self.run_issue(&request.id, Some(log.clone())).await {
                        // run_issue has already persisted Failed
                        log_line(&log, format!("Issuance failed: {}", e));
                    }
                    return;
                }
                Ok(false) => {
                    self.record_soft_failure(
                        request,
                        format!(
                            "challenge record not visible yet (attempt {} of {})",
                            attempt, policy.max_attempts
                        ),
                    )
                    .await;
                }
                Err(e) => {
                    self.record_soft_failure(request, format!("verification lookup failed: {}", e))
                        .await;
                }
            }

            if attempt < policy.max_attempts {
                log_line(
                    &log,
                    format!("Waiting {}s before next attempt", policy.retry_delay.as_secs()),
                );
                tokio::time::sleep(policy.retry_delay).await;
            }
        }

        log_line(
            &log,
            "DNS propagation not confirmed; manual verification required".to_string(),
        );
    }

    /// Soft failures keep the request in `Verifying`; only the diagnostic
    /// is updated
    async fn record_soft_failure(&self, mut request: CertificateRequest, message: String) {
        warn!(request_id = %request.id, domain = %request.domain, "{}", message);
        request.last_error = Some(message);
        if let Err(e) = self.requests.update(&request).await {
            error!(request_id = %request.id, error = %e, "Failed to record verification diagnostic");
        }
    }

    async fn mark_verified(
        &self,
        mut request: CertificateRequest,
    ) -> Result<CertificateRequest, OrchestratorError> {
        request.status = RequestStatus::Verified;
        request.verified_at = Some(Utc::now());
        request.last_error = None;
        self.requests.update(&request).await?;
        info!(request_id = %request.id, domain = %request.domain, "Challenge verified");
        Ok(request)
    }

    async fn run_issue(
        &self,
        request_id: &str,
        log: Option<Arc<IssuanceLogBuffer>>,
    ) -> Result<CertificateRequest, OrchestratorError> {
        let mut request = self.load(request_id).await?;
        if request.status != RequestStatus::Verified {
            return Err(OrchestratorError::Precondition {
                operation: "issue",
                status: request.status,
            });
        }

        // Durable before the CA exchange starts
        request.status = RequestStatus::Issuing;
        request.last_error = None;
        self.requests.update(&request).await?;

        let log = log.unwrap_or_else(|| self.tasks.log_for(request_id));
        let progress: ProgressLog = {
            let log = log.clone();
            Arc::new(move |line: String| log.push(line))
        };

        match self.perform_issuance(&request, progress).await {
            Ok(issued) => {
                request.status = RequestStatus::Issued;
                request.issued_certificate = Some(issued.certificate);
                request.private_key = Some(issued.private_key);
                request.ca_certificate = Some(issued.ca_certificate);
                request.issued_at = Some(Utc::now());
                request.last_error = None;
                self.requests.update(&request).await?;
                self.tasks.complete(request_id);
                info!(request_id = %request.id, domain = %request.domain, "Certificate issued");
                Ok(request)
            }
            Err(e) => {
                request.status = RequestStatus::Failed;
                request.last_error = Some(e.to_string());
                if let Err(persist_err) = self.requests.update(&request).await {
                    error!(request_id = %request.id, error = %persist_err, "Failed to persist issuance failure");
                }
                self.tasks.complete(request_id);
                Err(e)
            }
        }
    }

    async fn perform_issuance(
        &self,
        request: &CertificateRequest,
        progress: ProgressLog,
    ) -> Result<IssuedCertificate, OrchestratorError> {
        let secrets = self.secrets.load().await?;

        let installer: Box<dyn ChallengeInstaller> = if request.dns_automatable {
            let intermediate = (self.intermediate_factory)(&secrets.intermediate)?;
            let record_name = request.challenge_record_name.clone().ok_or_else(|| {
                OrchestratorError::Issuance {
                    category: "challenge-setup",
                    message: "automated request has no challenge record name".to_string(),
                }
            })?;
            Box::new(DelegatedInstaller {
                provider: intermediate,
                record_name,
                installed: Mutex::new(None),
            })
        } else {
            Box::new(ManualInstaller {
                verifier: self.verifier.clone(),
                policy: self.config.verification.clone(),
                progress: progress.clone(),
            })
        };

        let order = IssueOrder {
            domain: request.domain.clone(),
            provider: request.provider,
            environment: secrets.environment,
            contact_email: secrets.contact_email.clone(),
        };

        self.issuer
            .issue(&order, installer.as_ref(), Some(progress))
            .await
            .map_err(|e| OrchestratorError::Issuance {
                category: e.category(),
                message: e.to_string(),
            })
    }

    /// Best-effort CNAME teardown during delete
    async fn teardown_cname(&self, request: &CertificateRequest) {
        let account = match self.accounts.find_by_id(&request.owner_account_id).await {
            Ok(Some(account)) => account,
            Ok(None) => {
                warn!(request_id = %request.id, "Bound account gone, skipping CNAME teardown");
                return;
            }
            Err(e) => {
                warn!(request_id = %request.id, error = %e, "Account lookup failed during teardown");
                return;
            }
        };

        let Some(credentials) = account.dns_credentials.as_ref() else {
            warn!(request_id = %request.id, "Bound account has no DNS credentials, skipping CNAME teardown");
            return;
        };

        match (self.account_factory)(credentials) {
            Ok(provider) => {
                if let Err(e) = provider.delete_cname(ACME_CHALLENGE_LABEL).await {
                    warn!(request_id = %request.id, error = %e, "CNAME teardown failed");
                }
            }
            Err(e) => {
                warn!(request_id = %request.id, error = %e, "Account provider unavailable for teardown");
            }
        }
    }
}

/// Installs the CA-supplied challenge value on the intermediate zone,
/// where the customer-zone CNAME already points
struct DelegatedInstaller {
    provider: Arc<dyn IntermediateDnsProvider>,
    record_name: String,
    installed: Mutex<Option<String>>,
}

#[async_trait]
impl ChallengeInstaller for DelegatedInstaller {
    async fn install(&self, _domain: &str, value: &str) -> Result<(), IssuerError> {
        let record_id = self
            .provider
            .create_txt(&self.record_name, value)
            .await
            .map_err(|e| IssuerError::ChallengeSetup(e.to_string()))?;
        *self.installed.lock().unwrap_or_else(|e| e.into_inner()) = Some(record_id);
        Ok(())
    }

    async fn cleanup(&self, _domain: &str) {
        let record_id = self
            .installed
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(record_id) = record_id {
            if let Err(e) = self.provider.delete_record(&record_id).await {
                warn!(record_id = %record_id, error = %e, "Challenge record cleanup failed");
            }
        }
    }
}

/// For manual domains the operator places the record; the installer
/// surfaces the required value and waits for it to become visible
struct ManualInstaller {
    verifier: Arc<dyn ChallengeVerifier>,
    policy: VerificationPolicy,
    progress: ProgressLog,
}

#[async_trait]
impl ChallengeInstaller for ManualInstaller {
    async fn install(&self, domain: &str, value: &str) -> Result<(), IssuerError> {
        (self.progress)(format!(
            "Add TXT record {} with value {}",
            challenge_record_fqdn(domain),
            value
        ));

        for _ in 0..self.policy.max_attempts {
            match self.verifier.verify(domain, value, None).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => return Err(IssuerError::ChallengeSetup(e.to_string())),
            }
            tokio::time::sleep(self.policy.retry_delay).await;
        }

        Err(IssuerError::ChallengeSetup(format!(
            "TXT record for {} not visible to resolvers",
            domain
        )))
    }

    async fn cleanup(&self, _domain: &str) {}
}

fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(32)
        .map(char::from)
        .collect()
}

fn log_line(log: &IssuanceLogBuffer, line: String) {
    log.push(format!(
        "[{}] {}",
        Utc::now().format("%Y-%m-%d %H:%M:%S"),
        line
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verification_policy_defaults_match_source_schedule() {
        let policy = VerificationPolicy::default();
        assert_eq!(policy.initial_delay, Duration::from_secs(30));
        assert_eq!(policy.retry_delay, Duration::from_secs(30));
        assert_eq!(policy.max_attempts, 2);
    }

    #[test]
    fn test_generate_token_is_random_and_dns_safe() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 32);
        assert_ne!(a, b);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    }
}
