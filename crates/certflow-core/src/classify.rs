//! Domain classification
//!
//! Decides whether a requested domain is a managed sub-domain of the
//! service or a customer-owned custom domain, and resolves which hosting
//! account is responsible for its DNS delegation. Pure lookup over the
//! account catalog; no side effects.

use thiserror::Error;
use tracing::debug;

use crate::accounts::{AccountStore, HostingAccount};
use crate::request::DomainType;
use crate::store::StoreError;

/// Classification failures, each mapping to a distinct user-actionable
/// error code
#[derive(Debug, Error)]
pub enum ClassifyError {
    /// Account-count quota reached; the user cannot be allocated a slot
    #[error("No hosting slot available for this user")]
    QuotaExceeded,

    /// No matching account, and quota is not the issue
    #[error("A hosting account is required for domain '{0}'")]
    HostingRequired(String),

    /// A matching account exists but is not active
    #[error("The hosting account for '{0}' is not active")]
    HostingNotActive(String),

    /// A matching account exists but has not been approved yet
    #[error("The hosting account for '{0}' is awaiting approval")]
    ApprovalRequired(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of classifying a domain: the matching rules outcome plus the
/// orthogonal "is DNS automatable" capability bit
#[derive(Debug, Clone)]
pub struct Classification {
    pub domain_type: DomainType,
    /// The hosting account bound to this request
    pub account: HostingAccount,
    /// Label sequence between the requested domain and the matched
    /// service domain; present only for sub-domains
    pub prefix: Option<String>,
    /// Whether both DNS halves can be provisioned automatically. Derived
    /// from account capability, not from the domain type alone.
    pub dns_automatable: bool,
}

/// Classifies domains against the configured service domain catalog
#[derive(Debug, Clone)]
pub struct DomainClassifier {
    service_domains: Vec<String>,
}

impl DomainClassifier {
    pub fn new(service_domains: Vec<String>) -> Self {
        Self { service_domains }
    }

    /// If `domain` is `<prefix>.<service-domain>`, return the prefix and
    /// the matched service domain
    pub fn service_match(&self, domain: &str) -> Option<(String, String)> {
        for service_domain in &self.service_domains {
            if let Some(prefix) = domain.strip_suffix(&format!(".{}", service_domain)) {
                if !prefix.is_empty() {
                    return Some((prefix.to_string(), service_domain.clone()));
                }
            }
        }
        None
    }

    /// Classify `domain` for the requesting user.
    ///
    /// Sub-domain account resolution tries, in order: an account bound to
    /// the exact domain, an account whose bound domain starts with
    /// `prefix.`, then an account whose username contains the prefix.
    /// Custom domains bind only accounts owned by the requester.
    pub async fn classify(
        &self,
        accounts: &dyn AccountStore,
        domain: &str,
        requesting_owner_id: &str,
    ) -> Result<Classification, ClassifyError> {
        if let Some((prefix, service_domain)) = self.service_match(domain) {
            debug!(domain = %domain, service_domain = %service_domain, prefix = %prefix, "Domain matches service domain");
            return self
                .resolve_subdomain(accounts, domain, requesting_owner_id, prefix)
                .await;
        }

        self.resolve_custom(accounts, domain, requesting_owner_id)
            .await
    }

    async fn resolve_subdomain(
        &self,
        accounts: &dyn AccountStore,
        domain: &str,
        requesting_owner_id: &str,
        prefix: String,
    ) -> Result<Classification, ClassifyError> {
        let account = match accounts.find_by_bound_domain(domain).await? {
            Some(account) => account,
            None => match accounts.find_by_domain_prefix(&prefix).await? {
                Some(account) => account,
                None => match accounts.find_by_username_fragment(&prefix).await? {
                    Some(account) => account,
                    None => {
                        return Err(self
                            .no_account_error(accounts, domain, requesting_owner_id)
                            .await?);
                    }
                },
            },
        };

        check_account_usable(&account, domain)?;

        Ok(Classification {
            domain_type: DomainType::Subdomain,
            account,
            prefix: Some(prefix),
            // Sub-domains live on zones the panel manages
            dns_automatable: true,
        })
    }

    async fn resolve_custom(
        &self,
        accounts: &dyn AccountStore,
        domain: &str,
        requesting_owner_id: &str,
    ) -> Result<Classification, ClassifyError> {
        let owned = accounts.find_by_owner(requesting_owner_id).await?;

        if owned.is_empty() {
            return Err(self
                .no_account_error(accounts, domain, requesting_owner_id)
                .await?);
        }

        // An account hosting this exact domain with panel-managed DNS makes
        // the custom domain automatable.
        if let Some(account) = owned
            .iter()
            .find(|a| a.bound_domain == domain && a.self_managed_dns && a.active && a.approved)
        {
            return Ok(Classification {
                domain_type: DomainType::Custom,
                account: account.clone(),
                prefix: None,
                dns_automatable: true,
            });
        }

        // Otherwise any usable account of the requester may be bound, but
        // the operator must place the challenge record themselves.
        if let Some(account) = owned.iter().find(|a| a.active && a.approved) {
            return Ok(Classification {
                domain_type: DomainType::Custom,
                account: account.clone(),
                prefix: None,
                dns_automatable: false,
            });
        }

        if owned.iter().any(|a| a.active) {
            return Err(ClassifyError::ApprovalRequired(domain.to_string()));
        }
        Err(ClassifyError::HostingNotActive(domain.to_string()))
    }

    /// "No slot available" (quota) and "hosting required" are distinct
    /// outcomes and must surface as such
    async fn no_account_error(
        &self,
        accounts: &dyn AccountStore,
        domain: &str,
        requesting_owner_id: &str,
    ) -> Result<ClassifyError, ClassifyError> {
        if !accounts.slots_available(requesting_owner_id).await? {
            Ok(ClassifyError::QuotaExceeded)
        } else {
            Ok(ClassifyError::HostingRequired(domain.to_string()))
        }
    }
}

fn check_account_usable(account: &HostingAccount, domain: &str) -> Result<(), ClassifyError> {
    if !account.active {
        return Err(ClassifyError::HostingNotActive(domain.to_string()));
    }
    if !account.approved {
        return Err(ClassifyError::ApprovalRequired(domain.to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    /// In-memory account catalog for classifier tests
    struct FakeAccounts {
        accounts: Vec<HostingAccount>,
        slots: bool,
    }

    impl FakeAccounts {
        fn new(accounts: Vec<HostingAccount>) -> Self {
            Self {
                accounts,
                slots: true,
            }
        }

        fn without_slots(mut self) -> Self {
            self.slots = false;
            self
        }
    }

    #[async_trait]
    impl AccountStore for FakeAccounts {
        async fn find_by_id(&self, id: &str) -> Result<Option<HostingAccount>, StoreError> {
            Ok(self.accounts.iter().find(|a| a.id == id).cloned())
        }

        async fn find_by_bound_domain(
            &self,
            domain: &str,
        ) -> Result<Option<HostingAccount>, StoreError> {
            Ok(self
                .accounts
                .iter()
                .find(|a| a.bound_domain == domain)
                .cloned())
        }

        async fn find_by_domain_prefix(
            &self,
            prefix: &str,
        ) -> Result<Option<HostingAccount>, StoreError> {
            let needle = format!("{}.", prefix);
            Ok(self
                .accounts
                .iter()
                .find(|a| a.bound_domain.starts_with(&needle))
                .cloned())
        }

        async fn find_by_username_fragment(
            &self,
            fragment: &str,
        ) -> Result<Option<HostingAccount>, StoreError> {
            Ok(self
                .accounts
                .iter()
                .find(|a| a.username.contains(fragment))
                .cloned())
        }

        async fn find_by_owner(
            &self,
            owner_id: &str,
        ) -> Result<Vec<HostingAccount>, StoreError> {
            Ok(self
                .accounts
                .iter()
                .filter(|a| a.owner_id == owner_id)
                .cloned()
                .collect())
        }

        async fn slots_available(&self, _owner_id: &str) -> Result<bool, StoreError> {
            Ok(self.slots)
        }
    }

    fn account(id: &str, owner: &str, username: &str, domain: &str) -> HostingAccount {
        HostingAccount {
            id: id.to_string(),
            owner_id: owner.to_string(),
            username: username.to_string(),
            bound_domain: domain.to_string(),
            active: true,
            approved: true,
            self_managed_dns: false,
            dns_credentials: None,
        }
    }

    fn classifier() -> DomainClassifier {
        DomainClassifier::new(vec!["example-service.com".to_string()])
    }

    #[test]
    fn test_service_match_extracts_prefix() {
        let c = classifier();
        assert_eq!(
            c.service_match("demo1.example-service.com"),
            Some(("demo1".to_string(), "example-service.com".to_string()))
        );
        assert_eq!(
            c.service_match("a.b.example-service.com"),
            Some(("a.b".to_string(), "example-service.com".to_string()))
        );
        assert_eq!(c.service_match("customer-owned.com"), None);
        // The service domain itself is not a sub-domain
        assert_eq!(c.service_match("example-service.com"), None);
    }

    #[tokio::test]
    async fn test_subdomain_resolved_by_exact_bound_domain() {
        let accounts = FakeAccounts::new(vec![account(
            "acc-1",
            "user-1",
            "demo1",
            "demo1.example-service.com",
        )]);

        let result = classifier()
            .classify(&accounts, "demo1.example-service.com", "user-1")
            .await
            .unwrap();

        assert_eq!(result.domain_type, DomainType::Subdomain);
        assert_eq!(result.prefix.as_deref(), Some("demo1"));
        assert_eq!(result.account.id, "acc-1");
        assert!(result.dns_automatable);
    }

    #[tokio::test]
    async fn test_subdomain_resolution_order() {
        // Exact bound-domain match wins over prefix and username matches
        let accounts = FakeAccounts::new(vec![
            account("by-username", "u", "demo1-fan", "other.com"),
            account("by-prefix", "u", "someone", "demo1.hosting.net"),
            account("by-domain", "u", "nobody", "demo1.example-service.com"),
        ]);

        let result = classifier()
            .classify(&accounts, "demo1.example-service.com", "u")
            .await
            .unwrap();
        assert_eq!(result.account.id, "by-domain");

        // Without an exact match, the prefix match wins over username
        let accounts = FakeAccounts::new(vec![
            account("by-username", "u", "demo1-fan", "other.com"),
            account("by-prefix", "u", "someone", "demo1.hosting.net"),
        ]);

        let result = classifier()
            .classify(&accounts, "demo1.example-service.com", "u")
            .await
            .unwrap();
        assert_eq!(result.account.id, "by-prefix");

        // Username fragment is the last resort
        let accounts = FakeAccounts::new(vec![account("by-username", "u", "demo1-fan", "other.com")]);

        let result = classifier()
            .classify(&accounts, "demo1.example-service.com", "u")
            .await
            .unwrap();
        assert_eq!(result.account.id, "by-username");
    }

    #[tokio::test]
    async fn test_subdomain_error_codes_are_distinct() {
        // No account at all, slots free
        let accounts = FakeAccounts::new(vec![]);
        let err = classifier()
            .classify(&accounts, "demo1.example-service.com", "u")
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifyError::HostingRequired(_)));

        // No account, quota reached
        let accounts = FakeAccounts::new(vec![]).without_slots();
        let err = classifier()
            .classify(&accounts, "demo1.example-service.com", "u")
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifyError::QuotaExceeded));

        // Matching account, not active
        let mut inactive = account("a", "u", "demo1", "demo1.example-service.com");
        inactive.active = false;
        let accounts = FakeAccounts::new(vec![inactive]);
        let err = classifier()
            .classify(&accounts, "demo1.example-service.com", "u")
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifyError::HostingNotActive(_)));

        // Matching account, active but unapproved
        let mut unapproved = account("a", "u", "demo1", "demo1.example-service.com");
        unapproved.approved = false;
        let accounts = FakeAccounts::new(vec![unapproved]);
        let err = classifier()
            .classify(&accounts, "demo1.example-service.com", "u")
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifyError::ApprovalRequired(_)));
    }

    #[tokio::test]
    async fn test_custom_domain_with_self_managed_dns_is_automatable() {
        let mut hosting = account("acc-9", "user-1", "customer", "customer-owned.com");
        hosting.self_managed_dns = true;
        let accounts = FakeAccounts::new(vec![hosting]);

        let result = classifier()
            .classify(&accounts, "customer-owned.com", "user-1")
            .await
            .unwrap();

        assert_eq!(result.domain_type, DomainType::Custom);
        assert!(result.prefix.is_none());
        assert!(result.dns_automatable);
    }

    #[tokio::test]
    async fn test_custom_domain_without_self_managed_dns_binds_but_is_manual() {
        let accounts = FakeAccounts::new(vec![account(
            "acc-9",
            "user-1",
            "customer",
            "other-site.com",
        )]);

        let result = classifier()
            .classify(&accounts, "customer-owned.com", "user-1")
            .await
            .unwrap();

        assert_eq!(result.domain_type, DomainType::Custom);
        assert_eq!(result.account.id, "acc-9");
        assert!(!result.dns_automatable);
    }

    #[tokio::test]
    async fn test_custom_domain_ignores_other_users_accounts() {
        let accounts = FakeAccounts::new(vec![account(
            "acc-9",
            "someone-else",
            "customer",
            "customer-owned.com",
        )]);

        let err = classifier()
            .classify(&accounts, "customer-owned.com", "user-1")
            .await
            .unwrap_err();
        assert!(matches!(err, ClassifyError::HostingRequired(_)));
    }
}
