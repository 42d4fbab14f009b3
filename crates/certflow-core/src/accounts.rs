//! Hosting account lookup interface
//!
//! The account catalog lives in the wider panel application; the
//! orchestrator only needs these read paths plus the per-account DNS
//! credentials.

use async_trait::async_trait;
use certflow_dns::AccountDnsCredentials;

use crate::store::StoreError;

/// One hosting account as the classifier sees it
#[derive(Debug, Clone)]
pub struct HostingAccount {
    pub id: String,
    /// The user who owns this account
    pub owner_id: String,
    pub username: String,
    /// Primary domain bound to the account
    pub bound_domain: String,
    pub active: bool,
    pub approved: bool,
    /// Whether the account's DNS zone is managed through the panel,
    /// making automated challenge delegation possible
    pub self_managed_dns: bool,
    /// Panel DNS session credentials, present only for self-managed zones
    pub dns_credentials: Option<AccountDnsCredentials>,
}

/// Read access to the hosting account catalog
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<HostingAccount>, StoreError>;

    /// Account whose bound domain exactly equals `domain`
    async fn find_by_bound_domain(
        &self,
        domain: &str,
    ) -> Result<Option<HostingAccount>, StoreError>;

    /// Account whose bound domain starts with `prefix.`
    async fn find_by_domain_prefix(
        &self,
        prefix: &str,
    ) -> Result<Option<HostingAccount>, StoreError>;

    /// Account whose username contains `fragment`
    async fn find_by_username_fragment(
        &self,
        fragment: &str,
    ) -> Result<Option<HostingAccount>, StoreError>;

    /// All accounts belonging to one user
    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<HostingAccount>, StoreError>;

    /// Whether the user may still be allocated an account (quota)
    async fn slots_available(&self, owner_id: &str) -> Result<bool, StoreError>;
}
