//! File-backed hosting account catalog.
//!
//! Account data is owned by the hosting panel, a separate system; the
//! server loads a snapshot of it at startup from a JSON file, together
//! with the API token table. Suitable for single-node deployments where
//! accounts change rarely; restart to pick up a new snapshot.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use certflow_api::middleware::{ApiToken, AuthState};
use certflow_core::{AccountStore, HostingAccount, StoreError};
use certflow_dns::AccountDnsCredentials;

#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub accounts: Vec<AccountEntry>,
    #[serde(default)]
    pub api_tokens: Vec<TokenEntry>,
}

#[derive(Debug, Deserialize)]
pub struct AccountEntry {
    pub id: String,
    pub owner_id: String,
    pub username: String,
    pub bound_domain: String,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default = "default_true")]
    pub approved: bool,
    #[serde(default)]
    pub self_managed_dns: bool,
    #[serde(default)]
    pub dns_credentials: Option<CredentialsEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsEntry {
    pub panel_endpoint: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct TokenEntry {
    pub token: String,
    pub owner_id: String,
    #[serde(default)]
    pub admin: bool,
}

fn default_true() -> bool {
    true
}

impl CatalogFile {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read account catalog {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Invalid account catalog {}", path.display()))
    }

    pub fn auth_state(&self) -> AuthState {
        let tokens: HashMap<String, ApiToken> = self
            .api_tokens
            .iter()
            .map(|entry| {
                (
                    entry.token.clone(),
                    ApiToken {
                        owner_id: entry.owner_id.clone(),
                        is_admin: entry.admin,
                    },
                )
            })
            .collect();
        AuthState::new(tokens)
    }

    pub fn into_store(self) -> FileAccountStore {
        let accounts = self
            .accounts
            .into_iter()
            .map(|entry| HostingAccount {
                id: entry.id,
                owner_id: entry.owner_id,
                username: entry.username,
                bound_domain: entry.bound_domain,
                active: entry.active,
                approved: entry.approved,
                self_managed_dns: entry.self_managed_dns,
                dns_credentials: entry.dns_credentials.map(|creds| AccountDnsCredentials {
                    panel_endpoint: creds.panel_endpoint,
                    username: creds.username,
                    password: creds.password,
                }),
            })
            .collect();
        FileAccountStore { accounts }
    }
}

/// In-memory catalog serving the snapshot loaded at startup
pub struct FileAccountStore {
    accounts: Vec<HostingAccount>,
}

#[async_trait]
impl AccountStore for FileAccountStore {
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
        let needle = format!("{prefix}.");
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

    async fn find_by_owner(&self, owner_id: &str) -> Result<Vec<HostingAccount>, StoreError> {
        Ok(self
            .accounts
            .iter()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect())
    }

    // Quota enforcement lives in the panel, not the snapshot
    async fn slots_available(&self, _owner_id: &str) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_parses_and_maps_to_accounts() {
        let catalog: CatalogFile = serde_json::from_str(
            r#"{
                "accounts": [
                    {
                        "id": "acct-1",
                        "owner_id": "user-1",
                        "username": "demo1",
                        "bound_domain": "demo1.example-service.com",
                        "self_managed_dns": true,
                        "dns_credentials": {
                            "panel_endpoint": "https://panel.test",
                            "username": "demo1",
                            "password": "secret"
                        }
                    }
                ],
                "api_tokens": [
                    { "token": "tok-1", "owner_id": "user-1" },
                    { "token": "tok-admin", "owner_id": "ops", "admin": true }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(catalog.api_tokens.len(), 2);
        assert!(catalog.api_tokens[1].admin);

        let store = catalog.into_store();
        let account = store.accounts.first().unwrap();
        assert!(account.active, "active defaults to true");
        assert!(account.approved, "approved defaults to true");
        assert!(account.dns_credentials.is_some());
    }
}
