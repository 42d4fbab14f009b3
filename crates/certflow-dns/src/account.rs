//! Per-hosting-account DNS provider
//!
//! Unlike the intermediate authority, the customer's zone is managed
//! through the hosting panel, which requires an authenticated session
//! scoped to one account. The session handshake is two independent network
//! steps (credential login, then a DNS-scope grant) and the session must be
//! released on every exit path; all public operations here acquire, use,
//! and release it within one synchronous section.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::credentials::AccountDnsCredentials;
use crate::error::{DnsError, SessionStep};

/// Timeout for a single panel API call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// CNAME operations on one hosting account's zone
#[async_trait]
pub trait AccountDnsProvider: Send + Sync {
    /// Whether a record with this source label already exists in the zone
    async fn has_record(&self, label: &str, zone: &str) -> Result<bool, DnsError>;

    /// Create a CNAME from `label.zone` to `target`. Idempotent: an
    /// existing record with the same label is treated as success.
    async fn create_cname(&self, label: &str, zone: &str, target: &str) -> Result<(), DnsError>;

    /// Delete the CNAME with this source label, if present
    async fn delete_cname(&self, label: &str) -> Result<(), DnsError>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct LoginResponse {
    session_token: String,
}

#[derive(Deserialize)]
struct GrantResponse {
    dns_token: String,
}

#[derive(Serialize)]
struct CreateCnameRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    zone: &'a str,
    target: &'a str,
}

#[derive(Debug, Deserialize)]
struct PanelRecord {
    id: String,
    name: String,
    #[serde(rename = "type")]
    record_type: String,
}

#[derive(Deserialize)]
struct RecordsResponse {
    records: Vec<PanelRecord>,
}

/// An authenticated, DNS-scoped panel session
struct PanelSession {
    dns_token: String,
}

/// Panel API client for one hosting account's DNS zone
pub struct PanelDnsClient {
    client: Client,
    credentials: AccountDnsCredentials,
}

impl PanelDnsClient {
    pub fn new(credentials: AccountDnsCredentials) -> Result<Self, DnsError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DnsError::Api(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.credentials.panel_endpoint, path)
    }

    /// Two-step session handshake. Each step fails with its own
    /// attribution so the operator can tell the session layer apart from
    /// the DNS operation.
    async fn open_session(&self) -> Result<PanelSession, DnsError> {
        let response = self
            .client
            .post(self.url("/api/login"))
            .json(&LoginRequest {
                username: &self.credentials.username,
                password: &self.credentials.password,
            })
            .send()
            .await
            .map_err(|e| DnsError::Session {
                step: SessionStep::Login,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DnsError::Session {
                step: SessionStep::Login,
                message: format!("HTTP {}", response.status()),
            });
        }

        let login: LoginResponse = response.json().await.map_err(|e| DnsError::Session {
            step: SessionStep::Login,
            message: format!("malformed login response: {}", e),
        })?;

        let response = self
            .client
            .post(self.url("/api/dns/session"))
            .bearer_auth(&login.session_token)
            .send()
            .await
            .map_err(|e| DnsError::Session {
                step: SessionStep::DnsGrant,
                message: e.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(DnsError::Session {
                step: SessionStep::DnsGrant,
                message: format!("HTTP {}", response.status()),
            });
        }

        let grant: GrantResponse = response.json().await.map_err(|e| DnsError::Session {
            step: SessionStep::DnsGrant,
            message: format!("malformed grant response: {}", e),
        })?;

        debug!(account = %self.credentials.username, "Panel DNS session opened");
        Ok(PanelSession {
            dns_token: grant.dns_token,
        })
    }

    /// Release the session. Failure to log out is logged, never surfaced:
    /// the panel expires stale sessions on its own.
    async fn close_session(&self, session: PanelSession) {
        let result = self
            .client
            .post(self.url("/api/logout"))
            .bearer_auth(&session.dns_token)
            .send()
            .await;

        match result {
            Ok(response) if response.status().is_success() => {
                debug!(account = %self.credentials.username, "Panel DNS session released");
            }
            Ok(response) => {
                warn!(
                    account = %self.credentials.username,
                    status = %response.status(),
                    "Panel {} returned an error",
                    SessionStep::Logout
                );
            }
            Err(e) => {
                warn!(account = %self.credentials.username, error = %e, "Panel logout failed");
            }
        }
    }

    async fn list_records(&self, session: &PanelSession) -> Result<Vec<PanelRecord>, DnsError> {
        let response = self
            .client
            .get(self.url("/api/dns/records"))
            .bearer_auth(&session.dns_token)
            .send()
            .await
            .map_err(|e| DnsError::Api(format!("Record listing failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(DnsError::Api(format!(
                "Record listing failed: HTTP {}",
                response.status()
            )));
        }

        let parsed: RecordsResponse = response
            .json()
            .await
            .map_err(|e| DnsError::Api(format!("Malformed records response: {}", e)))?;

        Ok(parsed.records)
    }

    async fn has_record_in(&self, session: &PanelSession, label: &str) -> Result<bool, DnsError> {
        let records = self.list_records(session).await?;
        Ok(records.iter().any(|r| r.name == label))
    }

    async fn create_cname_in(
        &self,
        session: &PanelSession,
        label: &str,
        zone: &str,
        target: &str,
    ) -> Result<(), DnsError> {
        if self.has_record_in(session, label).await? {
            debug!(label = %label, zone = %zone, "CNAME already present, skipping create");
            return Ok(());
        }

        let response = self
            .client
            .post(self.url("/api/dns/records"))
            .bearer_auth(&session.dns_token)
            .json(&CreateCnameRequest {
                record_type: "CNAME",
                name: label,
                zone,
                target,
            })
            .send()
            .await
            .map_err(|e| DnsError::Api(format!("CNAME create failed: {}", e)))?;

        match response.status() {
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let body = response.text().await.unwrap_or_default();
                Err(DnsError::InvalidRecord {
                    name: label.to_string(),
                    reason: body,
                })
            }
            status if !status.is_success() => Err(DnsError::RecordCreation {
                kind: "CNAME",
                name: label.to_string(),
                message: format!("HTTP {}", status),
            }),
            _ => {
                info!(label = %label, zone = %zone, target = %target, "Account CNAME created");
                Ok(())
            }
        }
    }

    async fn delete_cname_in(&self, session: &PanelSession, label: &str) -> Result<(), DnsError> {
        let records = self.list_records(session).await?;
        let Some(record) = records
            .iter()
            .find(|r| r.name == label && r.record_type == "CNAME")
        else {
            debug!(label = %label, "Account CNAME already gone");
            return Ok(());
        };

        let response = self
            .client
            .delete(self.url(&format!("/api/dns/records/{}", record.id)))
            .bearer_auth(&session.dns_token)
            .send()
            .await
            .map_err(|e| DnsError::Api(format!("CNAME delete failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(label = %label, "Account CNAME already gone");
                Ok(())
            }
            status if !status.is_success() => Err(DnsError::RecordDeletion {
                record_id: record.id.clone(),
                message: format!("HTTP {}", status),
            }),
            _ => {
                info!(label = %label, "Account CNAME deleted");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl AccountDnsProvider for PanelDnsClient {
    async fn has_record(&self, label: &str, _zone: &str) -> Result<bool, DnsError> {
        let session = self.open_session().await?;
        let result = self.has_record_in(&session, label).await;
        self.close_session(session).await;
        result
    }

    async fn create_cname(&self, label: &str, zone: &str, target: &str) -> Result<(), DnsError> {
        let session = self.open_session().await?;
        let result = self.create_cname_in(&session, label, zone, target).await;
        self.close_session(session).await;
        result
    }

    async fn delete_cname(&self, label: &str) -> Result<(), DnsError> {
        let session = self.open_session().await?;
        let result = self.delete_cname_in(&session, label).await;
        self.close_session(session).await;
        result
    }
}

impl std::fmt::Debug for PanelDnsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PanelDnsClient")
            .field("credentials", &self.credentials)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_panel_endpoint() {
        let client = PanelDnsClient::new(AccountDnsCredentials {
            panel_endpoint: "https://panel.example-host.com".to_string(),
            username: "demo1".to_string(),
            password: "pw".to_string(),
        })
        .unwrap();

        assert_eq!(
            client.url("/api/dns/records"),
            "https://panel.example-host.com/api/dns/records"
        );
    }

    #[test]
    fn test_cname_request_wire_shape() {
        let body = CreateCnameRequest {
            record_type: "CNAME",
            name: "_acme-challenge",
            zone: "demo1.example-service.com",
            target: "_acme-challenge.demo1.acme-proxy.example.net",
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "CNAME");
        assert_eq!(json["name"], "_acme-challenge");
        assert_eq!(
            json["target"],
            "_acme-challenge.demo1.acme-proxy.example.net"
        );
    }
}
