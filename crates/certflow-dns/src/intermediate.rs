//! Intermediate-authority DNS provider
//!
//! The intermediate authority is an operator-controlled zone behind a
//! stateless token-authenticated API. Challenge TXT records are created
//! here and reached from customer domains via CNAME delegation.
//!
//! `create_txt` does not deduplicate; the orchestrator guarantees a single
//! create per certificate request and owns the returned record id.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::credentials::IntermediateCredentials;
use crate::error::DnsError;
use crate::record::validate_record_name;

/// TTL for challenge records; short so stale values fall out quickly
const CHALLENGE_TTL: u32 = 60;

/// Timeout for a single API call
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Record operations on the intermediate-authority zone
#[async_trait]
pub trait IntermediateDnsProvider: Send + Sync {
    /// Create a TXT record, returning the provider record id needed for
    /// later deletion
    async fn create_txt(&self, name: &str, value: &str) -> Result<String, DnsError>;

    /// Delete a record by id. A record that is already gone is treated as
    /// success and only logged.
    async fn delete_record(&self, record_id: &str) -> Result<(), DnsError>;
}

#[derive(Serialize)]
struct CreateRecordRequest<'a> {
    #[serde(rename = "type")]
    record_type: &'a str,
    name: &'a str,
    content: &'a str,
    ttl: u32,
}

#[derive(Deserialize)]
struct RecordResponse {
    record: RecordBody,
}

#[derive(Deserialize)]
struct RecordBody {
    id: String,
}

/// Token-authenticated HTTP client for the intermediate zone API
pub struct HttpIntermediateProvider {
    client: Client,
    credentials: IntermediateCredentials,
}

impl HttpIntermediateProvider {
    pub fn new(credentials: IntermediateCredentials) -> Result<Self, DnsError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| DnsError::Api(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            credentials,
        })
    }

    fn records_url(&self) -> String {
        format!(
            "{}/zones/{}/records",
            self.credentials.api_endpoint, self.credentials.zone
        )
    }
}

#[async_trait]
impl IntermediateDnsProvider for HttpIntermediateProvider {
    async fn create_txt(&self, name: &str, value: &str) -> Result<String, DnsError> {
        // Reject malformed names before spending a network round trip;
        // these are permanent failures, not retryable ones.
        validate_record_name(name)?;

        debug!(record = %name, zone = %self.credentials.zone, "Creating intermediate TXT record");

        let response = self
            .client
            .post(self.records_url())
            .bearer_auth(&self.credentials.api_token)
            .json(&CreateRecordRequest {
                record_type: "TXT",
                name,
                content: value,
                ttl: CHALLENGE_TTL,
            })
            .send()
            .await
            .map_err(|e| DnsError::Api(format!("TXT create request failed: {}", e)))?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(DnsError::Authentication(
                    "intermediate API token rejected".to_string(),
                ));
            }
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                let body = response.text().await.unwrap_or_default();
                return Err(DnsError::InvalidRecord {
                    name: name.to_string(),
                    reason: body,
                });
            }
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                return Err(DnsError::RecordCreation {
                    kind: "TXT",
                    name: name.to_string(),
                    message: format!("HTTP {}: {}", status, body),
                });
            }
            _ => {}
        }

        let parsed: RecordResponse = response
            .json()
            .await
            .map_err(|e| DnsError::Api(format!("Malformed record response: {}", e)))?;

        info!(record = %name, record_id = %parsed.record.id, "Intermediate TXT record created");
        Ok(parsed.record.id)
    }

    async fn delete_record(&self, record_id: &str) -> Result<(), DnsError> {
        let url = format!("{}/{}", self.records_url(), record_id);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(&self.credentials.api_token)
            .send()
            .await
            .map_err(|e| DnsError::Api(format!("Record delete request failed: {}", e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                debug!(record_id = %record_id, "Intermediate record already gone");
                Ok(())
            }
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(DnsError::Authentication(
                "intermediate API token rejected".to_string(),
            )),
            status if !status.is_success() => {
                let body = response.text().await.unwrap_or_default();
                Err(DnsError::RecordDeletion {
                    record_id: record_id.to_string(),
                    message: format!("HTTP {}: {}", status, body),
                })
            }
            _ => {
                info!(record_id = %record_id, "Intermediate record deleted");
                Ok(())
            }
        }
    }
}

impl std::fmt::Debug for HttpIntermediateProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpIntermediateProvider")
            .field("credentials", &self.credentials)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_credentials() -> IntermediateCredentials {
        IntermediateCredentials {
            api_endpoint: "https://dns.example.net/api/v1".to_string(),
            api_token: "token".to_string(),
            zone: "acme-proxy.example.net".to_string(),
        }
    }

    #[test]
    fn test_records_url() {
        let provider = HttpIntermediateProvider::new(test_credentials()).unwrap();
        assert_eq!(
            provider.records_url(),
            "https://dns.example.net/api/v1/zones/acme-proxy.example.net/records"
        );
    }

    #[tokio::test]
    async fn test_create_rejects_malformed_name_before_any_request() {
        let provider = HttpIntermediateProvider::new(test_credentials()).unwrap();

        let err = provider
            .create_txt("bad name.example.net", "value")
            .await
            .unwrap_err();

        assert!(matches!(err, DnsError::InvalidRecord { .. }));
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_create_request_wire_shape() {
        let body = CreateRecordRequest {
            record_type: "TXT",
            name: "_acme-challenge.demo1.acme-proxy.example.net",
            content: "token-value",
            ttl: CHALLENGE_TTL,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["type"], "TXT");
        assert_eq!(json["ttl"], 60);
        assert_eq!(json["content"], "token-value");
    }
}
