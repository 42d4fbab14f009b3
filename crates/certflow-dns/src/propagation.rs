//! Propagation verification for challenge records
//!
//! Confirms the challenge TXT value is visible to public resolvers before
//! the certificate authority is asked to validate it. "Not found yet" is an
//! expected transient state and reported as `Ok(false)`; only resolver
//! infrastructure failures are errors. The wait/retry schedule is policy
//! owned by the orchestrator, not this component.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

use hickory_resolver::config::{NameServerConfig, Protocol, ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::TokioAsyncResolver;
use tracing::{debug, trace};

use crate::error::DnsError;
use crate::record::challenge_record_fqdn;

/// Resolver configuration for verification lookups
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// Nameservers to query (empty = system defaults)
    pub nameservers: Vec<IpAddr>,
    /// Timeout for a single lookup
    pub lookup_timeout: Duration,
    /// Lookup attempts per nameserver
    pub attempts: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            nameservers: vec![
                IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)),
                IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)),
            ],
            lookup_timeout: Duration::from_secs(5),
            attempts: 2,
        }
    }
}

/// CNAME-aware challenge record verifier
pub struct VerificationPoller {
    resolver: TokioAsyncResolver,
}

impl VerificationPoller {
    pub fn new() -> Self {
        Self::with_config(PollerConfig::default())
    }

    pub fn with_config(config: PollerConfig) -> Self {
        let resolver_config = if config.nameservers.is_empty() {
            ResolverConfig::default()
        } else {
            let mut resolver_config = ResolverConfig::new();
            for ip in &config.nameservers {
                resolver_config
                    .add_name_server(NameServerConfig::new(SocketAddr::new(*ip, 53), Protocol::Udp));
            }
            resolver_config
        };

        let mut opts = ResolverOpts::default();
        opts.timeout = config.lookup_timeout;
        opts.attempts = config.attempts;
        // No caching: a stale negative answer would defeat the whole check
        opts.cache_size = 0;

        Self {
            resolver: TokioAsyncResolver::tokio(resolver_config, opts),
        }
    }

    /// Check whether `_acme-challenge.<domain>` resolves to `expected_value`.
    ///
    /// When the challenge is delegated through a CNAME, authoritative
    /// propagation of the customer-zone CNAME may lag behind the
    /// intermediate record, so the hint name is chased directly as well.
    pub async fn verify(
        &self,
        domain: &str,
        expected_value: &str,
        cname_hint: Option<&str>,
    ) -> Result<bool, DnsError> {
        let record_name = challenge_record_fqdn(domain);

        if self.txt_matches(&record_name, expected_value).await? {
            debug!(record = %record_name, "Challenge record visible at literal name");
            return Ok(true);
        }

        if let Some(hint) = cname_hint {
            if self.txt_matches(hint, expected_value).await? {
                debug!(record = %hint, "Challenge record visible via delegation target");
                return Ok(true);
            }
        }

        trace!(record = %record_name, "Challenge record not visible yet");
        Ok(false)
    }

    async fn txt_matches(&self, name: &str, expected_value: &str) -> Result<bool, DnsError> {
        match self.resolver.txt_lookup(name).await {
            Ok(records) => {
                for record in records.iter() {
                    let value: String = record
                        .txt_data()
                        .iter()
                        .map(|data| String::from_utf8_lossy(data))
                        .collect();
                    if value == expected_value {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Err(e) => match e.kind() {
                // Absence is the expected transient state during propagation
                ResolveErrorKind::NoRecordsFound { .. } => Ok(false),
                _ => Err(DnsError::Resolver(format!(
                    "lookup of '{}' failed: {}",
                    name, e
                ))),
            },
        }
    }
}

impl Default for VerificationPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VerificationPoller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationPoller").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = PollerConfig::default();
        assert_eq!(config.nameservers.len(), 2);
        assert_eq!(config.lookup_timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_poller_creation_with_custom_nameservers() {
        let config = PollerConfig {
            nameservers: vec![IpAddr::V4(Ipv4Addr::new(9, 9, 9, 9))],
            lookup_timeout: Duration::from_secs(2),
            attempts: 1,
        };
        let _poller = VerificationPoller::with_config(config);
    }
}
