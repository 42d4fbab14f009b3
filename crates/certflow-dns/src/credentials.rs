//! Credential shapes for the two DNS backends
//!
//! Each provider constructor accepts only the variant payload it needs, so
//! misrouted credentials fail at compile time rather than at a runtime
//! field-presence check.

/// Credentials for the intermediate-authority zone API
#[derive(Clone)]
pub struct IntermediateCredentials {
    /// Base URL of the zone API, e.g. `https://dns.example.net/api/v1`
    pub api_endpoint: String,
    /// Stateless bearer token
    pub api_token: String,
    /// Zone the challenge records live in
    pub zone: String,
}

impl std::fmt::Debug for IntermediateCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntermediateCredentials")
            .field("api_endpoint", &self.api_endpoint)
            .field("api_token", &"<redacted>")
            .field("zone", &self.zone)
            .finish()
    }
}

/// Credentials for one hosting account's panel DNS API
#[derive(Clone)]
pub struct AccountDnsCredentials {
    /// Base URL of the hosting panel, e.g. `https://panel.example-host.com`
    pub panel_endpoint: String,
    /// Panel account username
    pub username: String,
    /// Panel account password
    pub password: String,
}

impl std::fmt::Debug for AccountDnsCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccountDnsCredentials")
            .field("panel_endpoint", &self.panel_endpoint)
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_secrets() {
        let creds = IntermediateCredentials {
            api_endpoint: "https://dns.example.net/api/v1".to_string(),
            api_token: "super-secret".to_string(),
            zone: "acme-proxy.example.net".to_string(),
        };
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("acme-proxy.example.net"));

        let creds = AccountDnsCredentials {
            panel_endpoint: "https://panel.example-host.com".to_string(),
            username: "demo1".to_string(),
            password: "hunter2".to_string(),
        };
        let rendered = format!("{:?}", creds);
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("demo1"));
    }
}
