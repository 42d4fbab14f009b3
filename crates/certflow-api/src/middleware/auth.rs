//! API token authentication middleware
//!
//! Extracts a bearer token from the Authorization header, resolves it to
//! an operator identity, and makes that identity available to handlers
//! via Axum's Extension.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::models::ErrorResponse;

/// Authenticated operator context
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthUser {
    /// Owning user of the hosting accounts this token may act for
    pub owner_id: String,
    /// Whether the token may read certificate material
    pub is_admin: bool,
}

/// One configured API token
#[derive(Debug, Clone)]
pub struct ApiToken {
    pub owner_id: String,
    pub is_admin: bool,
}

/// Token table shared across middleware instances
#[derive(Clone, Default)]
pub struct AuthState {
    tokens: Arc<HashMap<String, ApiToken>>,
}

impl AuthState {
    pub fn new(tokens: HashMap<String, ApiToken>) -> Self {
        Self {
            tokens: Arc::new(tokens),
        }
    }

    fn resolve(&self, token: &str) -> Option<&ApiToken> {
        self.tokens.get(token)
    }
}

/// Authentication middleware for protected endpoints.
///
/// # Errors
/// Returns 401 Unauthorized if the Authorization header is missing,
/// malformed, or carries an unknown token.
pub async fn require_auth(
    state: axum::extract::State<AuthState>,
    mut request: Request,
    next: Next,
) -> Result<Response, (StatusCode, Json<ErrorResponse>)> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "));

    let Some(token) = token else {
        return Err(unauthorized("Missing Authorization header"));
    };

    let Some(api_token) = state.resolve(token) else {
        return Err(unauthorized("Invalid API token"));
    };

    request.extensions_mut().insert(AuthUser {
        owner_id: api_token.owner_id.clone(),
        is_admin: api_token.is_admin,
    });

    Ok(next.run(request).await)
}

fn unauthorized(message: &str) -> (StatusCode, Json<ErrorResponse>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse {
            error: message.to_string(),
            code: Some("UNAUTHORIZED".to_string()),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_known_and_unknown_tokens() {
        let mut tokens = HashMap::new();
        tokens.insert(
            "secret-token".to_string(),
            ApiToken {
                owner_id: "user-1".to_string(),
                is_admin: false,
            },
        );
        let state = AuthState::new(tokens);

        assert_eq!(state.resolve("secret-token").unwrap().owner_id, "user-1");
        assert!(state.resolve("other").is_none());
    }
}
