//! REST API for the certificate lifecycle orchestrator
//!
//! Exposes certificate request management over HTTP with OpenAPI
//! documentation and bearer-token authentication. The handlers are a
//! thin layer over [`certflow_core::Orchestrator`]; all lifecycle rules
//! live there.

pub mod handlers;
pub mod middleware;
pub mod models;

use axum::{
    http::{header, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use certflow_core::Orchestrator;

/// Application state shared across handlers
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Certflow API",
        version = "0.1.0",
        description = "REST API for domain-validated certificate lifecycle management",
        contact(
            name = "Certflow Team",
            email = "team@certflow.io"
        )
    ),
    paths(
        handlers::health_check,
        handlers::create_certificate,
        handlers::list_certificates,
        handlers::get_certificate,
        handlers::get_certificate_bundle,
        handlers::verify_certificate,
        handlers::issue_certificate,
        handlers::retry_certificate,
        handlers::delete_certificate,
        handlers::get_certificate_log,
    ),
    components(
        schemas(
            models::CertificateStatus,
            models::DomainKind,
            models::CertificateAuthority,
            models::CertificateRequestInfo,
            models::CreateCertificateRequest,
            models::ManualDnsInstruction,
            models::CreateCertificateResponse,
            models::CertificateRequestList,
            models::CertificateBundle,
            models::IssuanceLogResponse,
            models::HealthResponse,
            models::ErrorResponse,
        )
    ),
    tags(
        (name = "certificates", description = "Certificate request lifecycle endpoints"),
        (name = "system", description = "System health and info endpoints")
    )
)]
struct ApiDoc;

/// API server configuration
pub struct ApiServerConfig {
    /// Address to bind the API server
    pub bind_addr: SocketAddr,
    /// Enable CORS (for development)
    pub enable_cors: bool,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().unwrap(),
            enable_cors: true,
        }
    }
}

/// API Server
pub struct ApiServer {
    config: ApiServerConfig,
    state: Arc<AppState>,
    auth: middleware::AuthState,
}

impl ApiServer {
    /// Create a new API server
    pub fn new(
        config: ApiServerConfig,
        orchestrator: Arc<Orchestrator>,
        auth: middleware::AuthState,
    ) -> Self {
        let state = Arc::new(AppState { orchestrator });

        Self {
            config,
            state,
            auth,
        }
    }

    /// Build the router with all routes
    pub fn build_router(&self) -> Router {
        let api_doc = ApiDoc::openapi();

        // Build PUBLIC routes (no authentication required)
        let public_router = Router::new()
            .route("/api/health", get(handlers::health_check))
            .with_state(self.state.clone());

        // Build PROTECTED routes (require a bearer API token)
        let protected_router = Router::new()
            .route(
                "/api/certificates",
                get(handlers::list_certificates).post(handlers::create_certificate),
            )
            .route(
                "/api/certificates/{id}",
                get(handlers::get_certificate).delete(handlers::delete_certificate),
            )
            .route(
                "/api/certificates/{id}/bundle",
                get(handlers::get_certificate_bundle),
            )
            .route(
                "/api/certificates/{id}/verify",
                post(handlers::verify_certificate),
            )
            .route(
                "/api/certificates/{id}/issue",
                post(handlers::issue_certificate),
            )
            .route(
                "/api/certificates/{id}/retry",
                post(handlers::retry_certificate),
            )
            .route(
                "/api/certificates/{id}/log",
                get(handlers::get_certificate_log),
            )
            .with_state(self.state.clone())
            .layer(axum_middleware::from_fn_with_state(
                self.auth.clone(),
                middleware::require_auth,
            ));

        let api_router = public_router.merge(protected_router);

        // SwaggerUi automatically creates a route for /api/openapi.json
        let router = Router::new()
            .merge(SwaggerUi::new("/swagger-ui").url("/api/openapi.json", api_doc))
            .merge(api_router);

        let mut router = router.layer(TraceLayer::new_for_http());

        if self.config.enable_cors {
            let cors = CorsLayer::new()
                .allow_methods([Method::GET, Method::POST, Method::DELETE])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_origin(tower_http::cors::Any);
            router = router.layer(cors);
        }

        router
    }

    /// Start the API server
    pub async fn start(self) -> Result<(), anyhow::Error> {
        let router = self.build_router();

        info!("Starting API server on {}", self.config.bind_addr);
        info!(
            "OpenAPI spec: http://{}/api/openapi.json",
            self.config.bind_addr
        );
        info!("Swagger UI: http://{}/swagger-ui", self.config.bind_addr);

        let listener = tokio::net::TcpListener::bind(self.config.bind_addr).await?;

        axum::serve(listener, router)
            .await
            .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_generation() {
        // Ensure OpenAPI spec can be generated without panics
        let _api_doc = ApiDoc::openapi();
    }
}
