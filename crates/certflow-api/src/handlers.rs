use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use tracing::{debug, info};

use certflow_core::OrchestratorError;

use crate::middleware::AuthUser;
use crate::models::*;
use crate::AppState;

type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map orchestrator failures onto HTTP responses.
///
/// Classification errors are the caller's problem (422), state conflicts
/// are 409, upstream DNS/CA failures are 502, and storage failures stay
/// opaque 500s.
fn map_error(err: OrchestratorError) -> ApiError {
    let status = match &err {
        OrchestratorError::Classification(_) => StatusCode::UNPROCESSABLE_ENTITY,
        OrchestratorError::DuplicateRequest { .. }
        | OrchestratorError::Precondition { .. }
        | OrchestratorError::DeleteForbidden(_)
        | OrchestratorError::MissingDnsCredentials(_) => StatusCode::CONFLICT,
        OrchestratorError::NotFound(_) | OrchestratorError::AccountNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        OrchestratorError::Dns(_) | OrchestratorError::Issuance { .. } => StatusCode::BAD_GATEWAY,
        OrchestratorError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
            code: Some(err.code().to_string()),
        }),
    )
}

/// Per-request ownership gate.
///
/// Admin tokens act on any request; other tokens must own the hosting
/// account the request is bound to. Non-owners get 404 rather than 403
/// so request ids stay unguessable.
async fn authorize_request(
    state: &AppState,
    user: &AuthUser,
    request_id: &str,
) -> Result<(), ApiError> {
    if user.is_admin {
        return Ok(());
    }

    let owns = state
        .orchestrator
        .owns_request(request_id, &user.owner_id)
        .await
        .map_err(map_error)?;
    if owns {
        Ok(())
    } else {
        Err((
            StatusCode::NOT_FOUND,
            Json(ErrorResponse {
                error: format!("Certificate request {request_id} not found"),
                code: Some("NOT_FOUND".to_string()),
            }),
        ))
    }
}

/// Health check
#[utoipa::path(
    get,
    path = "/api/health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    ),
    tag = "system"
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Create a certificate request
#[utoipa::path(
    post,
    path = "/api/certificates",
    request_body = CreateCertificateRequest,
    responses(
        (status = 201, description = "Certificate request created", body = CreateCertificateResponse),
        (status = 409, description = "An active request for the domain already exists", body = ErrorResponse),
        (status = 422, description = "Domain cannot be classified to a hosting account", body = ErrorResponse),
        (status = 502, description = "DNS provisioning failed", body = ErrorResponse)
    ),
    tag = "certificates"
)]
pub async fn create_certificate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateCertificateRequest>,
) -> Result<(StatusCode, Json<CreateCertificateResponse>), ApiError> {
    info!(domain = %body.domain, owner = %user.owner_id, "Creating certificate request");

    let authority = body.authority.unwrap_or(CertificateAuthority::LetsEncrypt);
    let outcome = state
        .orchestrator
        .create(&body.domain, authority.into(), &user.owner_id)
        .await
        .map_err(map_error)?;

    let response = CreateCertificateResponse {
        request: (&outcome.request).into(),
        manual_record: outcome.manual_txt_record.map(|record| ManualDnsInstruction {
            record_name: record.name,
            record_value: record.value,
        }),
    };

    Ok((StatusCode::CREATED, Json(response)))
}

/// List certificate requests
///
/// Admin tokens see every request; other tokens only see requests for
/// hosting accounts they own.
#[utoipa::path(
    get,
    path = "/api/certificates",
    responses(
        (status = 200, description = "List of certificate requests", body = CertificateRequestList),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "certificates"
)]
pub async fn list_certificates(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<CertificateRequestList>, ApiError> {
    debug!(owner = %user.owner_id, "Listing certificate requests");

    let requests = if user.is_admin {
        state.orchestrator.list().await.map_err(map_error)?
    } else {
        state
            .orchestrator
            .list_for_owner(&user.owner_id)
            .await
            .map_err(map_error)?
    };
    let requests: Vec<CertificateRequestInfo> = requests.iter().map(Into::into).collect();
    let total = requests.len();

    Ok(Json(CertificateRequestList { requests, total }))
}

/// Get a certificate request by ID
#[utoipa::path(
    get,
    path = "/api/certificates/{id}",
    params(
        ("id" = String, Path, description = "Certificate request ID")
    ),
    responses(
        (status = 200, description = "Certificate request", body = CertificateRequestInfo),
        (status = 404, description = "Request not found", body = ErrorResponse)
    ),
    tag = "certificates"
)]
pub async fn get_certificate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<CertificateRequestInfo>, ApiError> {
    debug!(request_id = %id, "Getting certificate request");

    authorize_request(&state, &user, &id).await?;
    let request = state.orchestrator.get(&id).await.map_err(map_error)?;
    Ok(Json((&request).into()))
}

/// Download issued certificate material
#[utoipa::path(
    get,
    path = "/api/certificates/{id}/bundle",
    params(
        ("id" = String, Path, description = "Certificate request ID")
    ),
    responses(
        (status = 200, description = "Certificate, key, and chain PEMs", body = CertificateBundle),
        (status = 403, description = "Admin token required", body = ErrorResponse),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Certificate not issued yet", body = ErrorResponse)
    ),
    tag = "certificates"
)]
pub async fn get_certificate_bundle(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<CertificateBundle>, ApiError> {
    if !user.is_admin {
        return Err((
            StatusCode::FORBIDDEN,
            Json(ErrorResponse {
                error: "Certificate material requires an admin token".to_string(),
                code: Some("FORBIDDEN".to_string()),
            }),
        ));
    }

    let request = state.orchestrator.get(&id).await.map_err(map_error)?;

    match (
        request.issued_certificate,
        request.private_key,
        request.ca_certificate,
    ) {
        (Some(certificate), Some(private_key), Some(ca_certificate)) => {
            Ok(Json(CertificateBundle {
                certificate,
                private_key,
                ca_certificate,
            }))
        }
        _ => Err((
            StatusCode::CONFLICT,
            Json(ErrorResponse {
                error: format!("Request {id} has no issued certificate"),
                code: Some("NOT_ISSUED".to_string()),
            }),
        )),
    }
}

/// Trigger a propagation check
#[utoipa::path(
    post,
    path = "/api/certificates/{id}/verify",
    params(
        ("id" = String, Path, description = "Certificate request ID")
    ),
    responses(
        (status = 200, description = "Updated request state", body = CertificateRequestInfo),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request is not awaiting verification", body = ErrorResponse),
        (status = 502, description = "Resolver failure", body = ErrorResponse)
    ),
    tag = "certificates"
)]
pub async fn verify_certificate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<CertificateRequestInfo>, ApiError> {
    info!(request_id = %id, "Manual verification requested");

    authorize_request(&state, &user, &id).await?;
    let request = state.orchestrator.verify(&id).await.map_err(map_error)?;
    Ok(Json((&request).into()))
}

/// Drive issuance for a verified request
#[utoipa::path(
    post,
    path = "/api/certificates/{id}/issue",
    params(
        ("id" = String, Path, description = "Certificate request ID")
    ),
    responses(
        (status = 200, description = "Certificate issued", body = CertificateRequestInfo),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request is not verified", body = ErrorResponse),
        (status = 502, description = "Certificate authority rejected the order", body = ErrorResponse)
    ),
    tag = "certificates"
)]
pub async fn issue_certificate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<CertificateRequestInfo>, ApiError> {
    info!(request_id = %id, "Manual issuance requested");

    authorize_request(&state, &user, &id).await?;
    let request = state.orchestrator.issue(&id).await.map_err(map_error)?;
    Ok(Json((&request).into()))
}

/// Retry a failed request
#[utoipa::path(
    post,
    path = "/api/certificates/{id}/retry",
    params(
        ("id" = String, Path, description = "Certificate request ID")
    ),
    responses(
        (status = 200, description = "Request re-entered the issuance flow", body = CertificateRequestInfo),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Request has not failed", body = ErrorResponse),
        (status = 502, description = "DNS provisioning failed", body = ErrorResponse)
    ),
    tag = "certificates"
)]
pub async fn retry_certificate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<CertificateRequestInfo>, ApiError> {
    info!(request_id = %id, "Retry requested");

    authorize_request(&state, &user, &id).await?;
    let request = state.orchestrator.retry(&id).await.map_err(map_error)?;
    Ok(Json((&request).into()))
}

/// Delete a certificate request
#[utoipa::path(
    delete,
    path = "/api/certificates/{id}",
    params(
        ("id" = String, Path, description = "Certificate request ID")
    ),
    responses(
        (status = 204, description = "Request deleted"),
        (status = 404, description = "Request not found", body = ErrorResponse),
        (status = 409, description = "Issued requests cannot be deleted", body = ErrorResponse)
    ),
    tag = "certificates"
)]
pub async fn delete_certificate(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    info!(request_id = %id, owner = %user.owner_id, "Deleting certificate request");

    authorize_request(&state, &user, &id).await?;
    state.orchestrator.delete(&id).await.map_err(map_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Tail the in-flight issuance log
#[utoipa::path(
    get,
    path = "/api/certificates/{id}/log",
    params(
        ("id" = String, Path, description = "Certificate request ID"),
        ("lines" = Option<usize>, Query, description = "Number of trailing lines (default: 50)")
    ),
    responses(
        (status = 200, description = "Trailing log lines", body = IssuanceLogResponse),
        (status = 404, description = "Request not found", body = ErrorResponse)
    ),
    tag = "certificates"
)]
pub async fn get_certificate_log(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(id): Path<String>,
    Query(query): Query<LogQuery>,
) -> Result<Json<IssuanceLogResponse>, ApiError> {
    authorize_request(&state, &user, &id).await?;
    let lines = state
        .orchestrator
        .log_tail(&id, query.lines.unwrap_or(50))
        .await
        .map_err(map_error)?;

    Ok(Json(IssuanceLogResponse { lines }))
}
