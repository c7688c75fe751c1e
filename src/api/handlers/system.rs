//! System endpoints: health check and tenant provisioning.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::api::extract::ApiPath;
use crate::app_state::AppState;
use crate::domain::Tenant;
use crate::error::{ErrorResponse, LedgerError};

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    status: String,
    timestamp: String,
    version: String,
}

/// `GET /health`: Service health status.
#[utoipa::path(
    get,
    path = "/health",
    tag = "System",
    summary = "Health check",
    description = "Pings the store. Returns 503 when it is unreachable.",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "Store unreachable", body = HealthResponse),
    )
)]
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let (code, status) = match state.ledger.health().await {
        Ok(()) => (StatusCode::OK, "healthy"),
        Err(err) => {
            tracing::warn!(error = %err, "health check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    };
    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }),
    )
}

/// `POST /tenants/{tenant}/provision`: Create a tenant's tables.
///
/// # Errors
///
/// Returns [`LedgerError`] for an invalid tenant name or a store failure.
#[utoipa::path(
    post,
    path = "/tenants/{tenant}/provision",
    tag = "System",
    summary = "Provision a tenant",
    description = "Idempotently creates the tenant schema, tables and indexes.",
    params(
        ("tenant" = String, Path, description = "Tenant schema name"),
    ),
    responses(
        (status = 204, description = "Tenant ready"),
        (status = 400, description = "Invalid tenant name", body = ErrorResponse),
    )
)]
pub async fn provision_tenant(
    State(state): State<AppState>,
    ApiPath(tenant): ApiPath<Tenant>,
) -> Result<impl IntoResponse, LedgerError> {
    state.ledger.provision_tenant(&tenant).await?;
    tracing::info!(%tenant, "tenant provisioned");
    Ok(StatusCode::NO_CONTENT)
}

/// System routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health_handler))
        .route("/tenants/{tenant}/provision", post(provision_tenant))
}
