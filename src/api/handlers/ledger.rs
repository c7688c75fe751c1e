//! Credit and debit endpoint handlers.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::post;
use axum::{Json, Router};

use crate::api::dto::{
    CreditPointsRequest, CreditPointsResponse, DebitPointsRequest, DebitPointsResponse,
};
use crate::api::extract::{Actor, ApiJson, ApiPath};
use crate::app_state::AppState;
use crate::domain::Tenant;
use crate::error::{ErrorResponse, LedgerError};

/// `POST /clientes/{tenant}/{id}/creditar-pontos`: Credit points.
///
/// # Errors
///
/// Returns [`LedgerError`] on invalid input or an unknown customer.
#[utoipa::path(
    post,
    path = "/clientes/{tenant}/{id}/creditar-pontos",
    tag = "Ledger",
    summary = "Credit points",
    description = "Adds points to a customer, either explicitly or converted from a purchase amount at 100 points per unit. Appends a CREDITO movement in the same transaction.",
    params(
        ("tenant" = String, Path, description = "Tenant schema name"),
        ("id" = i64, Path, description = "Customer id"),
        ("x-user-id" = Option<i64>, Header, description = "Acting user, defaults to 1"),
    ),
    request_body = CreditPointsRequest,
    responses(
        (status = 201, description = "Points credited", body = CreditPointsResponse),
        (status = 400, description = "Invalid credit request", body = ErrorResponse),
        (status = 404, description = "Customer or tenant not found", body = ErrorResponse),
    )
)]
pub async fn credit_points(
    State(state): State<AppState>,
    ApiPath((tenant, customer_id)): ApiPath<(Tenant, i64)>,
    Actor(actor): Actor,
    ApiJson(req): ApiJson<CreditPointsRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let outcome = state
        .ledger
        .credit(&tenant, req.into_request(customer_id, actor))
        .await?;
    Ok((StatusCode::CREATED, Json(CreditPointsResponse::from(outcome))))
}

/// `POST /clientes/{tenant}/{id}/debitar-pontos`: Redeem a reward.
///
/// # Errors
///
/// Returns [`LedgerError`] on invalid input, unknown customer or item,
/// insufficient balance, or code space exhaustion.
#[utoipa::path(
    post,
    path = "/clientes/{tenant}/{id}/debitar-pontos",
    tag = "Ledger",
    summary = "Redeem a reward item",
    description = "Debits the item's point cost and issues a single-use 5-character redemption code, atomically.",
    params(
        ("tenant" = String, Path, description = "Tenant schema name"),
        ("id" = i64, Path, description = "Customer id"),
        ("x-user-id" = Option<i64>, Header, description = "Acting user, defaults to 1"),
    ),
    request_body = DebitPointsRequest,
    responses(
        (status = 201, description = "Reward redeemed", body = DebitPointsResponse),
        (status = 400, description = "Invalid debit request", body = ErrorResponse),
        (status = 404, description = "Customer, item or tenant not found", body = ErrorResponse),
        (status = 409, description = "Insufficient balance", body = ErrorResponse),
    )
)]
pub async fn debit_points(
    State(state): State<AppState>,
    ApiPath((tenant, customer_id)): ApiPath<(Tenant, i64)>,
    Actor(actor): Actor,
    ApiJson(req): ApiJson<DebitPointsRequest>,
) -> Result<impl IntoResponse, LedgerError> {
    let outcome = state
        .ledger
        .redeem(&tenant, req.into_request(customer_id, actor))
        .await?;
    Ok((StatusCode::CREATED, Json(DebitPointsResponse::from(outcome))))
}

/// Ledger mutation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clientes/{tenant}/{id}/creditar-pontos", post(credit_points))
        .route("/clientes/{tenant}/{id}/debitar-pontos", post(debit_points))
}
