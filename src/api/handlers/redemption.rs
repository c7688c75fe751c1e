//! Redemption code lookup, consumption and detail handlers.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::{Json, Router};

use crate::api::dto::{
    CodeLookupResponse, ConsumeCodeResponse, PendingCodeResponse, RedemptionDetailResponse,
};
use crate::api::extract::ApiPath;
use crate::app_state::AppState;
use crate::domain::Tenant;
use crate::error::{ErrorResponse, LedgerError};

/// `GET /clientes/{tenant}/codigos-resgate/{code}`: Look a code up.
///
/// # Errors
///
/// Returns [`LedgerError`] for a malformed or unknown code.
#[utoipa::path(
    get,
    path = "/clientes/{tenant}/codigos-resgate/{code}",
    tag = "Redemption codes",
    summary = "Look up a redemption code",
    description = "Finds a code by value (case-insensitive) with its owner's name and balance and the item name.",
    params(
        ("tenant" = String, Path, description = "Tenant schema name"),
        ("code" = String, Path, description = "5-character code"),
    ),
    responses(
        (status = 200, description = "Code found", body = CodeLookupResponse),
        (status = 400, description = "Malformed code", body = ErrorResponse),
        (status = 404, description = "Code not found", body = ErrorResponse),
    )
)]
pub async fn find_code(
    State(state): State<AppState>,
    ApiPath((tenant, code)): ApiPath<(Tenant, String)>,
) -> Result<impl IntoResponse, LedgerError> {
    let lookup = state.ledger.find_code(&tenant, &code).await?;
    Ok(Json(CodeLookupResponse::from(lookup)))
}

/// `GET /clientes/{tenant}/{id}/codigos-resgate/item/{item_id}`: Pending
/// code for a customer and item.
///
/// # Errors
///
/// Returns [`LedgerError::CodeNotFound`] when no unused code exists.
#[utoipa::path(
    get,
    path = "/clientes/{tenant}/{id}/codigos-resgate/item/{item_id}",
    tag = "Redemption codes",
    summary = "Find a customer's unused code for an item",
    description = "Returns the most recent unused code the customer holds for the item, with the current balance and the debit movement amounts.",
    params(
        ("tenant" = String, Path, description = "Tenant schema name"),
        ("id" = i64, Path, description = "Customer id"),
        ("item_id" = i64, Path, description = "Reward item id"),
    ),
    responses(
        (status = 200, description = "Unused code found", body = PendingCodeResponse),
        (status = 404, description = "No unused code", body = ErrorResponse),
    )
)]
pub async fn find_unused_code(
    State(state): State<AppState>,
    ApiPath((tenant, customer_id, item_id)): ApiPath<(Tenant, i64, i64)>,
) -> Result<impl IntoResponse, LedgerError> {
    let pending = state
        .ledger
        .find_unused_code(&tenant, customer_id, item_id)
        .await?;
    Ok(Json(PendingCodeResponse::from(pending)))
}

/// `PUT /clientes/{tenant}/{id}/pontos/{code}`: Consume a code.
///
/// A customer id of zero or less skips the ownership check.
///
/// # Errors
///
/// Returns [`LedgerError`] for a malformed, unknown, used or foreign code.
#[utoipa::path(
    put,
    path = "/clientes/{tenant}/{id}/pontos/{code}",
    tag = "Redemption codes",
    summary = "Consume a redemption code",
    description = "Marks the code as used. Succeeds exactly once per code; the code must belong to the customer in the path when that id is positive.",
    params(
        ("tenant" = String, Path, description = "Tenant schema name"),
        ("id" = i64, Path, description = "Expected owner; 0 skips the check"),
        ("code" = String, Path, description = "5-character code"),
    ),
    responses(
        (status = 200, description = "Code consumed", body = ConsumeCodeResponse),
        (status = 400, description = "Malformed code", body = ErrorResponse),
        (status = 403, description = "Code belongs to another customer", body = ErrorResponse),
        (status = 404, description = "Code not found", body = ErrorResponse),
        (status = 409, description = "Code already used", body = ErrorResponse),
    )
)]
pub async fn consume_code(
    State(state): State<AppState>,
    ApiPath((tenant, customer_id, code)): ApiPath<(Tenant, i64, String)>,
) -> Result<impl IntoResponse, LedgerError> {
    let expected = (customer_id > 0).then_some(customer_id);
    let redemption = state.ledger.consume_code(&tenant, &code, expected).await?;
    Ok(Json(ConsumeCodeResponse::from(redemption)))
}

/// `GET /clientes/{tenant}/resgates/{id}`: Redemption detail.
///
/// # Errors
///
/// Returns [`LedgerError::RedemptionNotFound`] for an unknown id.
#[utoipa::path(
    get,
    path = "/clientes/{tenant}/resgates/{id}",
    tag = "Redemption codes",
    summary = "Redemption detail",
    description = "Returns a redemption with customer contact data, item data, the debit movement and its delivery status.",
    params(
        ("tenant" = String, Path, description = "Tenant schema name"),
        ("id" = i64, Path, description = "Redemption id"),
    ),
    responses(
        (status = 200, description = "Redemption found", body = RedemptionDetailResponse),
        (status = 404, description = "Redemption not found", body = ErrorResponse),
    )
)]
pub async fn redemption_detail(
    State(state): State<AppState>,
    ApiPath((tenant, redemption_id)): ApiPath<(Tenant, i64)>,
) -> Result<impl IntoResponse, LedgerError> {
    let detail = state.ledger.redemption_detail(&tenant, redemption_id).await?;
    Ok(Json(RedemptionDetailResponse::from(detail)))
}

/// Redemption code routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clientes/{tenant}/codigos-resgate/{code}", get(find_code))
        .route(
            "/clientes/{tenant}/{id}/codigos-resgate/item/{item_id}",
            get(find_unused_code),
        )
        .route("/clientes/{tenant}/{id}/pontos/{code}", put(consume_code))
        .route("/clientes/{tenant}/resgates/{id}", get(redemption_detail))
}
