//! Customer read endpoints: movement history and rewards summary.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};

use crate::api::dto::{MovementHistoryQuery, MovementHistoryResponse, RewardsSummaryResponse};
use crate::api::extract::{ApiPath, ApiQuery};
use crate::app_state::AppState;
use crate::domain::Tenant;
use crate::error::{ErrorResponse, LedgerError};

/// `GET /clientes/{tenant}/{id}/movimentacoes`: Movement history.
///
/// # Errors
///
/// Returns [`LedgerError`] on bad paging or filters, or an unknown customer.
#[utoipa::path(
    get,
    path = "/clientes/{tenant}/{id}/movimentacoes",
    tag = "Customers",
    summary = "List movements",
    description = "Paginated movement history of a customer, newest first unless `order=asc`.",
    params(
        ("tenant" = String, Path, description = "Tenant schema name"),
        ("id" = i64, Path, description = "Customer id"),
        MovementHistoryQuery,
    ),
    responses(
        (status = 200, description = "Movement page", body = MovementHistoryResponse),
        (status = 400, description = "Invalid paging or filter", body = ErrorResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse),
    )
)]
pub async fn movement_history(
    State(state): State<AppState>,
    ApiPath((tenant, customer_id)): ApiPath<(Tenant, i64)>,
    ApiQuery(query): ApiQuery<MovementHistoryQuery>,
) -> Result<impl IntoResponse, LedgerError> {
    let filter = query.to_filter()?;
    let page = state
        .ledger
        .movement_history(&tenant, customer_id, &filter)
        .await?;
    Ok(Json(MovementHistoryResponse::new(page, &filter)))
}

/// `GET /clientes/{tenant}/{id}/pontos-recompensas`: Balance and catalog.
///
/// # Errors
///
/// Returns [`LedgerError::CustomerNotFound`] for an unknown customer.
#[utoipa::path(
    get,
    path = "/clientes/{tenant}/{id}/pontos-recompensas",
    tag = "Customers",
    summary = "Points and rewards summary",
    description = "Customer balance and the tenant's reward catalog, each item annotated with the customer's newest pending code.",
    params(
        ("tenant" = String, Path, description = "Tenant schema name"),
        ("id" = i64, Path, description = "Customer id"),
    ),
    responses(
        (status = 200, description = "Summary", body = RewardsSummaryResponse),
        (status = 404, description = "Customer not found", body = ErrorResponse),
    )
)]
pub async fn rewards_summary(
    State(state): State<AppState>,
    ApiPath((tenant, customer_id)): ApiPath<(Tenant, i64)>,
) -> Result<impl IntoResponse, LedgerError> {
    let summary = state.ledger.rewards_summary(&tenant, customer_id).await?;
    Ok(Json(RewardsSummaryResponse::from(summary)))
}

/// Customer read routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/clientes/{tenant}/{id}/movimentacoes", get(movement_history))
        .route("/clientes/{tenant}/{id}/pontos-recompensas", get(rewards_summary))
}
