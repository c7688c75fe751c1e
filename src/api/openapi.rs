//! OpenAPI document assembled from the handler annotations.

use utoipa::OpenApi;

use super::dto;
use super::handlers::{customer, ledger, redemption, system};
use crate::domain::{MovementKind, RedemptionStatus};
use crate::error::ErrorResponse;

/// OpenAPI description of every REST endpoint.
#[derive(Debug, OpenApi)]
#[openapi(
    info(
        title = "loyalty-ledger",
        description = "Points ledger and redemption-code engine for a multi-tenant loyalty backend."
    ),
    paths(
        ledger::credit_points,
        ledger::debit_points,
        redemption::find_code,
        redemption::find_unused_code,
        redemption::consume_code,
        redemption::redemption_detail,
        customer::movement_history,
        customer::rewards_summary,
        system::health_handler,
        system::provision_tenant,
    ),
    components(schemas(
        ErrorResponse,
        MovementKind,
        RedemptionStatus,
        dto::PaginationMeta,
        dto::CreditPointsRequest,
        dto::CreditPointsResponse,
        dto::DebitPointsRequest,
        dto::DebitPointsResponse,
        dto::MovementSummary,
        dto::CodeLookupResponse,
        dto::PendingCodeResponse,
        dto::ConsumeCodeResponse,
        dto::RedemptionDetailResponse,
        dto::DetailCustomer,
        dto::DetailItem,
        dto::DetailMovement,
        dto::MovementDto,
        dto::MovementHistoryResponse,
        dto::RewardDto,
        dto::RewardsSummaryResponse,
        system::HealthResponse,
    )),
    tags(
        (name = "Ledger", description = "Credits and reward redemptions"),
        (name = "Redemption codes", description = "Code lookup, consumption and detail"),
        (name = "Customers", description = "Movement history and rewards summary"),
        (name = "System", description = "Health and tenant provisioning"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_route() {
        let doc = ApiDoc::openapi();
        let paths: Vec<&str> = doc.paths.paths.keys().map(String::as_str).collect();
        for expected in [
            "/clientes/{tenant}/{id}/creditar-pontos",
            "/clientes/{tenant}/{id}/debitar-pontos",
            "/clientes/{tenant}/codigos-resgate/{code}",
            "/clientes/{tenant}/{id}/codigos-resgate/item/{item_id}",
            "/clientes/{tenant}/{id}/pontos/{code}",
            "/clientes/{tenant}/{id}/movimentacoes",
            "/clientes/{tenant}/{id}/pontos-recompensas",
            "/clientes/{tenant}/resgates/{id}",
            "/tenants/{tenant}/provision",
            "/health",
        ] {
            assert!(paths.contains(&expected), "missing {expected}");
        }
    }
}
