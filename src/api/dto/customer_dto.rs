//! Customer-facing read DTOs: movement history and rewards summary.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use super::common_dto::{DayBound, PaginationMeta, parse_date_param};
use crate::domain::{Movement, MovementKind};
use crate::error::LedgerError;
use crate::persistence::models::DEFAULT_PAGE_LIMIT;
use crate::persistence::{MovementFilter, MovementPage, RewardWithPending, SortOrder};
use crate::service::RewardsSummary;

/// Query parameters of `GET /clientes/{tenant}/{id}/movimentacoes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MovementHistoryQuery {
    /// Page number, 1-indexed. Defaults to 1.
    pub page: Option<u32>,
    /// Page size, 1..=100. Defaults to 10.
    pub limit: Option<u32>,
    /// `CREDITO` or `DEBITO`.
    pub tipo: Option<String>,
    /// Exact origin label.
    pub origem: Option<String>,
    /// Earliest creation date, `YYYY-MM-DD` or RFC 3339.
    pub dt_ini: Option<String>,
    /// Latest creation date, `YYYY-MM-DD` or RFC 3339 (inclusive).
    pub dt_fim: Option<String>,
    /// `asc` or `desc` (default).
    pub order: Option<String>,
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

impl MovementHistoryQuery {
    /// Converts the raw query into a store filter. Range checks are left to
    /// [`MovementFilter::validate`].
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::InvalidInput`] for an unknown `tipo` or an
    /// unparseable date.
    pub fn to_filter(&self) -> Result<MovementFilter, LedgerError> {
        let kind = present(self.tipo.as_deref())
            .map(str::parse::<MovementKind>)
            .transpose()?;
        let from = present(self.dt_ini.as_deref())
            .map(|raw| parse_date_param("dt_ini", raw, DayBound::Start))
            .transpose()?;
        let to = present(self.dt_fim.as_deref())
            .map(|raw| parse_date_param("dt_fim", raw, DayBound::End))
            .transpose()?;
        Ok(MovementFilter {
            kind,
            origin: present(self.origem.as_deref()).map(str::to_string),
            from,
            to,
            order: SortOrder::parse_lenient(self.order.as_deref()),
            page: self.page.unwrap_or(1),
            limit: self.limit.unwrap_or(DEFAULT_PAGE_LIMIT),
        })
    }
}

/// One ledger movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MovementDto {
    /// Movement id.
    pub id_movimentacao: i64,
    /// Customer.
    pub id_cliente: i64,
    /// `CREDITO` or `DEBITO`.
    pub tipo: MovementKind,
    /// Points moved, always positive.
    pub pontos: i64,
    /// Balance right after this movement.
    pub saldo_resultante: i64,
    /// Source label.
    pub origem: String,
    /// Originating store.
    pub id_loja: Option<i64>,
    /// Item redeemed by a debit.
    pub id_item_recompensa: Option<i64>,
    /// Free-text note.
    pub observacao: Option<String>,
    /// Acting user.
    pub usu_cadastro: i64,
    /// Creation time.
    pub dt_cadastro: DateTime<Utc>,
}

impl From<Movement> for MovementDto {
    fn from(m: Movement) -> Self {
        Self {
            id_movimentacao: m.id,
            id_cliente: m.customer_id,
            tipo: m.kind,
            pontos: m.points,
            saldo_resultante: m.resulting_balance,
            origem: m.origin,
            id_loja: m.store_id,
            id_item_recompensa: m.reward_item_id,
            observacao: m.note,
            usu_cadastro: m.created_by,
            dt_cadastro: m.created_at,
        }
    }
}

/// One page of movement history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MovementHistoryResponse {
    /// Movements on this page.
    pub data: Vec<MovementDto>,
    /// Paging metadata.
    pub pagination: PaginationMeta,
}

impl MovementHistoryResponse {
    /// Wraps a store page with the paging it was read with.
    #[must_use]
    pub fn new(page: MovementPage, filter: &MovementFilter) -> Self {
        let total_pages = page.total_pages(filter.limit);
        Self {
            data: page.movements.into_iter().map(MovementDto::from).collect(),
            pagination: PaginationMeta {
                total: page.total,
                page: filter.page,
                limit: filter.limit,
                total_pages,
            },
        }
    }
}

/// A catalog entry as seen by one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RewardDto {
    /// Item id.
    pub id_item_recompensa: i64,
    /// Item name.
    pub nome_item: String,
    /// Image URL.
    pub foto: Option<String>,
    /// Point cost.
    pub qtd_pontos: Option<i64>,
    /// Always `ITEM_RECOMPENSA`.
    pub tipo: String,
    /// Remote fulfilment flag.
    pub nao_retirar_loja: bool,
    /// Newest unused code the customer holds for this item.
    pub codigo_resgate_pendente: Option<String>,
}

impl From<RewardWithPending> for RewardDto {
    fn from(entry: RewardWithPending) -> Self {
        Self {
            id_item_recompensa: entry.item.id,
            nome_item: entry.item.name,
            foto: entry.item.image,
            qtd_pontos: entry.item.cost,
            tipo: "ITEM_RECOMPENSA".to_string(),
            nao_retirar_loja: entry.item.remote_fulfilment,
            codigo_resgate_pendente: entry.pending_code,
        }
    }
}

/// Balance and catalog for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RewardsSummaryResponse {
    /// Current balance.
    pub quantidade_pontos: i64,
    /// Display code, `CLI-{id}`.
    #[schema(example = "CLI-7")]
    pub codigo_cliente: String,
    /// Catalog ordered by cost, then id.
    pub recompensas: Vec<RewardDto>,
}

impl From<RewardsSummary> for RewardsSummaryResponse {
    fn from(summary: RewardsSummary) -> Self {
        Self {
            quantidade_pontos: summary.customer.balance,
            codigo_cliente: summary.customer.customer_code(),
            recompensas: summary.rewards.into_iter().map(RewardDto::from).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn empty_query_uses_defaults() {
        let Ok(filter) = MovementHistoryQuery::default().to_filter() else {
            panic!("defaults should convert");
        };
        assert_eq!(filter, MovementFilter::default());
    }

    #[test]
    fn filters_are_parsed_and_blanks_ignored() {
        let query = MovementHistoryQuery {
            page: Some(2),
            limit: Some(5),
            tipo: Some("debito".to_string()),
            origem: Some("  ".to_string()),
            dt_ini: Some("2024-01-01".to_string()),
            dt_fim: None,
            order: Some("ASC".to_string()),
        };
        let Ok(filter) = query.to_filter() else {
            panic!("query should convert");
        };
        assert_eq!(filter.kind, Some(MovementKind::Debit));
        assert_eq!(filter.origin, None);
        assert!(filter.from.is_some());
        assert_eq!(filter.order, SortOrder::Asc);
        assert_eq!((filter.page, filter.limit), (2, 5));
    }

    #[test]
    fn unknown_tipo_is_rejected() {
        let query = MovementHistoryQuery {
            tipo: Some("ESTORNO".to_string()),
            ..MovementHistoryQuery::default()
        };
        assert!(matches!(query.to_filter(), Err(LedgerError::InvalidInput(_))));
    }
}
