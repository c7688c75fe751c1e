//! Redemption code lookup, consumption and detail DTOs.

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::domain::{CodeLookup, PendingCode, Redemption, RedemptionDetail, RedemptionStatus};

/// Response for a consumed code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ConsumeCodeResponse {
    /// Always `"success"`.
    pub status: String,
    /// The consumed code.
    pub codigo_resgate: String,
    /// Always `true`.
    pub resgate_utilizado: bool,
    /// Owner of the code.
    pub id_cliente: i64,
    /// Redeemed item.
    pub id_item_recompensa: i64,
    /// Debit movement that paid for the item.
    pub id_movimentacao: Option<i64>,
}

impl From<Redemption> for ConsumeCodeResponse {
    fn from(redemption: Redemption) -> Self {
        Self {
            status: "success".to_string(),
            codigo_resgate: redemption.code.to_string(),
            resgate_utilizado: redemption.used,
            id_cliente: redemption.customer_id,
            id_item_recompensa: redemption.reward_item_id,
            id_movimentacao: redemption.movement_id,
        }
    }
}

/// A code looked up by value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CodeLookupResponse {
    /// Code value.
    pub codigo_resgate: String,
    /// Whether the code was consumed.
    pub resgate_utilizado: bool,
    /// Owner.
    pub id_cliente: i64,
    /// Redeemed item.
    pub id_item_recompensa: i64,
    /// Debit movement.
    pub id_movimentacao: Option<i64>,
    /// Owner's full name.
    pub cliente_nome: String,
    /// Owner's current balance.
    pub cliente_saldo: i64,
    /// Item name, if the item still exists.
    pub item_nome: Option<String>,
}

impl From<CodeLookup> for CodeLookupResponse {
    fn from(lookup: CodeLookup) -> Self {
        let r = lookup.redemption;
        Self {
            codigo_resgate: r.code.to_string(),
            resgate_utilizado: r.used,
            id_cliente: r.customer_id,
            id_item_recompensa: r.reward_item_id,
            id_movimentacao: r.movement_id,
            cliente_nome: lookup.customer_name,
            cliente_saldo: lookup.customer_balance,
            item_nome: lookup.item_name,
        }
    }
}

/// Newest unused code of a customer for an item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct PendingCodeResponse {
    /// Code value.
    pub codigo_resgate: String,
    /// Always `false`.
    pub resgate_utilizado: bool,
    /// Owner.
    pub id_cliente: i64,
    /// Redeemed item.
    pub id_item_recompensa: i64,
    /// Debit movement.
    pub id_movimentacao: Option<i64>,
    /// Customer's current balance.
    pub saldo_atual: i64,
    /// Points spent by the debit movement.
    pub pontos: Option<i64>,
    /// Balance right after the debit movement.
    pub saldo_resultante: Option<i64>,
}

impl From<PendingCode> for PendingCodeResponse {
    fn from(pending: PendingCode) -> Self {
        let r = pending.redemption;
        Self {
            codigo_resgate: r.code.to_string(),
            resgate_utilizado: r.used,
            id_cliente: r.customer_id,
            id_item_recompensa: r.reward_item_id,
            id_movimentacao: r.movement_id,
            saldo_atual: pending.current_balance,
            pontos: pending.movement_points,
            saldo_resultante: pending.movement_resulting_balance,
        }
    }
}

/// Customer block of a redemption detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DetailCustomer {
    /// Customer id.
    pub id_cliente: i64,
    /// Full name.
    pub nome: String,
    /// E-mail.
    pub email: String,
    /// WhatsApp number.
    pub whatsapp: Option<String>,
    /// Current balance.
    pub saldo: i64,
}

/// Item block of a redemption detail; all fields are null when the item
/// row is gone.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DetailItem {
    /// Item id.
    pub id_item_recompensa: i64,
    /// Item name.
    pub nome: Option<String>,
    /// Description.
    pub descricao: Option<String>,
    /// Point cost.
    pub quantidade_pontos: Option<i64>,
    /// Remote fulfilment flag.
    pub nao_retirar_loja: Option<bool>,
}

/// Movement block of a redemption detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DetailMovement {
    /// Points spent.
    pub pontos: Option<i64>,
    /// Balance right after the debit.
    pub saldo_resultante: Option<i64>,
    /// Note recorded with the debit.
    pub observacao: Option<String>,
    /// When the debit was recorded.
    pub dt_cadastro: Option<DateTime<Utc>>,
}

/// Full view of one redemption.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RedemptionDetailResponse {
    /// Redemption row id.
    pub id_resgate: i64,
    /// Code value.
    pub codigo_resgate: String,
    /// Whether the code was consumed.
    pub resgate_utilizado: bool,
    /// Owner.
    pub id_cliente: i64,
    /// Redeemed item.
    pub id_item_recompensa: i64,
    /// Debit movement.
    pub id_movimentacao: Option<i64>,
    /// When the code was issued.
    pub dt_resgate: DateTime<Utc>,
    /// Consumption time; not tracked, always null.
    pub dt_utilizado: Option<DateTime<Utc>>,
    /// Owner data.
    pub cliente: DetailCustomer,
    /// Item data.
    pub item: DetailItem,
    /// Movement data.
    pub movimentacao: DetailMovement,
    /// `entregue` once consumed, `pendente` before.
    pub status: RedemptionStatus,
}

impl From<RedemptionDetail> for RedemptionDetailResponse {
    fn from(detail: RedemptionDetail) -> Self {
        let RedemptionDetail {
            redemption,
            customer,
            item,
            movement,
        } = detail;
        let status = redemption.status();
        let item = match item {
            Some(item) => DetailItem {
                id_item_recompensa: item.id,
                nome: Some(item.name),
                descricao: item.description,
                quantidade_pontos: item.cost,
                nao_retirar_loja: Some(item.remote_fulfilment),
            },
            None => DetailItem {
                id_item_recompensa: redemption.reward_item_id,
                nome: None,
                descricao: None,
                quantidade_pontos: None,
                nao_retirar_loja: None,
            },
        };
        let movimentacao = match movement {
            Some(m) => DetailMovement {
                pontos: Some(m.points),
                saldo_resultante: Some(m.resulting_balance),
                observacao: m.note,
                dt_cadastro: Some(m.created_at),
            },
            None => DetailMovement {
                pontos: None,
                saldo_resultante: None,
                observacao: None,
                dt_cadastro: None,
            },
        };
        Self {
            id_resgate: redemption.id,
            codigo_resgate: redemption.code.to_string(),
            resgate_utilizado: redemption.used,
            id_cliente: redemption.customer_id,
            id_item_recompensa: redemption.reward_item_id,
            id_movimentacao: redemption.movement_id,
            dt_resgate: redemption.created_at,
            dt_utilizado: None,
            cliente: DetailCustomer {
                id_cliente: customer.id,
                nome: customer.full_name,
                email: customer.email,
                whatsapp: customer.whatsapp,
                saldo: customer.balance,
            },
            item,
            movimentacao,
            status,
        }
    }
}
