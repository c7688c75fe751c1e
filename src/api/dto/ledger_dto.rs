//! Credit and debit request/response DTOs.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::domain::Movement;
use crate::persistence::{CreditOutcome, RedemptionOutcome};
use crate::service::{CreditRequest, RedeemRequest};

/// Request body for `POST /clientes/{tenant}/{id}/creditar-pontos`.
///
/// `pontos` wins when positive; otherwise `valor_reais` is converted at
/// 100 points per unit, rounded down.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
pub struct CreditPointsRequest {
    /// Movement type, must be `CREDITO`.
    #[schema(example = "CREDITO")]
    pub tipo: String,
    /// Points to credit.
    #[serde(default)]
    pub pontos: Option<i64>,
    /// Purchase amount to convert into points.
    #[serde(default)]
    pub valor_reais: Option<f64>,
    /// Source label (e.g. `"COMPRA"`), required.
    #[serde(default)]
    pub origem: Option<String>,
    /// Originating store.
    #[serde(default)]
    pub id_loja: Option<i64>,
    /// Free-text note.
    #[serde(default)]
    pub observacao: Option<String>,
}

impl CreditPointsRequest {
    /// Binds the body to a customer and the acting user.
    #[must_use]
    pub fn into_request(self, customer_id: i64, actor: i64) -> CreditRequest {
        CreditRequest {
            customer_id,
            kind: self.tipo,
            points: self.pontos,
            currency_amount: self.valor_reais,
            origin: self.origem,
            store_id: self.id_loja,
            note: self.observacao,
            actor,
        }
    }
}

/// Request body for `POST /clientes/{tenant}/{id}/debitar-pontos`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct DebitPointsRequest {
    /// Reward item to redeem.
    #[serde(default)]
    pub id_item_recompensa: Option<i64>,
    /// Free-text note.
    #[serde(default)]
    pub observacao: Option<String>,
}

impl DebitPointsRequest {
    /// Binds the body to a customer and the acting user.
    #[must_use]
    pub fn into_request(self, customer_id: i64, actor: i64) -> RedeemRequest {
        RedeemRequest {
            customer_id,
            reward_item_id: self.id_item_recompensa,
            note: self.observacao,
            actor,
        }
    }
}

/// The movement appended by a credit or debit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct MovementSummary {
    /// Movement id.
    pub id_movimentacao: i64,
    /// Points moved.
    pub pontos: i64,
    /// Balance right after this movement.
    pub saldo_resultante: i64,
}

impl From<&Movement> for MovementSummary {
    fn from(movement: &Movement) -> Self {
        Self {
            id_movimentacao: movement.id,
            pontos: movement.points,
            saldo_resultante: movement.resulting_balance,
        }
    }
}

/// Response for a committed credit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct CreditPointsResponse {
    /// Appended movement.
    pub movimentacao: MovementSummary,
    /// Balance after the credit.
    pub saldo_atual: i64,
}

impl From<CreditOutcome> for CreditPointsResponse {
    fn from(outcome: CreditOutcome) -> Self {
        Self {
            movimentacao: MovementSummary::from(&outcome.movement),
            saldo_atual: outcome.customer.balance,
        }
    }
}

/// Response for a committed redemption debit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DebitPointsResponse {
    /// Appended debit movement.
    pub movimentacao: MovementSummary,
    /// Balance after the debit.
    pub saldo_atual: i64,
    /// Issued redemption code.
    #[schema(example = "K7P2Q")]
    pub codigo_resgate: String,
    /// Always `false` for a fresh code.
    pub resgate_utilizado: bool,
}

impl From<RedemptionOutcome> for DebitPointsResponse {
    fn from(outcome: RedemptionOutcome) -> Self {
        Self {
            movimentacao: MovementSummary::from(&outcome.movement),
            saldo_atual: outcome.customer.balance,
            codigo_resgate: outcome.redemption.code.to_string(),
            resgate_utilizado: outcome.redemption.used,
        }
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn credit_body_accepts_missing_optionals() {
        let Ok(body) = serde_json::from_str::<CreditPointsRequest>(
            r#"{"tipo":"CREDITO","valor_reais":2.5,"origem":"COMPRA"}"#,
        ) else {
            panic!("body should parse");
        };
        let request = body.into_request(7, 42);
        assert_eq!(request.customer_id, 7);
        assert_eq!(request.actor, 42);
        assert_eq!(request.points, None);
        assert_eq!(request.currency_amount, Some(2.5));
        assert_eq!(request.origin.as_deref(), Some("COMPRA"));
    }

    #[test]
    fn credit_body_requires_tipo() {
        assert!(serde_json::from_str::<CreditPointsRequest>(r#"{"pontos":10}"#).is_err());
    }
}
