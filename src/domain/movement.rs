//! Ledger movements and credit amount resolution.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::LedgerError;

/// Points granted per monetary unit when crediting by currency amount.
pub const POINTS_PER_CURRENCY_UNIT: i64 = 100;

/// Origin recorded on every redemption debit.
pub const REDEMPTION_ORIGIN: &str = "RESGATE";

/// Direction of a balance change. Stored as `CREDITO` / `DEBITO`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum MovementKind {
    /// Points added to the balance.
    #[serde(rename = "CREDITO")]
    Credit,
    /// Points removed from the balance.
    #[serde(rename = "DEBITO")]
    Debit,
}

impl MovementKind {
    /// Storage and wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "CREDITO",
            Self::Debit => "DEBITO",
        }
    }

    /// Applies `amount` to `balance` in this direction.
    #[must_use]
    pub const fn apply(self, balance: i64, amount: i64) -> i64 {
        match self {
            Self::Credit => balance.saturating_add(amount),
            Self::Debit => balance.saturating_sub(amount),
        }
    }
}

impl fmt::Display for MovementKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CREDITO" => Ok(Self::Credit),
            "DEBITO" => Ok(Self::Debit),
            other => Err(LedgerError::InvalidInput(format!(
                "unknown movement type: {other}"
            ))),
        }
    }
}

/// An immutable row of the movement log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Movement {
    /// Movement identifier.
    pub id: i64,
    /// Customer whose balance changed.
    pub customer_id: i64,
    /// Credit or debit.
    pub kind: MovementKind,
    /// Points moved (always positive).
    pub points: i64,
    /// Balance immediately after this movement.
    pub resulting_balance: i64,
    /// Free-form source label, e.g. `"RESGATE"`.
    pub origin: String,
    /// Store where the movement originated, if any.
    pub store_id: Option<i64>,
    /// Reward item paid for by a debit.
    pub reward_item_id: Option<i64>,
    /// Free-text note.
    pub note: Option<String>,
    /// User who created the movement.
    pub created_by: i64,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// Converts a currency amount to points, flooring at whole points.
///
/// The amount is scaled by [`POINTS_PER_CURRENCY_UNIT`]. A scaled value
/// within 1e-6 of an integer snaps to it, so `0.29` yields 29 rather than
/// the 28 a bare `floor` of `28.999999999999996` would give.
///
/// # Errors
///
/// Returns [`LedgerError::InvalidInput`] for non-finite, non-positive, or
/// out-of-range amounts.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation
)]
pub fn points_from_currency(amount: f64) -> Result<i64, LedgerError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(LedgerError::InvalidInput(
            "valor_reais must be a positive number".to_string(),
        ));
    }
    let scaled = amount * POINTS_PER_CURRENCY_UNIT as f64;
    let nearest = scaled.round();
    let points = if (scaled - nearest).abs() < 1e-6 {
        nearest
    } else {
        scaled.floor()
    };
    if points >= i64::MAX as f64 {
        return Err(LedgerError::InvalidInput(
            "valor_reais is too large".to_string(),
        ));
    }
    Ok(points as i64)
}

/// Resolves the points of a credit request.
///
/// Explicit positive `points` win; otherwise `currency_amount` is
/// converted with [`points_from_currency`].
///
/// # Errors
///
/// Returns [`LedgerError::InvalidInput`] when neither source is usable or
/// the resolved amount is not positive.
pub fn resolve_credit_points(
    points: Option<i64>,
    currency_amount: Option<f64>,
) -> Result<i64, LedgerError> {
    let resolved = match (points, currency_amount) {
        (Some(p), _) if p > 0 => p,
        (_, Some(amount)) => points_from_currency(amount)?,
        (Some(_), None) => {
            return Err(LedgerError::InvalidInput(
                "pontos must be a positive number".to_string(),
            ));
        }
        (None, None) => {
            return Err(LedgerError::InvalidInput(
                "either pontos or valor_reais is required".to_string(),
            ));
        }
    };
    if resolved <= 0 {
        return Err(LedgerError::InvalidInput(
            "credited points must be positive".to_string(),
        ));
    }
    Ok(resolved)
}
