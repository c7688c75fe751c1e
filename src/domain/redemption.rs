//! Issued redemption codes and the read models built around them.
//!
//! A [`Redemption`] moves through exactly one transition:
//!
//! ```text
//! ISSUED (used = false) --consume--> CONSUMED (used = true, terminal)
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::customer::CustomerSnapshot;
use super::movement::Movement;
use super::redemption_code::RedemptionCode;
use super::reward_item::RewardItem;

/// Delivery status derived from the used flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum RedemptionStatus {
    /// Code issued, reward not handed over yet.
    #[serde(rename = "pendente")]
    Pending,
    /// Code consumed, reward delivered.
    #[serde(rename = "entregue")]
    Delivered,
}

/// A row of the redemption code registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Redemption {
    /// Registry row identifier.
    pub id: i64,
    /// Owning customer.
    pub customer_id: i64,
    /// Redeemed reward item.
    pub reward_item_id: i64,
    /// Debit movement that paid for the item.
    pub movement_id: Option<i64>,
    /// The code itself.
    pub code: RedemptionCode,
    /// Tenant name, stored in-row.
    pub tenant: String,
    /// Whether the code was consumed.
    pub used: bool,
    /// User who issued the code.
    pub created_by: i64,
    /// Issue timestamp.
    pub created_at: DateTime<Utc>,
}

impl Redemption {
    /// Delivery status of this redemption.
    #[must_use]
    pub const fn status(&self) -> RedemptionStatus {
        if self.used {
            RedemptionStatus::Delivered
        } else {
            RedemptionStatus::Pending
        }
    }
}

/// Result of looking a code up by its value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeLookup {
    /// Matched registry row.
    pub redemption: Redemption,
    /// Owner's display name.
    pub customer_name: String,
    /// Owner's current balance.
    pub customer_balance: i64,
    /// Item name, if the item still exists.
    pub item_name: Option<String>,
}

/// Newest unused code for a (customer, item) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingCode {
    /// Matched registry row.
    pub redemption: Redemption,
    /// Owner's current balance.
    pub current_balance: i64,
    /// Points of the linked debit movement.
    pub movement_points: Option<i64>,
    /// Balance right after the linked debit movement.
    pub movement_resulting_balance: Option<i64>,
}

/// Full view of one redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedemptionDetail {
    /// Registry row.
    pub redemption: Redemption,
    /// Owning customer.
    pub customer: CustomerSnapshot,
    /// Redeemed item, if it still exists.
    pub item: Option<RewardItem>,
    /// Linked debit movement, if any.
    pub movement: Option<Movement>,
}

/// How a consume attempt resolved at the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// The code flipped from unused to used in this call.
    Consumed(Redemption),
    /// No code with that value exists.
    Missing,
    /// The code had already been consumed. Nothing was written.
    AlreadyUsed(Redemption),
    /// The code belongs to a different customer. Nothing was written.
    OwnedByOther(Redemption),
}
