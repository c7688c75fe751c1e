//! Reward catalog entries.

use serde::Serialize;

/// An item customers can redeem points for. Read-only to the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardItem {
    /// Item identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Cost in points. `None` or non-positive means the item is not
    /// redeemable.
    pub cost: Option<i64>,
    /// Long description.
    pub description: Option<String>,
    /// Image URL.
    pub image: Option<String>,
    /// `true` when the item is shipped instead of picked up in store.
    pub remote_fulfilment: bool,
}

impl RewardItem {
    /// Returns the cost if the item can be redeemed.
    #[must_use]
    pub fn redeemable_cost(&self) -> Option<i64> {
        self.cost.filter(|cost| *cost > 0)
    }
}
