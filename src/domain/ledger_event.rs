//! Domain events emitted after a ledger transaction commits.
//!
//! Events are published through the [`super::EventBus`] and consumed by the
//! notification dispatcher. Publishing happens strictly after commit, so an
//! event always describes durable state.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use super::customer::CustomerSnapshot;
use super::redemption_code::RedemptionCode;
use super::reward_item::RewardItem;
use super::tenant::Tenant;

/// Domain event emitted after every committed ledger mutation.
///
/// `event_id` is unique per event and doubles as an idempotency key for
/// downstream consumers that may see a retried delivery.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event_type", rename_all = "snake_case")]
pub enum LedgerEvent {
    /// Points were added to a balance.
    PointsCredited {
        /// Event identifier.
        event_id: Uuid,
        /// Tenant the customer belongs to.
        tenant: Tenant,
        /// Customer after the credit.
        customer: CustomerSnapshot,
        /// Movement that recorded the credit.
        movement_id: i64,
        /// Points credited.
        points: i64,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// Points were spent on a reward and a code was issued.
    RewardRedeemed {
        /// Event identifier.
        event_id: Uuid,
        /// Tenant the customer belongs to.
        tenant: Tenant,
        /// Customer after the debit.
        customer: CustomerSnapshot,
        /// Redeemed item.
        item: RewardItem,
        /// Debit movement.
        movement_id: i64,
        /// Issued code.
        code: RedemptionCode,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },

    /// A redemption code was consumed.
    CodeConsumed {
        /// Event identifier.
        event_id: Uuid,
        /// Tenant the code belongs to.
        tenant: Tenant,
        /// Code owner.
        customer_id: i64,
        /// Item the code was issued for.
        reward_item_id: i64,
        /// Consumed code.
        code: RedemptionCode,
        /// Commit timestamp.
        timestamp: DateTime<Utc>,
    },
}

impl LedgerEvent {
    /// Returns the event identifier.
    #[must_use]
    pub const fn event_id(&self) -> Uuid {
        match self {
            Self::PointsCredited { event_id, .. }
            | Self::RewardRedeemed { event_id, .. }
            | Self::CodeConsumed { event_id, .. } => *event_id,
        }
    }

    /// Returns the tenant the event belongs to.
    #[must_use]
    pub const fn tenant(&self) -> &Tenant {
        match self {
            Self::PointsCredited { tenant, .. }
            | Self::RewardRedeemed { tenant, .. }
            | Self::CodeConsumed { tenant, .. } => tenant,
        }
    }

    /// Returns the event type as a static string slice.
    #[must_use]
    pub const fn event_type_str(&self) -> &'static str {
        match self {
            Self::PointsCredited { .. } => "points_credited",
            Self::RewardRedeemed { .. } => "reward_redeemed",
            Self::CodeConsumed { .. } => "code_consumed",
        }
    }
}
