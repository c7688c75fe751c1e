//! Domain layer: value types, read models, and the event system.
//!
//! This module holds the ledger's core vocabulary: tenants, movements,
//! redemption codes and their minting, the records the stores return, and
//! the event bus that carries committed changes to the notifier.

pub mod customer;
pub mod event_bus;
pub mod ledger_event;
pub mod movement;
pub mod redemption;
pub mod redemption_code;
pub mod reward_item;
pub mod tenant;

pub use customer::CustomerSnapshot;
pub use event_bus::EventBus;
pub use ledger_event::LedgerEvent;
pub use movement::{Movement, MovementKind};
pub use redemption::{
    CodeLookup, ConsumeOutcome, PendingCode, Redemption, RedemptionDetail, RedemptionStatus,
};
pub use redemption_code::{CodeGenerator, CodeMinter, RandomCodeGenerator, RedemptionCode};
pub use reward_item::RewardItem;
pub use tenant::Tenant;
