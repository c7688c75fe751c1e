//! Service layer: business logic orchestration.
//!
//! [`LedgerService`] validates requests, runs each ledger operation as one
//! store transaction, and publishes the outcome through the
//! [`super::domain::EventBus`].

pub mod ledger_service;

pub use ledger_service::{CreditRequest, LedgerService, RedeemRequest, RewardsSummary};
