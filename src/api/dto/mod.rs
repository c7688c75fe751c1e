//! Data Transfer Objects for REST request/response serialization.
//!
//! Field names follow the Portuguese wire contract shared with the rest
//! of the loyalty backend.

pub mod common_dto;
pub mod customer_dto;
pub mod ledger_dto;
pub mod redemption_dto;

pub use common_dto::*;
pub use customer_dto::*;
pub use ledger_dto::*;
pub use redemption_dto::*;
