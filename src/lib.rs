//! # loyalty-ledger
//!
//! Points ledger and redemption-code engine for a multi-tenant loyalty
//! backend.
//!
//! Each tenant (a merchant) owns its own PostgreSQL schema. Customers earn
//! points through credits and spend them on catalog items; every redemption
//! debits the balance and issues a single-use 5-character code in the same
//! transaction. Committed operations are published on an in-process event
//! bus, from which a dispatcher sends best-effort notifications to the
//! communications service.
//!
//! ## Architecture
//!
//! ```text
//! Clients (HTTP)
//!     │
//!     ├── REST Handlers (api/)
//!     │
//!     ├── LedgerService (service/)
//!     ├── EventBus (domain/) ──► notification dispatcher (notify/)
//!     │
//!     └── LedgerStore (persistence/)
//!           ├── PostgreSQL, one schema per tenant
//!           └── in-memory
//! ```

pub mod api;
pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod persistence;
pub mod service;
