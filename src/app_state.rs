//! Shared application state injected into all Axum handlers.

use std::sync::Arc;

use crate::service::LedgerService;

/// Shared application state available to all handlers via Axum's
/// `State` extractor.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Ledger service for all business logic.
    pub ledger: Arc<LedgerService>,
}

impl AppState {
    /// Wraps the service.
    #[must_use]
    pub const fn new(ledger: Arc<LedgerService>) -> Self {
        Self { ledger }
    }
}
