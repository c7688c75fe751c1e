//! REST endpoint handlers organized by resource.

pub mod customer;
pub mod ledger;
pub mod redemption;
pub mod system;

use axum::Router;

use crate::app_state::AppState;

/// Composes all `/clientes` resource routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(ledger::routes())
        .merge(redemption::routes())
        .merge(customer::routes())
}
