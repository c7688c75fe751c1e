//! Outbound notifications to the communications service.
//!
//! The dispatcher subscribes to the [`crate::domain::EventBus`] and turns
//! committed ledger events into `POST {base}/{tenant}/disparo-automatico`
//! calls. Delivery is best-effort: failures are retried with backoff, then
//! logged and dropped. They never affect a ledger operation.

pub mod client;
pub mod dispatcher;

pub use client::{
    CommunicationsClient, NotificationKind, NotificationPayload, NotifiedCustomer, NotifierConfig,
    NotifyError,
};
pub use dispatcher::{notification_for, spawn_dispatcher};
