//! Event bus subscriber that fans ledger events out as notifications.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::{JoinHandle, JoinSet};

use super::client::{CommunicationsClient, NotificationKind, NotificationPayload, NotifiedCustomer};
use crate::domain::{EventBus, LedgerEvent};

/// Maps a committed event to the notification it triggers, if any.
#[must_use]
pub fn notification_for(event: &LedgerEvent) -> Option<NotificationPayload> {
    match event {
        LedgerEvent::PointsCredited {
            customer, points, ..
        } => Some(NotificationPayload {
            kind: NotificationKind::PointsUpdate,
            customer: NotifiedCustomer {
                id: customer.id,
                full_name: customer.full_name.clone(),
                email: customer.email.clone(),
                points_added: Some(*points),
                total_points: Some(customer.balance),
                ..NotifiedCustomer::default()
            },
        }),
        LedgerEvent::RewardRedeemed {
            customer,
            item,
            code,
            ..
        } => {
            let base = NotifiedCustomer {
                id: customer.id,
                full_name: customer.full_name.clone(),
                email: customer.email.clone(),
                redemption_code: Some(code.to_string()),
                item_name: Some(item.name.clone()),
                balance_after_redemption: Some(customer.balance),
                ..NotifiedCustomer::default()
            };
            let (kind, customer) = if item.remote_fulfilment {
                (
                    NotificationKind::RemoteRedemption,
                    NotifiedCustomer {
                        whatsapp: customer.whatsapp.clone(),
                        item_description: Some(item.description.clone().unwrap_or_default()),
                        item_cost: item.cost,
                        total_points: Some(customer.balance),
                        ..base
                    },
                )
            } else {
                (NotificationKind::Redemption, base)
            };
            Some(NotificationPayload { kind, customer })
        }
        LedgerEvent::CodeConsumed { .. } => None,
    }
}

async fn run(mut events: broadcast::Receiver<LedgerEvent>, client: Arc<CommunicationsClient>) {
    let mut in_flight = JoinSet::new();
    loop {
        tokio::select! {
            received = events.recv() => match received {
                Ok(event) => {
                    let Some(payload) = notification_for(&event) else {
                        continue;
                    };
                    in_flight.spawn(deliver(Arc::clone(&client), event, payload));
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "notification dispatcher lagged behind event bus");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
            Some(_) = in_flight.join_next(), if !in_flight.is_empty() => {}
        }
    }
    if !in_flight.is_empty() {
        tracing::info!(pending = in_flight.len(), "draining notifications");
    }
    while in_flight.join_next().await.is_some() {}
    tracing::debug!("notification dispatcher stopped");
}

async fn deliver(client: Arc<CommunicationsClient>, event: LedgerEvent, payload: NotificationPayload) {
    let tenant = event.tenant();
    let event_id = event.event_id();
    if let Err(err) = client.send(tenant, event_id, &payload).await {
        tracing::error!(
            %tenant,
            %event_id,
            event_type = event.event_type_str(),
            error = %err,
            "notification dropped"
        );
    }
}

/// Subscribes to `bus` and delivers notifications until the bus closes.
///
/// Each notification is sent on its own task so a slow endpoint never
/// blocks the subscriber. Once every bus handle is dropped the returned
/// task finishes the sends still in flight and then completes.
#[must_use]
pub fn spawn_dispatcher(bus: &EventBus, client: CommunicationsClient) -> JoinHandle<()> {
    let events = bus.subscribe();
    tokio::spawn(run(events, Arc::new(client)))
}
