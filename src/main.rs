//! loyalty-ledger server entry point.
//!
//! Connects to PostgreSQL, provisions configured tenants, starts the
//! notification dispatcher and serves the REST API.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use loyalty_ledger::api;
use loyalty_ledger::app_state::AppState;
use loyalty_ledger::config::{LedgerConfig, LogFormat};
use loyalty_ledger::domain::EventBus;
use loyalty_ledger::notify::{CommunicationsClient, spawn_dispatcher};
use loyalty_ledger::persistence::{LedgerStore, PostgresLedgerStore, RewardCatalog};
use loyalty_ledger::service::LedgerService;

/// Upper bound on waiting for in-flight notifications at shutdown.
const NOTIFICATION_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = LedgerConfig::from_env().context("loading configuration")?;

    // Initialize tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init(),
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
    }
    tracing::info!(addr = %config.listen_addr, "starting loyalty-ledger");

    // Build persistence layer
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .min_connections(config.database_min_connections)
        .acquire_timeout(Duration::from_secs(config.database_connect_timeout_secs))
        .connect(&config.database_url)
        .await
        .context("connecting to PostgreSQL")?;
    let store = Arc::new(PostgresLedgerStore::new(pool));

    for tenant in &config.provision_tenants {
        store
            .provision(tenant)
            .await
            .with_context(|| format!("provisioning tenant {tenant}"))?;
        tracing::info!(%tenant, "tenant provisioned");
    }

    // Build service layer
    let event_bus = EventBus::new(config.event_bus_capacity);
    let ledger = Arc::new(LedgerService::new(
        Arc::clone(&store) as Arc<dyn LedgerStore>,
        store as Arc<dyn RewardCatalog>,
        event_bus.clone(),
    ));

    // Notifications
    let dispatcher = match config.notifier() {
        Some(notifier) => {
            let client =
                CommunicationsClient::new(notifier).context("building communications client")?;
            Some(spawn_dispatcher(&event_bus, client))
        }
        None => {
            tracing::warn!("COMMUNICATIONS_URL not set, notifications disabled");
            None
        }
    };

    // Build router
    let app = api::build_router()
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.request_timeout_secs,
                ))),
        )
        .with_state(AppState::new(ledger));

    // Start server
    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    tracing::info!(addr = %config.listen_addr, "server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;

    // The router (and with it the service's bus handle) is gone once
    // `serve` returns; dropping the last handle closes the bus.
    drop(event_bus);
    if let Some(handle) = dispatcher {
        match tokio::time::timeout(NOTIFICATION_DRAIN_TIMEOUT, handle).await {
            Ok(Ok(())) => tracing::info!("notifications drained"),
            Ok(Err(err)) => tracing::error!(error = %err, "notification dispatcher failed"),
            Err(_) => tracing::warn!(
                timeout_secs = NOTIFICATION_DRAIN_TIMEOUT.as_secs(),
                "notification drain timed out, pending sends dropped"
            ),
        }
    }
    tracing::info!("loyalty-ledger stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown signal received");
}
