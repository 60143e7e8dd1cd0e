//! payment-reconciler binary.
//!
//! Loads configuration, wires adapters into the reconciliation handler and
//! serves the webhook endpoints until Ctrl-C.

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use payment_reconciler::adapters::http::{app, BillingAppState};
use payment_reconciler::adapters::{
    HttpEntitlementNotifier, InMemorySubscriptionStore, LoggingEntitlementNotifier,
    PostgresSubscriptionStore,
};
use payment_reconciler::application::{
    GatewayRegistry, IdempotencyGuard, PurgeDedupLedgerCommand, PurgeDedupLedgerHandler,
    ReconcilePaymentNotificationHandler,
};
use payment_reconciler::config::{AppConfig, DatabaseConfig, EntitlementConfig, GatewaysConfig};
use payment_reconciler::domain::foundation::Timestamp;
use payment_reconciler::ports::{DedupLedger, EntitlementNotifier, SubscriptionStore};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let (store, ledger) = connect_store(&config.database).await?;
    let registry = Arc::new(build_registry(&config.gateways));
    let notifier = build_notifier(&config.entitlement)?;

    let reconciler = ReconcilePaymentNotificationHandler::new(
        registry,
        store.clone(),
        IdempotencyGuard::new(store.clone(), ledger.clone()),
        notifier,
        config.plan.reference_codec(),
        config.plan.terms()?,
    );

    spawn_ledger_purge(
        PurgeDedupLedgerHandler::new(ledger, config.ledger.retention_days),
        config.ledger.purge_interval(),
    );

    let state = BillingAppState {
        reconciler: Arc::new(reconciler),
        subscription_store: store,
    };
    let router = app(state, config.server.request_timeout());

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.is_production() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn connect_store(
    config: &DatabaseConfig,
) -> Result<(Arc<dyn SubscriptionStore>, Arc<dyn DedupLedger>), BoxError> {
    if !config.is_configured() {
        tracing::warn!("No database configured; using in-memory subscription store");
        let store = Arc::new(InMemorySubscriptionStore::new());
        let ledger: Arc<dyn DedupLedger> = store.clone();
        return Ok((store, ledger));
    }

    let pool = config.pool_options().connect(&config.url).await?;
    tracing::info!(max_connections = config.max_connections, "Connected to PostgreSQL");

    if config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
        tracing::info!("Database migrations applied");
    }

    let store = Arc::new(PostgresSubscriptionStore::new(pool));
    let ledger: Arc<dyn DedupLedger> = store.clone();
    Ok((store, ledger))
}

fn build_registry(config: &GatewaysConfig) -> GatewayRegistry {
    let mut registry = GatewayRegistry::new();
    if let Some(server_key) = config.gateway_a_secret() {
        registry = registry.with_gateway_a(server_key.clone(), config.gateway_a_utc_offset_hours);
    } else {
        tracing::warn!("GatewayA not configured; its notifications will be rejected");
    }
    if let Some(token) = config.gateway_b_secret() {
        registry = registry.with_gateway_b(token.clone());
    } else {
        tracing::warn!("GatewayB not configured; its notifications will be rejected");
    }
    registry
}

fn build_notifier(config: &EntitlementConfig) -> Result<Arc<dyn EntitlementNotifier>, BoxError> {
    match &config.callback_url {
        Some(url) => {
            tracing::info!(url = %url, "Entitlement changes go to HTTP callback");
            Ok(Arc::new(HttpEntitlementNotifier::new(
                url.clone(),
                config.callback_timeout(),
                config.callback_bearer_token.clone(),
            )?))
        }
        None => Ok(Arc::new(LoggingEntitlementNotifier::new())),
    }
}

fn spawn_ledger_purge(handler: PurgeDedupLedgerHandler, every: std::time::Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            let cmd = PurgeDedupLedgerCommand {
                now: Timestamp::now(),
            };
            if let Err(e) = handler.handle(cmd).await {
                tracing::error!(error = %e, "Dedup ledger purge failed");
            }
        }
    });
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
