//! Billing handlers.
//!
//! ## Commands
//! - Reconciling inbound payment notifications
//! - Purging the dedup ledger
//!
//! ## Queries
//! - Get a user's subscription record

mod gateway_registry;
mod get_subscription;
mod idempotency_guard;
mod purge_dedup_ledger;
mod reconcile_payment_notification;

pub use gateway_registry::{GatewayRegistry, GatewayStrategy};
pub use idempotency_guard::IdempotencyGuard;

// Commands
pub use purge_dedup_ledger::{PurgeDedupLedgerCommand, PurgeDedupLedgerHandler};
pub use reconcile_payment_notification::{
    ReconcilePaymentNotificationCommand, ReconcilePaymentNotificationHandler,
};

// Queries
pub use get_subscription::{GetSubscriptionHandler, GetSubscriptionQuery, GetSubscriptionResult};
