//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod billing;

pub use billing::{
    GatewayRegistry, GatewayStrategy, GetSubscriptionHandler, GetSubscriptionQuery,
    GetSubscriptionResult, IdempotencyGuard, PurgeDedupLedgerCommand, PurgeDedupLedgerHandler,
    ReconcilePaymentNotificationCommand, ReconcilePaymentNotificationHandler,
};
