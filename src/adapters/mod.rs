//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `http` - Axum routes for gateway webhooks and operator queries
//! - `postgres` - PostgreSQL subscription store and dedup ledger
//! - `memory` - In-memory store and recording notifier
//! - `entitlement` - Entitlement notifiers (log-only, HTTP callback)

pub mod entitlement;
pub mod http;
pub mod memory;
pub mod postgres;

pub use entitlement::{HttpEntitlementNotifier, LoggingEntitlementNotifier};
pub use memory::{InMemorySubscriptionStore, RecordingEntitlementNotifier};
pub use postgres::PostgresSubscriptionStore;
