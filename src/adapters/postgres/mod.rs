//! PostgreSQL adapters - Database implementations for repository ports.
//!
//! - `PostgresSubscriptionStore` - Subscription records and dedup ledger

mod subscription_store;

pub use subscription_store::PostgresSubscriptionStore;
