//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Persistence Ports
//!
//! - `SubscriptionStore` - Subscription records, mutated transactionally
//! - `DedupLedger` - Applied-event ledger (read side + retention)
//!
//! ## Outbound Ports
//!
//! - `EntitlementNotifier` - Premium flag updates for the product

mod dedup_ledger;
mod entitlement_notifier;
mod subscription_store;

pub use dedup_ledger::DedupLedger;
pub use entitlement_notifier::EntitlementNotifier;
pub use subscription_store::{ApplyResult, SubscriptionStore};
