//! In-memory adapters.
//!
//! Back the service in local development and drive the tests.

mod entitlement_notifier;
mod subscription_store;

pub use entitlement_notifier::{EntitlementCall, RecordingEntitlementNotifier};
pub use subscription_store::InMemorySubscriptionStore;
