//! Entitlement notifier adapters.

mod callback;
mod logging;

pub use callback::{EntitlementPayload, HttpEntitlementNotifier};
pub use logging::LoggingEntitlementNotifier;
