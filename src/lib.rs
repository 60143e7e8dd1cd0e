//! Payment Reconciler - premium subscription state from payment gateway webhooks
//!
//! Authenticates notifications from two gateways, normalizes them into
//! payment events, and applies each event to the owning user's subscription
//! exactly once.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
