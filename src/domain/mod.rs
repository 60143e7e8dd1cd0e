//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `billing` - Gateway notifications, subscription lifecycle, idempotency keys

pub mod billing;
pub mod foundation;
