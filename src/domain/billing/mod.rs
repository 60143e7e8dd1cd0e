//! Billing module - payment notification reconciliation.
//!
//! Turns authenticated gateway notifications into subscription state.
//!
//! # Flow
//!
//! classify → verify signature → normalize → decode reference →
//! idempotency check → state transition → persist + notify
//!
//! Everything here is pure; persistence and notification live behind
//! ports.

mod gateway;
mod ledger;
mod normalizer;
mod order_reference;
mod outcome;
mod payment_event;
mod plan;
mod signature;
mod status;
mod subscription;

pub use gateway::{classify, Gateway, CALLBACK_TOKEN_HEADER};
pub use ledger::{DedupLedgerEntry, LedgerKey};
pub use normalizer::{
    GatewayANormalizer, GatewayBNormalizer, NormalizationError, PayloadNormalizer,
    DEFAULT_CURRENCY,
};
pub use order_reference::{
    DecodeError, OrderReferenceCodec, DEFAULT_REFERENCE_PREFIX, REFERENCE_SEPARATOR,
};
pub use outcome::{Outcome, ReconcileError};
pub use payment_event::{EventKind, PaymentEvent};
pub use plan::{PlanTerms, PriceDiscrepancy};
pub use signature::{
    canonical_digest, verify, CallbackTokenVerifier, CanonicalDigestVerifier, SignatureVerifier,
};
pub use status::SubscriptionStatus;
pub use subscription::{
    AppliedTransition, SubscriptionMutation, SubscriptionRecord, DEFAULT_BILLING_CYCLE_DAYS,
};
