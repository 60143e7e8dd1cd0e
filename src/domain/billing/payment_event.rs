//! Canonical, gateway-agnostic payment event.

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::Timestamp;

use super::{Gateway, LedgerKey};

/// What a notification means for the subscription lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Money was collected for the plan.
    Paid,
    /// The invoice lapsed without payment.
    Expired,
    /// A charge was declined, cancelled, or otherwise failed.
    PaymentFailed,
    /// A recurring plan was set up; no money has moved yet.
    RecurringCreated,
    /// Authenticated but meaningless for the lifecycle (pending, challenge,
    /// or a status string we do not map).
    Unknown,
}

impl EventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::Paid => "paid",
            EventKind::Expired => "expired",
            EventKind::PaymentFailed => "payment_failed",
            EventKind::RecurringCreated => "recurring_created",
            EventKind::Unknown => "unknown",
        }
    }
}

/// A normalized payment notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentEvent {
    /// Id the gateway assigned to this specific notification.
    pub gateway_event_id: String,

    /// Correlation string chosen at invoice creation; decodes to a user.
    pub external_reference: String,

    pub kind: EventKind,

    pub amount: BigDecimal,

    pub currency: String,

    pub occurred_at: Timestamp,

    pub gateway: Gateway,
}

impl PaymentEvent {
    /// De-duplication key for this event.
    pub fn ledger_key(&self) -> LedgerKey {
        LedgerKey::new(self.gateway, self.gateway_event_id.clone())
    }
}
