//! Subscription record and the mutation applied to it.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

use super::{EventKind, Gateway, LedgerKey, PaymentEvent, SubscriptionStatus};

/// Default billing cycle length.
pub const DEFAULT_BILLING_CYCLE_DAYS: i64 = 30;

/// A user's subscription as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub user_id: UserId,
    pub status: SubscriptionStatus,
    pub current_period_start: Option<Timestamp>,
    pub current_period_end: Option<Timestamp>,
    /// Fast-path duplicate check; the dedup ledger is authoritative.
    pub last_applied_event_id: Option<String>,
    pub last_applied_gateway: Option<Gateway>,
    pub updated_at: Timestamp,
}

impl SubscriptionRecord {
    /// A record that has seen no events.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            status: SubscriptionStatus::None,
            current_period_start: None,
            current_period_end: None,
            last_applied_event_id: None,
            last_applied_gateway: None,
            updated_at: Timestamp::now(),
        }
    }

    /// Whether `key` is the last event applied to this record.
    pub fn last_applied(&self, key: &LedgerKey) -> bool {
        self.last_applied_gateway == Some(key.gateway)
            && self.last_applied_event_id.as_deref() == Some(key.gateway_event_id.as_str())
    }

    /// Premium access right now.
    pub fn is_entitled(&self) -> bool {
        self.status.grants_entitlement()
    }
}

/// Result of applying a mutation: the status before, and the new record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedTransition {
    pub previous: SubscriptionStatus,
    pub record: SubscriptionRecord,
}

impl AppliedTransition {
    pub fn status_changed(&self) -> bool {
        self.previous != self.record.status
    }
}

/// State change derived from one normalized event.
///
/// Built outside the store and applied inside its transaction, after the
/// current row has been locked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionMutation {
    pub kind: EventKind,
    pub occurred_at: Timestamp,
    pub billing_cycle_days: i64,
}

impl SubscriptionMutation {
    /// Returns `None` for events that never transition.
    pub fn from_event(event: &PaymentEvent, billing_cycle_days: i64) -> Option<Self> {
        if event.kind == EventKind::Unknown {
            return None;
        }
        Some(Self {
            kind: event.kind,
            occurred_at: event.occurred_at,
            billing_cycle_days,
        })
    }

    /// Applies the mutation to the current record (if any).
    ///
    /// A `Paid` event always restarts the period from the event time;
    /// periods never stack. Other kinds leave the period untouched.
    pub fn apply(
        &self,
        user_id: &UserId,
        current: Option<SubscriptionRecord>,
        key: &LedgerKey,
    ) -> AppliedTransition {
        let mut record = current.unwrap_or_else(|| SubscriptionRecord::new(user_id.clone()));
        let previous = record.status;

        if let Some(next) = previous.next(self.kind) {
            record.status = next;
        }
        if self.kind == EventKind::Paid {
            record.current_period_start = Some(self.occurred_at);
            record.current_period_end = Some(self.occurred_at.add_days(self.billing_cycle_days));
        }

        record.last_applied_event_id = Some(key.gateway_event_id.clone());
        record.last_applied_gateway = Some(key.gateway);
        record.updated_at = Timestamp::now();

        AppliedTransition { previous, record }
    }
}
