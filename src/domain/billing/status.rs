//! Subscription status state machine.
//!
//! The lifecycle is driven entirely by normalized gateway events. There
//! is no programmatic terminal state: a user can always pay again.

use crate::domain::foundation::StateMachine;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::EventKind;

/// Subscription status as stored on the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    /// No subscription activity yet.
    #[default]
    None,

    /// Recurring plan set up, first charge not yet collected.
    Pending,

    /// Paid and within the current period. The only entitled state.
    Active,

    /// Invoice lapsed without payment.
    Expired,

    /// Last charge was declined or cancelled.
    PaymentFailed,
}

impl SubscriptionStatus {
    /// Returns true if this status grants premium access.
    pub fn grants_entitlement(&self) -> bool {
        matches!(self, SubscriptionStatus::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::None => "none",
            SubscriptionStatus::Pending => "pending",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::Expired => "expired",
            SubscriptionStatus::PaymentFailed => "payment_failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "none" => Some(SubscriptionStatus::None),
            "pending" => Some(SubscriptionStatus::Pending),
            "active" => Some(SubscriptionStatus::Active),
            "expired" => Some(SubscriptionStatus::Expired),
            "payment_failed" => Some(SubscriptionStatus::PaymentFailed),
            _ => Option::None,
        }
    }

    /// Computes the status after applying an event of `kind`.
    ///
    /// Returns `None` for `EventKind::Unknown`, which never transitions.
    pub fn next(self, kind: EventKind) -> Option<SubscriptionStatus> {
        use SubscriptionStatus as S;
        let next = match kind {
            EventKind::Paid => S::Active,
            EventKind::Expired => S::Expired,
            EventKind::PaymentFailed => S::PaymentFailed,
            EventKind::RecurringCreated => match self {
                S::None | S::Pending => S::Pending,
                other => other,
            },
            EventKind::Unknown => return Option::None,
        };
        Some(next)
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl StateMachine for SubscriptionStatus {
    fn can_transition_to(&self, target: &Self) -> bool {
        use SubscriptionStatus as S;
        matches!(
            (self, target),
            // Any state can be paid, lapse, or fail
            (_, S::Active)
                | (_, S::Expired)
                | (_, S::PaymentFailed)
            // Recurring setup
                | (S::None, S::Pending)
                | (S::Pending, S::Pending)
        )
    }

    fn valid_transitions(&self) -> Vec<Self> {
        use SubscriptionStatus as S;
        match self {
            S::None | S::Pending => vec![S::Pending, S::Active, S::Expired, S::PaymentFailed],
            S::Active | S::Expired | S::PaymentFailed => {
                vec![S::Active, S::Expired, S::PaymentFailed]
            }
        }
    }
}
