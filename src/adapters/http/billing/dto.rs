//! HTTP DTOs (Data Transfer Objects) for billing endpoints.

use serde::Serialize;

use crate::domain::billing::{Outcome, SubscriptionRecord};
use crate::domain::foundation::Timestamp;

// ════════════════════════════════════════════════════════════════════════════════
// Response DTOs
// ════════════════════════════════════════════════════════════════════════════════

/// Acknowledgement returned to a gateway.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct OutcomeResponse {
    /// `accepted`, `duplicate_ignored`, `rejected` or `faulted`.
    pub outcome: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl From<&Outcome> for OutcomeResponse {
    fn from(outcome: &Outcome) -> Self {
        Self {
            outcome: outcome.as_str().to_string(),
            reason: outcome.reason().map(str::to_string),
        }
    }
}

/// Stored subscription, for operators.
#[derive(Debug, Clone, Serialize)]
pub struct SubscriptionResponse {
    pub user_id: String,
    pub status: String,
    pub entitled: bool,
    pub current_period_start: Option<Timestamp>,
    pub current_period_end: Option<Timestamp>,
    pub last_applied_event_id: Option<String>,
    pub last_applied_gateway: Option<String>,
    pub updated_at: Timestamp,
}

impl From<SubscriptionRecord> for SubscriptionResponse {
    fn from(record: SubscriptionRecord) -> Self {
        Self {
            entitled: record.is_entitled(),
            user_id: record.user_id.to_string(),
            status: record.status.as_str().to_string(),
            current_period_start: record.current_period_start,
            current_period_end: record.current_period_end,
            last_applied_event_id: record.last_applied_event_id,
            last_applied_gateway: record.last_applied_gateway.map(|g| g.as_str().to_string()),
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Standard error response.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::{EventKind, Gateway, LedgerKey, SubscriptionMutation};
    use crate::domain::foundation::UserId;

    #[test]
    fn accepted_outcome_omits_reason() {
        let json = serde_json::to_value(OutcomeResponse::from(&Outcome::Accepted)).unwrap();
        assert_eq!(json, serde_json::json!({ "outcome": "accepted" }));
    }

    #[test]
    fn rejected_outcome_carries_reason() {
        let response = OutcomeResponse::from(&Outcome::Rejected("bad signature".to_string()));
        let json = serde_json::to_value(response).unwrap();
        assert_eq!(
            json,
            serde_json::json!({ "outcome": "rejected", "reason": "bad signature" })
        );
    }

    #[test]
    fn subscription_response_from_record() {
        let user = UserId::new("u1").unwrap();
        let record = SubscriptionMutation {
            kind: EventKind::Paid,
            occurred_at: Timestamp::now(),
            billing_cycle_days: 30,
        }
        .apply(&user, None, &LedgerKey::new(Gateway::GatewayA, "tx:settlement"))
        .record;

        let response = SubscriptionResponse::from(record);

        assert_eq!(response.status, "active");
        assert!(response.entitled);
        assert_eq!(response.last_applied_gateway.as_deref(), Some("gateway_a"));
    }
}
