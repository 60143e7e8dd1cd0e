//! ReconcilePaymentNotificationHandler - Applies one inbound gateway notification.
//!
//! Every failure is handled here and classified into an [`Outcome`];
//! nothing propagates past this handler.

use std::sync::Arc;

use http::HeaderMap;

use crate::domain::billing::{
    classify, AppliedTransition, EventKind, Gateway, NormalizationError, OrderReferenceCodec,
    Outcome, PaymentEvent, PlanTerms, PriceDiscrepancy, ReconcileError, SubscriptionMutation,
};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{ApplyResult, EntitlementNotifier, SubscriptionStore};

use super::{GatewayRegistry, IdempotencyGuard};

/// Bytes of the raw body kept in authentication-failure logs.
const PAYLOAD_EXCERPT_BYTES: usize = 256;

/// Command to reconcile a payment notification.
#[derive(Debug, Clone)]
pub struct ReconcilePaymentNotificationCommand {
    /// Gateway fixed by the route; `None` to infer it from the request.
    pub gateway: Option<Gateway>,
    /// Raw request body, exactly as received.
    pub raw_body: Vec<u8>,
    pub headers: HeaderMap,
}

/// Handler for inbound payment notifications.
pub struct ReconcilePaymentNotificationHandler {
    registry: Arc<GatewayRegistry>,
    store: Arc<dyn SubscriptionStore>,
    guard: IdempotencyGuard,
    notifier: Arc<dyn EntitlementNotifier>,
    codec: OrderReferenceCodec,
    plan: PlanTerms,
}

impl ReconcilePaymentNotificationHandler {
    pub fn new(
        registry: Arc<GatewayRegistry>,
        store: Arc<dyn SubscriptionStore>,
        guard: IdempotencyGuard,
        notifier: Arc<dyn EntitlementNotifier>,
        codec: OrderReferenceCodec,
        plan: PlanTerms,
    ) -> Self {
        Self {
            registry,
            store,
            guard,
            notifier,
            codec,
            plan,
        }
    }

    pub async fn handle(&self, cmd: ReconcilePaymentNotificationCommand) -> Outcome {
        match self.reconcile(&cmd, Timestamp::now()).await {
            Ok(outcome) => outcome,
            Err(err) => {
                log_failure(&err, &cmd.raw_body);
                err.into_outcome()
            }
        }
    }

    async fn reconcile(
        &self,
        cmd: &ReconcilePaymentNotificationCommand,
        received_at: Timestamp,
    ) -> Result<Outcome, ReconcileError> {
        // 1. Identify and authenticate the sender
        let gateway = cmd
            .gateway
            .or_else(|| classify(&cmd.headers, &cmd.raw_body))
            .ok_or(ReconcileError::UnknownGateway)?;
        let strategy = self
            .registry
            .get(gateway)
            .ok_or(ReconcileError::GatewayNotConfigured(gateway))?;
        if !strategy.verify(&cmd.raw_body, &cmd.headers) {
            return Err(ReconcileError::InvalidSignature(gateway));
        }

        // 2. Normalize
        let body: serde_json::Value = serde_json::from_slice(&cmd.raw_body)
            .map_err(|e| NormalizationError::MalformedPayload(e.to_string()))?;
        let event = strategy.normalizer().normalize(&body, received_at)?;

        let Some(mutation) = SubscriptionMutation::from_event(&event, self.plan.billing_cycle_days)
        else {
            tracing::info!(
                gateway = %gateway,
                event_id = %event.gateway_event_id,
                reference = %event.external_reference,
                "Acknowledging notification with unmapped status"
            );
            return Ok(Outcome::Accepted);
        };

        // 3. Attribute to a user
        let user_id = self.codec.decode(&event.external_reference)?;

        // 4. Skip known duplicates
        let key = event.ledger_key();
        if !self.guard.should_process(&user_id, &key).await? {
            tracing::debug!(ledger_key = %key, user_id = %user_id, "Duplicate notification ignored");
            return Ok(Outcome::DuplicateIgnored);
        }

        if event.kind == EventKind::Paid {
            self.check_price(&event, &user_id);
        }

        // 5. Persist record + ledger entry atomically
        let applied = match self.store.transactionally_apply(&user_id, &mutation, &key).await? {
            ApplyResult::Applied(applied) => applied,
            ApplyResult::Duplicate => {
                tracing::debug!(
                    ledger_key = %key,
                    user_id = %user_id,
                    "Duplicate notification lost the ledger race"
                );
                return Ok(Outcome::DuplicateIgnored);
            }
        };

        tracing::info!(
            user_id = %user_id,
            gateway = %gateway,
            event_id = %event.gateway_event_id,
            kind = event.kind.as_str(),
            previous_status = %applied.previous,
            new_status = %applied.record.status,
            "Payment notification applied"
        );

        // 6. Tell the entitlement consumer
        self.notify(&user_id, event.kind, &applied).await;

        Ok(Outcome::Accepted)
    }

    fn check_price(&self, event: &PaymentEvent, user_id: &UserId) {
        match self.plan.check(event) {
            Some(PriceDiscrepancy::Underpaid { expected }) => tracing::warn!(
                user_id = %user_id,
                event_id = %event.gateway_event_id,
                amount = %event.amount,
                expected = %expected,
                "Paid amount below plan price; applying anyway"
            ),
            Some(PriceDiscrepancy::CurrencyMismatch { expected }) => tracing::warn!(
                user_id = %user_id,
                event_id = %event.gateway_event_id,
                currency = %event.currency,
                expected = %expected,
                "Paid currency differs from plan; applying anyway"
            ),
            None => {}
        }
    }

    async fn notify(&self, user_id: &UserId, kind: EventKind, applied: &AppliedTransition) {
        let (active, expires_at) = match kind {
            EventKind::Paid => (true, applied.record.current_period_end),
            EventKind::Expired | EventKind::PaymentFailed => (false, None),
            EventKind::RecurringCreated | EventKind::Unknown => return,
        };

        if let Err(e) = self.notifier.set_premium(user_id, active, expires_at).await {
            tracing::error!(
                user_id = %user_id,
                active,
                error = %e,
                "Entitlement notification failed; record already committed"
            );
        }
    }
}

fn log_failure(err: &ReconcileError, raw_body: &[u8]) {
    match err {
        ReconcileError::InvalidSignature(gateway) => tracing::warn!(
            gateway = %gateway,
            payload = %excerpt(raw_body),
            "Rejected notification with bad signature"
        ),
        ReconcileError::UnknownGateway => tracing::warn!(
            payload = %excerpt(raw_body),
            "Rejected notification from unknown gateway"
        ),
        ReconcileError::GatewayNotConfigured(gateway) => tracing::warn!(
            gateway = %gateway,
            "Rejected notification for unconfigured gateway"
        ),
        ReconcileError::Normalization(e) => {
            tracing::error!(error = %e, "Authenticated notification could not be normalized")
        }
        ReconcileError::Decode(e) => {
            tracing::error!(error = %e, "Authenticated notification needs manual reconciliation")
        }
        ReconcileError::Store(e) => {
            tracing::error!(error = %e, "Subscription transaction did not commit")
        }
    }
}

fn excerpt(raw_body: &[u8]) -> String {
    let end = raw_body.len().min(PAYLOAD_EXCERPT_BYTES);
    String::from_utf8_lossy(&raw_body[..end]).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemorySubscriptionStore, RecordingEntitlementNotifier};
    use crate::domain::billing::{canonical_digest, SubscriptionStatus};
    use http::HeaderValue;
    use secrecy::SecretString;

    const SERVER_KEY: &str = "server-key";
    const CALLBACK_TOKEN: &str = "callback-token";

    struct Fixture {
        store: Arc<InMemorySubscriptionStore>,
        notifier: Arc<RecordingEntitlementNotifier>,
        handler: ReconcilePaymentNotificationHandler,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let notifier = Arc::new(RecordingEntitlementNotifier::new());
        let registry = Arc::new(
            GatewayRegistry::new()
                .with_gateway_a(SecretString::new(SERVER_KEY.to_string()), 7)
                .with_gateway_b(SecretString::new(CALLBACK_TOKEN.to_string())),
        );
        let handler = ReconcilePaymentNotificationHandler::new(
            registry,
            store.clone(),
            IdempotencyGuard::new(store.clone(), store.clone()),
            notifier.clone(),
            OrderReferenceCodec::default(),
            PlanTerms::default(),
        );
        Fixture {
            store,
            notifier,
            handler,
        }
    }

    fn gateway_a(order_id: &str, status: &str) -> ReconcilePaymentNotificationCommand {
        let signature = canonical_digest(order_id, "200", "99000.00", SERVER_KEY);
        let body = format!(
            r#"{{"transaction_id":"tx-1","order_id":"{}","status_code":"200","gross_amount":"99000.00","transaction_status":"{}","transaction_time":"2024-01-01 07:00:00","signature_key":"{}"}}"#,
            order_id, status, signature
        );
        ReconcilePaymentNotificationCommand {
            gateway: None,
            raw_body: body.into_bytes(),
            headers: HeaderMap::new(),
        }
    }

    fn gateway_b(invoice_id: &str, external_id: &str, status: &str) -> ReconcilePaymentNotificationCommand {
        let body = serde_json::json!({
            "id": invoice_id,
            "external_id": external_id,
            "status": status,
            "amount": 99000,
            "paid_at": "2024-01-01T00:00:00Z"
        });
        let mut headers = HeaderMap::new();
        headers.insert("x-callback-token", HeaderValue::from_static(CALLBACK_TOKEN));
        ReconcilePaymentNotificationCommand {
            gateway: None,
            raw_body: serde_json::to_vec(&body).unwrap(),
            headers,
        }
    }

    fn user(id: &str) -> UserId {
        UserId::new(id).unwrap()
    }

    #[tokio::test]
    async fn paid_notification_activates_and_notifies() {
        let f = fixture();

        let outcome = f.handler.handle(gateway_a("premium_subscription_u1", "settlement")).await;

        assert_eq!(outcome, Outcome::Accepted);
        let record = f.store.get_by_user(&user("u1")).await.unwrap().unwrap();
        assert_eq!(record.status, SubscriptionStatus::Active);
        let calls = f.notifier.calls();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].active);
        assert_eq!(calls[0].expires_at, record.current_period_end);
    }

    #[tokio::test]
    async fn redelivery_is_duplicate_ignored() {
        let f = fixture();
        f.handler.handle(gateway_b("inv_1", "premium_subscription_u1", "PAID")).await;
        let before = f.store.get_by_user(&user("u1")).await.unwrap();

        let outcome = f.handler.handle(gateway_b("inv_1", "premium_subscription_u1", "PAID")).await;

        assert_eq!(outcome, Outcome::DuplicateIgnored);
        assert_eq!(f.store.get_by_user(&user("u1")).await.unwrap(), before);
        assert_eq!(f.notifier.calls().len(), 1);
    }

    #[tokio::test]
    async fn wrong_token_is_rejected_without_mutation() {
        let f = fixture();
        let mut cmd = gateway_b("inv_1", "premium_subscription_u1", "PAID");
        cmd.headers
            .insert("x-callback-token", HeaderValue::from_static("guess"));

        let outcome = f.handler.handle(cmd).await;

        assert_eq!(outcome, Outcome::Rejected("bad signature".to_string()));
        assert!(f.store.get_by_user(&user("u1")).await.unwrap().is_none());
        assert!(f.notifier.calls().is_empty());
    }

    #[tokio::test]
    async fn unclassifiable_request_is_rejected() {
        let f = fixture();
        let cmd = ReconcilePaymentNotificationCommand {
            gateway: None,
            raw_body: br#"{"external_id":"premium_subscription_u1","status":"PAID"}"#.to_vec(),
            headers: HeaderMap::new(),
        };

        assert_eq!(
            f.handler.handle(cmd).await,
            Outcome::Rejected("unknown gateway".to_string())
        );
    }

    #[tokio::test]
    async fn unregistered_gateway_is_rejected() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let handler = ReconcilePaymentNotificationHandler::new(
            Arc::new(GatewayRegistry::new().with_gateway_b(SecretString::new("t".to_string()))),
            store.clone(),
            IdempotencyGuard::new(store.clone(), store.clone()),
            Arc::new(RecordingEntitlementNotifier::new()),
            OrderReferenceCodec::default(),
            PlanTerms::default(),
        );

        let outcome = handler.handle(gateway_a("premium_subscription_u1", "settlement")).await;
        assert_eq!(outcome, Outcome::Rejected("gateway not configured".to_string()));
    }

    #[tokio::test]
    async fn explicit_route_gateway_overrides_classification() {
        let f = fixture();
        let mut cmd = gateway_a("premium_subscription_u1", "settlement");
        cmd.gateway = Some(Gateway::GatewayB);

        assert_eq!(
            f.handler.handle(cmd).await,
            Outcome::Rejected("bad signature".to_string())
        );
    }

    #[tokio::test]
    async fn unknown_status_is_accepted_without_effect() {
        let f = fixture();

        let outcome = f.handler.handle(gateway_a("premium_subscription_u1", "authorize")).await;

        assert_eq!(outcome, Outcome::Accepted);
        assert!(f.store.get_by_user(&user("u1")).await.unwrap().is_none());
        assert!(f.notifier.calls().is_empty());
    }

    #[tokio::test]
    async fn empty_user_reference_faults() {
        let f = fixture();

        let outcome = f.handler.handle(gateway_b("inv_1", "premium_subscription_", "PAID")).await;

        assert!(matches!(outcome, Outcome::Faulted(ref r) if r.starts_with("bad reference")));
        assert!(f.notifier.calls().is_empty());
    }

    #[tokio::test]
    async fn unparseable_authenticated_body_faults() {
        let f = fixture();
        let mut headers = HeaderMap::new();
        headers.insert("x-callback-token", HeaderValue::from_static(CALLBACK_TOKEN));
        let cmd = ReconcilePaymentNotificationCommand {
            gateway: None,
            raw_body: b"not json".to_vec(),
            headers,
        };

        assert!(matches!(f.handler.handle(cmd).await, Outcome::Faulted(_)));
    }

    #[tokio::test]
    async fn store_failure_faults() {
        let f = fixture();
        f.store.set_failing(true);

        let outcome = f.handler.handle(gateway_b("inv_1", "premium_subscription_u1", "PAID")).await;

        assert!(matches!(outcome, Outcome::Faulted(_)));
        assert!(f.notifier.calls().is_empty());
    }

    #[tokio::test]
    async fn notifier_failure_does_not_change_outcome() {
        let f = fixture();
        f.notifier.set_failing(true);

        let outcome = f.handler.handle(gateway_b("inv_1", "premium_subscription_u1", "PAID")).await;

        assert_eq!(outcome, Outcome::Accepted);
        let record = f.store.get_by_user(&user("u1")).await.unwrap().unwrap();
        assert_eq!(record.status, SubscriptionStatus::Active);
    }

    #[tokio::test]
    async fn expiry_clears_entitlement() {
        let f = fixture();
        f.handler.handle(gateway_b("inv_1", "premium_subscription_u1", "PAID")).await;

        let outcome = f.handler.handle(gateway_b("inv_2", "premium_subscription_u1", "EXPIRED")).await;

        assert_eq!(outcome, Outcome::Accepted);
        let calls = f.notifier.calls();
        assert_eq!(calls.len(), 2);
        assert!(!calls[1].active);
        assert_eq!(calls[1].expires_at, None);
    }

    #[tokio::test]
    async fn recurring_activation_marks_pending_without_notification() {
        let f = fixture();
        let body = serde_json::json!({
            "event": "recurring.plan.activated",
            "id": "evt_1",
            "created": "2024-01-01T00:00:00Z",
            "data": { "id": "plan_1", "reference_id": "premium_subscription_u9", "amount": 99000 }
        });
        let mut headers = HeaderMap::new();
        headers.insert("x-callback-token", HeaderValue::from_static(CALLBACK_TOKEN));
        let cmd = ReconcilePaymentNotificationCommand {
            gateway: Some(Gateway::GatewayB),
            raw_body: serde_json::to_vec(&body).unwrap(),
            headers,
        };

        assert_eq!(f.handler.handle(cmd).await, Outcome::Accepted);
        let record = f.store.get_by_user(&user("u9")).await.unwrap().unwrap();
        assert_eq!(record.status, SubscriptionStatus::Pending);
        assert!(f.notifier.calls().is_empty());
    }

    #[tokio::test]
    async fn underpayment_is_still_applied() {
        let f = fixture();
        let body = serde_json::json!({
            "id": "inv_cheap",
            "external_id": "premium_subscription_u1",
            "status": "PAID",
            "paid_amount": 1000
        });
        let mut headers = HeaderMap::new();
        headers.insert("x-callback-token", HeaderValue::from_static(CALLBACK_TOKEN));
        let cmd = ReconcilePaymentNotificationCommand {
            gateway: None,
            raw_body: serde_json::to_vec(&body).unwrap(),
            headers,
        };

        assert_eq!(f.handler.handle(cmd).await, Outcome::Accepted);
        let record = f.store.get_by_user(&user("u1")).await.unwrap().unwrap();
        assert_eq!(record.status, SubscriptionStatus::Active);
    }

    #[test]
    fn excerpt_truncates_and_tolerates_invalid_utf8() {
        let long = vec![b'a'; 1000];
        assert_eq!(excerpt(&long).len(), PAYLOAD_EXCERPT_BYTES);
        assert_eq!(excerpt(b"\xffok"), "\u{fffd}ok");
    }
}
