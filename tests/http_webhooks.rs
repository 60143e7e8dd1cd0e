//! Integration tests for the billing HTTP endpoints.
//!
//! Requests go through the full router (tracing and timeout layers
//! included) via `tower::ServiceExt::oneshot`.

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use secrecy::SecretString;
use serde_json::{json, Value};
use tower::ServiceExt;

use payment_reconciler::adapters::http::{app, BillingAppState};
use payment_reconciler::adapters::memory::{InMemorySubscriptionStore, RecordingEntitlementNotifier};
use payment_reconciler::application::{
    GatewayRegistry, IdempotencyGuard, ReconcilePaymentNotificationHandler,
};
use payment_reconciler::domain::billing::{canonical_digest, OrderReferenceCodec, PlanTerms};

// =============================================================================
// Test Infrastructure
// =============================================================================

const SERVER_KEY: &str = "server-key";
const CALLBACK_TOKEN: &str = "callback-token";

struct TestApp {
    router: Router,
    store: Arc<InMemorySubscriptionStore>,
    notifier: Arc<RecordingEntitlementNotifier>,
}

fn test_app() -> TestApp {
    let store = Arc::new(InMemorySubscriptionStore::new());
    let notifier = Arc::new(RecordingEntitlementNotifier::new());
    let registry = GatewayRegistry::new()
        .with_gateway_a(SecretString::new(SERVER_KEY.to_string()), 7)
        .with_gateway_b(SecretString::new(CALLBACK_TOKEN.to_string()));
    let reconciler = ReconcilePaymentNotificationHandler::new(
        Arc::new(registry),
        store.clone(),
        IdempotencyGuard::new(store.clone(), store.clone()),
        notifier.clone(),
        OrderReferenceCodec::default(),
        PlanTerms::default(),
    );
    let state = BillingAppState {
        reconciler: Arc::new(reconciler),
        subscription_store: store.clone(),
    };

    TestApp {
        router: app(state, Duration::from_secs(5)),
        store,
        notifier,
    }
}

fn gateway_a_body(order_id: &str, status: &str) -> String {
    let signature = canonical_digest(order_id, "200", "99000.00", SERVER_KEY);
    format!(
        r#"{{"transaction_id":"tx-77","order_id":"{}","status_code":"200","gross_amount":"99000.00","transaction_status":"{}","transaction_time":"2024-05-01 10:00:00","signature_key":"{}"}}"#,
        order_id, status, signature
    )
}

fn gateway_b_body(external_id: &str, status: &str) -> String {
    json!({
        "id": "inv_77",
        "external_id": external_id,
        "status": status,
        "amount": 99000,
        "paid_at": "2024-05-01T03:00:00Z"
    })
    .to_string()
}

fn post(uri: &str, body: String, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("x-callback-token", token);
    }
    builder.body(Body::from(body)).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

// =============================================================================
// Webhooks
// =============================================================================

#[tokio::test]
async fn inferred_gateway_a_notification_is_accepted() {
    let t = test_app();

    let (status, body) = send(
        &t.router,
        post(
            "/webhooks/payments",
            gateway_a_body("premium_subscription_u1", "settlement"),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "outcome": "accepted" }));
    assert_eq!(t.notifier.calls().len(), 1);
}

#[tokio::test]
async fn inferred_gateway_b_notification_is_accepted() {
    let t = test_app();

    let (status, body) = send(
        &t.router,
        post(
            "/webhooks/payments",
            gateway_b_body("premium_subscription_u2", "PAID"),
            Some(CALLBACK_TOKEN),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"], "accepted");
}

#[tokio::test]
async fn redelivery_returns_200_duplicate_ignored() {
    let t = test_app();
    let request = || {
        post(
            "/webhooks/gateway-b",
            gateway_b_body("premium_subscription_u3", "PAID"),
            Some(CALLBACK_TOKEN),
        )
    };

    send(&t.router, request()).await;
    let (status, body) = send(&t.router, request()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "outcome": "duplicate_ignored" }));
    assert_eq!(t.store.ledger_len().await, 1);
}

#[tokio::test]
async fn bad_signature_returns_400() {
    let t = test_app();

    let (status, body) = send(
        &t.router,
        post(
            "/webhooks/gateway-b",
            gateway_b_body("premium_subscription_u4", "PAID"),
            Some("wrong"),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "outcome": "rejected", "reason": "bad signature" }));
    assert!(t.notifier.calls().is_empty());
}

#[tokio::test]
async fn gateway_b_route_without_token_is_rejected() {
    let t = test_app();

    let (status, _) = send(
        &t.router,
        post(
            "/webhooks/gateway-b",
            gateway_b_body("premium_subscription_u5", "PAID"),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unclassifiable_payload_returns_400() {
    let t = test_app();

    let (status, body) = send(
        &t.router,
        post("/webhooks/payments", r#"{"hello":"world"}"#.to_string(), None),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["reason"], "unknown gateway");
}

#[tokio::test]
async fn store_failure_returns_500() {
    let t = test_app();
    t.store.set_failing(true);

    let (status, body) = send(
        &t.router,
        post(
            "/webhooks/gateway-a",
            gateway_a_body("premium_subscription_u6", "settlement"),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["outcome"], "faulted");
}

#[tokio::test]
async fn empty_reference_returns_500() {
    let t = test_app();

    let (status, body) = send(
        &t.router,
        post(
            "/webhooks/gateway-a",
            gateway_a_body("premium_subscription_", "settlement"),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["outcome"], "faulted");
}

// =============================================================================
// Operator and health endpoints
// =============================================================================

#[tokio::test]
async fn subscription_endpoint_returns_stored_record() {
    let t = test_app();
    send(
        &t.router,
        post(
            "/webhooks/gateway-a",
            gateway_a_body("premium_subscription_u7", "settlement"),
            None,
        ),
    )
    .await;

    let (status, body) = send(&t.router, get("/subscriptions/u7")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user_id"], "u7");
    assert_eq!(body["status"], "active");
    assert_eq!(body["entitled"], true);
    assert_eq!(body["last_applied_event_id"], "tx-77:settlement");
    assert_eq!(body["last_applied_gateway"], "gateway_a");
}

#[tokio::test]
async fn unknown_subscription_returns_404() {
    let t = test_app();

    let (status, body) = send(&t.router, get("/subscriptions/nobody")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "SUBSCRIPTION_NOT_FOUND");
}

#[tokio::test]
async fn health_returns_ok() {
    let t = test_app();

    let (status, body) = send(&t.router, get("/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn get_on_webhook_route_is_method_not_allowed() {
    let t = test_app();

    let (status, _) = send(&t.router, get("/webhooks/payments")).await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}
