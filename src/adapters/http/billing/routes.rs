//! Axum router configuration for billing endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    get_subscription, handle_gateway_a_notification, handle_gateway_b_notification,
    handle_payment_notification, health, BillingAppState,
};

/// Create the webhook router.
///
/// # Routes
/// - `POST /payments` - Gateway inferred from headers/body
/// - `POST /gateway-a` - GatewayA notifications
/// - `POST /gateway-b` - GatewayB notifications
pub fn webhook_routes() -> Router<BillingAppState> {
    Router::new()
        .route("/payments", post(handle_payment_notification))
        .route("/gateway-a", post(handle_gateway_a_notification))
        .route("/gateway-b", post(handle_gateway_b_notification))
}

/// Create the operator router.
///
/// # Routes
/// - `GET /:user_id` - Stored subscription record
pub fn subscription_routes() -> Router<BillingAppState> {
    Router::new().route("/:user_id", get(get_subscription))
}

/// Create the complete billing router.
///
/// Mounts webhooks under `/webhooks`, records under `/subscriptions`, and
/// `GET /health`.
pub fn billing_router() -> Router<BillingAppState> {
    Router::new()
        .nest("/webhooks", webhook_routes())
        .nest("/subscriptions", subscription_routes())
        .route("/health", get(health))
}
