//! HTTP handlers for billing endpoints.
//!
//! Webhook handlers pass the raw body through untouched; signature checks
//! depend on the exact bytes the gateway sent.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Json, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;

use crate::application::handlers::billing::{
    GetSubscriptionHandler, GetSubscriptionQuery, ReconcilePaymentNotificationCommand,
    ReconcilePaymentNotificationHandler,
};
use crate::domain::billing::Gateway;
use crate::domain::foundation::{DomainError, ErrorCode, UserId};
use crate::ports::SubscriptionStore;

use super::dto::{ErrorResponse, HealthResponse, OutcomeResponse, SubscriptionResponse};

// ════════════════════════════════════════════════════════════════════════════════
// Application State
// ════════════════════════════════════════════════════════════════════════════════

/// Shared application state containing all dependencies.
#[derive(Clone)]
pub struct BillingAppState {
    pub reconciler: Arc<ReconcilePaymentNotificationHandler>,
    pub subscription_store: Arc<dyn SubscriptionStore>,
}

impl BillingAppState {
    pub fn get_subscription_handler(&self) -> GetSubscriptionHandler {
        GetSubscriptionHandler::new(self.subscription_store.clone())
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Webhook Handlers (no auth, signature verified)
// ════════════════════════════════════════════════════════════════════════════════

async fn reconcile(
    state: &BillingAppState,
    gateway: Option<Gateway>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let cmd = ReconcilePaymentNotificationCommand {
        gateway,
        raw_body: body.to_vec(),
        headers,
    };

    let outcome = state.reconciler.handle(cmd).await;
    (outcome.status_code(), Json(OutcomeResponse::from(&outcome)))
}

/// POST /webhooks/payments - Gateway inferred from the request
pub async fn handle_payment_notification(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    reconcile(&state, None, headers, body).await
}

/// POST /webhooks/gateway-a
pub async fn handle_gateway_a_notification(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    reconcile(&state, Some(Gateway::GatewayA), headers, body).await
}

/// POST /webhooks/gateway-b
pub async fn handle_gateway_b_notification(
    State(state): State<BillingAppState>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    reconcile(&state, Some(Gateway::GatewayB), headers, body).await
}

// ════════════════════════════════════════════════════════════════════════════════
// Query Handlers (GET endpoints)
// ════════════════════════════════════════════════════════════════════════════════

/// GET /subscriptions/:user_id - Stored subscription for manual reconciliation
pub async fn get_subscription(
    State(state): State<BillingAppState>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, BillingApiError> {
    let user_id = UserId::new(user_id).map_err(DomainError::from)?;

    let record = state
        .get_subscription_handler()
        .handle(GetSubscriptionQuery { user_id })
        .await?
        .ok_or_else(|| DomainError::new(ErrorCode::SubscriptionNotFound, "Subscription not found"))?;

    Ok(Json(SubscriptionResponse::from(record)))
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(HealthResponse { status: "ok" })
}

// ════════════════════════════════════════════════════════════════════════════════
// Error Handling
// ════════════════════════════════════════════════════════════════════════════════

/// API error type that converts domain errors to HTTP responses.
pub struct BillingApiError(DomainError);

impl From<DomainError> for BillingApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for BillingApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.0.code {
            ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
            ErrorCode::SubscriptionNotFound => StatusCode::NOT_FOUND,
            ErrorCode::InvalidStateTransition => StatusCode::CONFLICT,
            ErrorCode::DatabaseError | ErrorCode::ExternalServiceError | ErrorCode::InternalError => {
                tracing::error!(error = %self.0, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse::new(self.0.code.to_string(), self.0.message);
        (status, Json(body)).into_response()
    }
}
