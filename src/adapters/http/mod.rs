//! HTTP adapters - REST API implementations.

pub mod billing;

use std::time::Duration;

use axum::Router;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub use billing::{billing_router, BillingAppState};

/// Builds the full application router with tracing and request timeout.
pub fn app(state: BillingAppState, request_timeout: Duration) -> Router {
    billing_router()
        .layer(TimeoutLayer::new(request_timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
