//! HTTP adapter for billing endpoints.
//!
//! - `POST /webhooks/payments` - Payment notification, gateway inferred
//! - `POST /webhooks/gateway-a` - GatewayA payment notification
//! - `POST /webhooks/gateway-b` - GatewayB payment notification
//! - `GET /subscriptions/:user_id` - Stored subscription record
//! - `GET /health` - Liveness

pub mod dto;
pub mod handlers;
pub mod routes;

pub use handlers::BillingAppState;
pub use routes::billing_router;
