//! Entitlement notifier that only logs.
//!
//! Used when no callback URL is configured; the subscription table is then
//! the only place the premium state lives.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::EntitlementNotifier;

#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEntitlementNotifier;

impl LoggingEntitlementNotifier {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl EntitlementNotifier for LoggingEntitlementNotifier {
    async fn set_premium(
        &self,
        user_id: &UserId,
        active: bool,
        expires_at: Option<Timestamp>,
    ) -> Result<(), DomainError> {
        tracing::info!(
            user_id = %user_id,
            active,
            expires_at = ?expires_at.map(|t| t.to_string()),
            "Entitlement changed"
        );
        Ok(())
    }
}
