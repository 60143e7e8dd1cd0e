//! Entitlement notifier that records calls for later inspection.

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::EntitlementNotifier;

/// One `set_premium` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitlementCall {
    pub user_id: UserId,
    pub active: bool,
    pub expires_at: Option<Timestamp>,
}

/// Notifier that keeps every call in memory.
#[derive(Default)]
pub struct RecordingEntitlementNotifier {
    calls: Mutex<Vec<EntitlementCall>>,
    failing: AtomicBool,
}

impl RecordingEntitlementNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Calls received so far, oldest first.
    pub fn calls(&self) -> Vec<EntitlementCall> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Makes subsequent calls fail after being recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl EntitlementNotifier for RecordingEntitlementNotifier {
    async fn set_premium(
        &self,
        user_id: &UserId,
        active: bool,
        expires_at: Option<Timestamp>,
    ) -> Result<(), DomainError> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(EntitlementCall {
                user_id: user_id.clone(),
                active,
                expires_at,
            });

        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::new(
                ErrorCode::ExternalServiceError,
                "entitlement consumer unavailable",
            ));
        }
        Ok(())
    }
}
