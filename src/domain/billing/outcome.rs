//! Reconciliation errors and their classification into outcomes.

use http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::DomainError;

use super::{DecodeError, Gateway, NormalizationError};

/// Everything that can stop a notification from being applied.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Signature or callback token mismatch.
    #[error("bad signature")]
    InvalidSignature(Gateway),

    /// No structural signal identified the sender.
    #[error("unknown gateway")]
    UnknownGateway,

    /// The sender is known but has no secret configured.
    #[error("gateway not configured")]
    GatewayNotConfigured(Gateway),

    /// Authenticated payload that could not be normalized.
    #[error("normalization failed: {0}")]
    Normalization(#[from] NormalizationError),

    /// Authenticated event whose reference names no user.
    #[error("bad reference: {0}")]
    Decode(#[from] DecodeError),

    /// Store transaction did not commit.
    #[error("store failure: {0}")]
    Store(#[from] DomainError),
}

impl ReconcileError {
    /// Returns true if the gateway should redeliver.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReconcileError::Normalization(_) | ReconcileError::Decode(_) | ReconcileError::Store(_)
        )
    }

    /// Collapses the error into the outcome reported to the gateway.
    pub fn into_outcome(self) -> Outcome {
        if self.is_retryable() {
            Outcome::Faulted(self.to_string())
        } else {
            Outcome::Rejected(self.to_string())
        }
    }
}

/// Final classification of one inbound notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Applied, or authenticated and intentionally ignored.
    Accepted,
    /// Already applied earlier; acknowledged without effect.
    DuplicateIgnored,
    /// Not authentic or not attributable to a gateway. Never retried.
    Rejected(String),
    /// Internal problem; the gateway is expected to retry.
    Faulted(String),
}

impl Outcome {
    /// HTTP status the gateway sees. Gateways retry on anything non-2xx.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Outcome::Accepted | Outcome::DuplicateIgnored => StatusCode::OK,
            Outcome::Rejected(_) => StatusCode::BAD_REQUEST,
            Outcome::Faulted(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Accepted => "accepted",
            Outcome::DuplicateIgnored => "duplicate_ignored",
            Outcome::Rejected(_) => "rejected",
            Outcome::Faulted(_) => "faulted",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Outcome::Rejected(reason) | Outcome::Faulted(reason) => Some(reason),
            Outcome::Accepted | Outcome::DuplicateIgnored => None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code().is_success()
    }
}
