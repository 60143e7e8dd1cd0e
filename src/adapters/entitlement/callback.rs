//! HTTP callback entitlement notifier.
//!
//! POSTs `{"user_id", "active", "expires_at"}` to a configured URL. Any
//! non-2xx response is an error for the caller to log.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use std::time::Duration;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::EntitlementNotifier;

/// Body sent to the entitlement consumer.
#[derive(Debug, Serialize, PartialEq)]
pub struct EntitlementPayload<'a> {
    pub user_id: &'a str,
    pub active: bool,
    pub expires_at: Option<Timestamp>,
}

pub struct HttpEntitlementNotifier {
    http_client: reqwest::Client,
    url: String,
    bearer_token: Option<SecretString>,
}

impl HttpEntitlementNotifier {
    /// Builds a notifier with its own client and request timeout.
    pub fn new(
        url: impl Into<String>,
        timeout: Duration,
        bearer_token: Option<SecretString>,
    ) -> Result<Self, DomainError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                DomainError::new(
                    ErrorCode::InternalError,
                    format!("Failed to build HTTP client: {}", e),
                )
            })?;

        Ok(Self {
            http_client,
            url: url.into(),
            bearer_token,
        })
    }
}

#[async_trait]
impl EntitlementNotifier for HttpEntitlementNotifier {
    async fn set_premium(
        &self,
        user_id: &UserId,
        active: bool,
        expires_at: Option<Timestamp>,
    ) -> Result<(), DomainError> {
        let payload = EntitlementPayload {
            user_id: user_id.as_str(),
            active,
            expires_at,
        };

        let mut request = self.http_client.post(&self.url).json(&payload);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token.expose_secret());
        }

        let response = request.send().await.map_err(|e| {
            DomainError::new(
                ErrorCode::ExternalServiceError,
                format!("Entitlement callback failed: {}", e),
            )
        })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, error = %error_text, "Entitlement callback rejected");
            return Err(DomainError::new(
                ErrorCode::ExternalServiceError,
                format!("Entitlement callback returned {}", status),
            )
            .with_detail("user_id", user_id.as_str()));
        }

        tracing::debug!(user_id = %user_id, active, "Entitlement callback delivered");
        Ok(())
    }
}
