//! Entitlement notifier configuration

use secrecy::SecretString;
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Where entitlement changes are pushed.
///
/// Without `callback_url`, changes are only logged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntitlementConfig {
    pub callback_url: Option<String>,

    #[serde(default = "default_timeout")]
    pub callback_timeout_secs: u64,

    /// Sent as `Authorization: Bearer <token>`
    pub callback_bearer_token: Option<SecretString>,
}

impl EntitlementConfig {
    pub fn callback_timeout(&self) -> Duration {
        Duration::from_secs(self.callback_timeout_secs)
    }

    /// Validate entitlement configuration
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        let Some(url) = &self.callback_url else {
            return Ok(());
        };
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ValidationError::InvalidCallbackUrl);
        }
        if production && !url.starts_with("https://") {
            return Err(ValidationError::CallbackMustBeHttps);
        }
        if self.callback_timeout_secs == 0 || self.callback_timeout_secs > 60 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

fn default_timeout() -> u64 {
    5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_url(url: &str) -> EntitlementConfig {
        EntitlementConfig {
            callback_url: Some(url.to_string()),
            callback_timeout_secs: 5,
            callback_bearer_token: None,
        }
    }

    #[test]
    fn test_no_callback_is_valid() {
        assert!(EntitlementConfig::default().validate(true).is_ok());
    }

    #[test]
    fn test_http_callback_rejected_in_production() {
        let config = with_url("http://entitlements.internal/premium");
        assert!(config.validate(false).is_ok());
        assert!(matches!(
            config.validate(true),
            Err(ValidationError::CallbackMustBeHttps)
        ));
    }

    #[test]
    fn test_non_http_scheme_rejected() {
        assert!(with_url("ftp://example.com").validate(false).is_err());
    }

    #[test]
    fn test_timeout_bounds() {
        let config = EntitlementConfig {
            callback_timeout_secs: 0,
            ..with_url("https://example.com")
        };
        assert!(config.validate(false).is_err());
        assert_eq!(
            with_url("https://example.com").callback_timeout(),
            Duration::from_secs(5)
        );
    }
}
