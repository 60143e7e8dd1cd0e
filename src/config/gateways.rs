//! Payment gateway configuration

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use super::error::ValidationError;

/// Gateway credentials and per-gateway switches.
///
/// A gateway is registered only when it is enabled and has a secret.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaysConfig {
    #[serde(default = "default_enabled")]
    pub gateway_a_enabled: bool,

    /// Server key mixed into GatewayA's signature digest
    pub gateway_a_server_key: Option<SecretString>,

    /// Offset GatewayA writes `transaction_time` in
    #[serde(default = "default_utc_offset")]
    pub gateway_a_utc_offset_hours: i32,

    #[serde(default = "default_enabled")]
    pub gateway_b_enabled: bool,

    /// Token GatewayB sends in `X-Callback-Token`
    pub gateway_b_callback_token: Option<SecretString>,
}

impl GatewaysConfig {
    /// GatewayA server key, if GatewayA should be registered.
    pub fn gateway_a_secret(&self) -> Option<&SecretString> {
        active_secret(self.gateway_a_enabled, self.gateway_a_server_key.as_ref())
    }

    /// GatewayB callback token, if GatewayB should be registered.
    pub fn gateway_b_secret(&self) -> Option<&SecretString> {
        active_secret(self.gateway_b_enabled, self.gateway_b_callback_token.as_ref())
    }

    /// Validate gateway configuration
    ///
    /// Production requires every enabled gateway to carry its secret.
    pub fn validate(&self, production: bool) -> Result<(), ValidationError> {
        if !(-12..=14).contains(&self.gateway_a_utc_offset_hours) {
            return Err(ValidationError::InvalidUtcOffset);
        }
        if production {
            if self.gateway_a_enabled && self.gateway_a_secret().is_none() {
                return Err(ValidationError::MissingRequired("GATEWAY_A_SERVER_KEY"));
            }
            if self.gateway_b_enabled && self.gateway_b_secret().is_none() {
                return Err(ValidationError::MissingRequired("GATEWAY_B_CALLBACK_TOKEN"));
            }
        }
        if self.gateway_a_secret().is_none() && self.gateway_b_secret().is_none() {
            return Err(ValidationError::NoGatewayEnabled);
        }
        Ok(())
    }
}

fn active_secret(enabled: bool, secret: Option<&SecretString>) -> Option<&SecretString> {
    secret.filter(|s| enabled && !s.expose_secret().is_empty())
}

impl Default for GatewaysConfig {
    fn default() -> Self {
        Self {
            gateway_a_enabled: default_enabled(),
            gateway_a_server_key: None,
            gateway_a_utc_offset_hours: default_utc_offset(),
            gateway_b_enabled: default_enabled(),
            gateway_b_callback_token: None,
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_utc_offset() -> i32 {
    7
}
