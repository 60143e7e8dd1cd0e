//! GatewayRegistry - Strategy table from gateway to its verifier and normalizer.

use std::collections::HashMap;
use std::sync::Arc;

use http::HeaderMap;
use secrecy::{ExposeSecret, SecretString};

use crate::domain::billing::{
    CallbackTokenVerifier, CanonicalDigestVerifier, Gateway, GatewayANormalizer,
    GatewayBNormalizer, PayloadNormalizer, SignatureVerifier,
};

/// Everything needed to authenticate and read one gateway's notifications.
pub struct GatewayStrategy {
    verifier: Arc<dyn SignatureVerifier>,
    normalizer: Arc<dyn PayloadNormalizer>,
    secret: SecretString,
}

impl GatewayStrategy {
    pub fn new(
        verifier: Arc<dyn SignatureVerifier>,
        normalizer: Arc<dyn PayloadNormalizer>,
        secret: SecretString,
    ) -> Self {
        Self {
            verifier,
            normalizer,
            secret,
        }
    }

    /// Verifies against this gateway's configured secret.
    pub fn verify(&self, raw_body: &[u8], headers: &HeaderMap) -> bool {
        self.verifier
            .verify(raw_body, headers, self.secret.expose_secret())
    }

    pub fn normalizer(&self) -> &dyn PayloadNormalizer {
        self.normalizer.as_ref()
    }
}

/// Gateways this deployment accepts notifications from.
///
/// A gateway without an entry is rejected before any verification.
#[derive(Default)]
pub struct GatewayRegistry {
    strategies: HashMap<Gateway, GatewayStrategy>,
}

impl GatewayRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(mut self, gateway: Gateway, strategy: GatewayStrategy) -> Self {
        self.strategies.insert(gateway, strategy);
        self
    }

    /// Registers GatewayA with the canonical-digest scheme.
    pub fn with_gateway_a(self, server_key: SecretString, utc_offset_hours: i32) -> Self {
        self.register(
            Gateway::GatewayA,
            GatewayStrategy::new(
                Arc::new(CanonicalDigestVerifier),
                Arc::new(GatewayANormalizer::new(utc_offset_hours)),
                server_key,
            ),
        )
    }

    /// Registers GatewayB with the callback-token scheme.
    pub fn with_gateway_b(self, callback_token: SecretString) -> Self {
        self.register(
            Gateway::GatewayB,
            GatewayStrategy::new(
                Arc::new(CallbackTokenVerifier),
                Arc::new(GatewayBNormalizer),
                callback_token,
            ),
        )
    }

    pub fn get(&self, gateway: Gateway) -> Option<&GatewayStrategy> {
        self.strategies.get(&gateway)
    }

    pub fn is_registered(&self, gateway: Gateway) -> bool {
        self.strategies.contains_key(&gateway)
    }
}
