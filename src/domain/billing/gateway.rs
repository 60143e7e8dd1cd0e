//! Payment gateway identity and inbound classification.
//!
//! Two gateways deliver notifications with different shapes and
//! different authentication schemes. Classification looks only at
//! structural signals (a header, a top-level field) so that dispatch
//! never depends on incidental payload content.

use http::HeaderMap;
use serde::de::IgnoredAny;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Header carrying GatewayB's static callback token.
pub const CALLBACK_TOKEN_HEADER: &str = "x-callback-token";

/// Origin of a payment notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gateway {
    /// Canonical-field digest scheme; references travel in `order_id`.
    GatewayA,
    /// Static callback-token scheme; references travel in `external_id`.
    GatewayB,
}

impl Gateway {
    /// Stable identifier used in logs, storage and routes.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gateway::GatewayA => "gateway_a",
            Gateway::GatewayB => "gateway_b",
        }
    }

    /// Parses the stable identifier back into a gateway.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "gateway_a" => Some(Gateway::GatewayA),
            "gateway_b" => Some(Gateway::GatewayB),
            _ => None,
        }
    }

    /// All known gateways.
    pub fn all() -> [Gateway; 2] {
        [Gateway::GatewayA, Gateway::GatewayB]
    }
}

impl fmt::Display for Gateway {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Deserialize)]
struct SignatureProbe {
    signature_key: Option<IgnoredAny>,
}

/// Infers the originating gateway from a request's structural signals.
///
/// - `X-Callback-Token` header present → GatewayB
/// - top-level `signature_key` body field present → GatewayA
///
/// Returns `None` when neither signal is present or the body is not a
/// JSON object.
pub fn classify(headers: &HeaderMap, raw_body: &[u8]) -> Option<Gateway> {
    if headers.contains_key(CALLBACK_TOKEN_HEADER) {
        return Some(Gateway::GatewayB);
    }

    match serde_json::from_slice::<SignatureProbe>(raw_body) {
        Ok(SignatureProbe {
            signature_key: Some(_),
        }) => Some(Gateway::GatewayA),
        _ => None,
    }
}
