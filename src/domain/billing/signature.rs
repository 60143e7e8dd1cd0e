//! Gateway signature verification.
//!
//! Both schemes operate on the raw request body exactly as received.
//! Re-serializing a parsed payload can change byte content (number
//! formatting, key order, escapes) and break digests, so nothing here
//! ever touches a re-encoded object.
//!
//! Verification never errors: malformed input simply fails.

use http::HeaderMap;
use serde::Deserialize;
use serde_json::value::RawValue;
use sha2::{Digest, Sha512};
use subtle::ConstantTimeEq;

use super::gateway::CALLBACK_TOKEN_HEADER;
use super::Gateway;

/// Authenticates a notification as originating from its claimed gateway.
pub trait SignatureVerifier: Send + Sync {
    /// Returns true only when the notification is authentic.
    fn verify(&self, raw_body: &[u8], headers: &HeaderMap, shared_secret: &str) -> bool;
}

/// GatewayA scheme: `signature_key` body field holding
/// `hex(SHA-512(order_id ‖ status_code ‖ gross_amount ‖ server_key))`.
#[derive(Debug, Default, Clone, Copy)]
pub struct CanonicalDigestVerifier;

/// Fields of the signed canonical string, captured as raw JSON text.
#[derive(Deserialize)]
struct SignedFields<'a> {
    #[serde(borrow)]
    order_id: &'a RawValue,
    #[serde(borrow)]
    status_code: &'a RawValue,
    #[serde(borrow)]
    gross_amount: &'a RawValue,
    signature_key: String,
}

/// Literal text of a JSON scalar: unescaped contents for strings,
/// verbatim source text for numbers.
fn literal(raw: &RawValue) -> Option<String> {
    let text = raw.get();
    if text.starts_with('"') {
        serde_json::from_str::<String>(text).ok()
    } else if text.starts_with(|c: char| c == '-' || c.is_ascii_digit()) {
        Some(text.to_string())
    } else {
        None
    }
}

impl SignatureVerifier for CanonicalDigestVerifier {
    fn verify(&self, raw_body: &[u8], _headers: &HeaderMap, shared_secret: &str) -> bool {
        if shared_secret.is_empty() {
            return false;
        }
        let Ok(fields) = serde_json::from_slice::<SignedFields<'_>>(raw_body) else {
            return false;
        };
        let (Some(order_id), Some(status_code), Some(gross_amount)) = (
            literal(fields.order_id),
            literal(fields.status_code),
            literal(fields.gross_amount),
        ) else {
            return false;
        };

        let expected = canonical_digest(&order_id, &status_code, &gross_amount, shared_secret);
        constant_time_compare(
            expected.as_bytes(),
            fields.signature_key.to_ascii_lowercase().as_bytes(),
        )
    }
}

/// Computes GatewayA's lowercase hex digest over the canonical string.
pub fn canonical_digest(
    order_id: &str,
    status_code: &str,
    gross_amount: &str,
    server_key: &str,
) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}

/// GatewayB scheme: static token in the `X-Callback-Token` header.
#[derive(Debug, Default, Clone, Copy)]
pub struct CallbackTokenVerifier;

impl SignatureVerifier for CallbackTokenVerifier {
    fn verify(&self, _raw_body: &[u8], headers: &HeaderMap, shared_secret: &str) -> bool {
        if shared_secret.is_empty() {
            return false;
        }
        let Some(token) = headers.get(CALLBACK_TOKEN_HEADER) else {
            return false;
        };
        constant_time_compare(token.as_bytes(), shared_secret.as_bytes())
    }
}

/// Verifies a notification with the scheme belonging to `gateway`.
pub fn verify(gateway: Gateway, raw_body: &[u8], headers: &HeaderMap, shared_secret: &str) -> bool {
    match gateway {
        Gateway::GatewayA => CanonicalDigestVerifier.verify(raw_body, headers, shared_secret),
        Gateway::GatewayB => CallbackTokenVerifier.verify(raw_body, headers, shared_secret),
    }
}

/// Performs constant-time comparison of two byte slices.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
