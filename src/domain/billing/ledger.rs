//! Dedup ledger keys and entries.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::Timestamp;

use super::Gateway;

/// Composite de-duplication key.
///
/// Event ids are only unique within one gateway, so the gateway is
/// always part of the key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LedgerKey {
    pub gateway: Gateway,
    pub gateway_event_id: String,
}

impl LedgerKey {
    pub fn new(gateway: Gateway, gateway_event_id: impl Into<String>) -> Self {
        Self {
            gateway,
            gateway_event_id: gateway_event_id.into(),
        }
    }
}

impl fmt::Display for LedgerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.gateway, self.gateway_event_id)
    }
}

/// Write-once record of an applied gateway event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DedupLedgerEntry {
    pub key: LedgerKey,
    pub processed_at: Timestamp,
}

impl DedupLedgerEntry {
    pub fn new(key: LedgerKey, processed_at: Timestamp) -> Self {
        Self { key, processed_at }
    }
}
