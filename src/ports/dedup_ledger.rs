//! DedupLedger port - Durable record of applied gateway events.
//!
//! Gateways redeliver on timeouts and non-2xx responses, so the same
//! `(gateway, gateway_event_id)` can arrive many times. The ledger is the
//! source of truth for "already applied".
//!
//! Entries are written by [`SubscriptionStore::transactionally_apply`]
//! in the same transaction as the record update. This port only exposes
//! the read side and retention.
//!
//! [`SubscriptionStore::transactionally_apply`]: super::SubscriptionStore::transactionally_apply

use async_trait::async_trait;

use crate::domain::billing::LedgerKey;
use crate::domain::foundation::{DomainError, Timestamp};

/// Port for querying and pruning the dedup ledger.
#[async_trait]
pub trait DedupLedger: Send + Sync {
    /// Check whether an event has already been applied.
    ///
    /// A `false` here is advisory: the insert inside the store transaction
    /// is what actually closes the race.
    async fn contains(&self, key: &LedgerKey) -> Result<bool, DomainError>;

    /// Delete entries processed before `cutoff`.
    ///
    /// Returns the number of entries deleted.
    async fn purge_before(&self, cutoff: Timestamp) -> Result<u64, DomainError>;
}
