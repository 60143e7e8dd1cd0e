//! PurgeDedupLedgerHandler - Retention for the dedup ledger.
//!
//! Gateways stop redelivering long before the retention window closes,
//! so entries older than it can no longer prevent a double-apply.

use std::sync::Arc;

use crate::domain::foundation::{DomainError, Timestamp};
use crate::ports::DedupLedger;

/// Command to purge expired ledger entries.
#[derive(Debug, Clone, Copy)]
pub struct PurgeDedupLedgerCommand {
    pub now: Timestamp,
}

pub struct PurgeDedupLedgerHandler {
    ledger: Arc<dyn DedupLedger>,
    retention_days: i64,
}

impl PurgeDedupLedgerHandler {
    pub fn new(ledger: Arc<dyn DedupLedger>, retention_days: i64) -> Self {
        Self {
            ledger,
            retention_days,
        }
    }

    /// Returns the number of entries removed.
    pub async fn handle(&self, cmd: PurgeDedupLedgerCommand) -> Result<u64, DomainError> {
        let cutoff = cmd.now.minus_days(self.retention_days);
        let purged = self.ledger.purge_before(cutoff).await?;
        tracing::info!(purged, cutoff = %cutoff, "Purged dedup ledger");
        Ok(purged)
    }
}
