//! In-memory subscription store and dedup ledger.
//!
//! One async mutex guards both the records and the ledger, so the
//! insert-if-absent and the record update happen under a single critical
//! section. That is the in-process equivalent of the PostgreSQL
//! transaction.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

use crate::domain::billing::{DedupLedgerEntry, LedgerKey, SubscriptionMutation, SubscriptionRecord};
use crate::domain::foundation::{DomainError, Timestamp, UserId};
use crate::ports::{ApplyResult, DedupLedger, SubscriptionStore};

#[derive(Default)]
struct State {
    records: HashMap<UserId, SubscriptionRecord>,
    ledger: HashMap<LedgerKey, DedupLedgerEntry>,
}

/// Subscription store backed by process memory.
///
/// Suitable for tests and local development; state is lost on restart.
#[derive(Default)]
pub struct InMemorySubscriptionStore {
    state: Mutex<State>,
    failing: AtomicBool,
}

impl InMemorySubscriptionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    // === Test Helpers ===

    /// Makes every subsequent operation fail with a database error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of ledger entries currently held.
    pub async fn ledger_len(&self) -> usize {
        self.state.lock().await.ledger.len()
    }

    /// Inserts a ledger entry directly, bypassing any record update.
    pub async fn seed_ledger(&self, entry: DedupLedgerEntry) {
        self.state
            .lock()
            .await
            .ledger
            .insert(entry.key.clone(), entry);
    }

    fn check_available(&self) -> Result<(), DomainError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(DomainError::database("in-memory store unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for InMemorySubscriptionStore {
    async fn get_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        self.check_available()?;
        Ok(self.state.lock().await.records.get(user_id).cloned())
    }

    async fn transactionally_apply(
        &self,
        user_id: &UserId,
        mutation: &SubscriptionMutation,
        ledger_key: &LedgerKey,
    ) -> Result<ApplyResult, DomainError> {
        self.check_available()?;
        let mut state = self.state.lock().await;

        if state.ledger.contains_key(ledger_key) {
            return Ok(ApplyResult::Duplicate);
        }

        let current = state.records.get(user_id).cloned();
        let applied = mutation.apply(user_id, current, ledger_key);

        state.ledger.insert(
            ledger_key.clone(),
            DedupLedgerEntry::new(ledger_key.clone(), Timestamp::now()),
        );
        state
            .records
            .insert(user_id.clone(), applied.record.clone());

        Ok(ApplyResult::Applied(applied))
    }
}

#[async_trait]
impl DedupLedger for InMemorySubscriptionStore {
    async fn contains(&self, key: &LedgerKey) -> Result<bool, DomainError> {
        self.check_available()?;
        Ok(self.state.lock().await.ledger.contains_key(key))
    }

    async fn purge_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        self.check_available()?;
        let mut state = self.state.lock().await;
        let before = state.ledger.len();
        state
            .ledger
            .retain(|_, entry| !entry.processed_at.is_before(&cutoff));
        Ok((before - state.ledger.len()) as u64)
    }
}
