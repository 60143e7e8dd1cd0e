//! IdempotencyGuard - Cheap duplicate detection before the transaction.
//!
//! The authoritative check is the ledger insert inside
//! `SubscriptionStore::transactionally_apply`. The guard only saves the
//! transaction for the common case of a plain redelivery.

use std::sync::Arc;

use crate::domain::billing::LedgerKey;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::{DedupLedger, SubscriptionStore};

pub struct IdempotencyGuard {
    store: Arc<dyn SubscriptionStore>,
    ledger: Arc<dyn DedupLedger>,
}

impl IdempotencyGuard {
    pub fn new(store: Arc<dyn SubscriptionStore>, ledger: Arc<dyn DedupLedger>) -> Self {
        Self { store, ledger }
    }

    /// Returns false when `key` is known to have been applied already.
    ///
    /// Checks the record's last applied event first, then the ledger.
    pub async fn should_process(&self, user_id: &UserId, key: &LedgerKey) -> Result<bool, DomainError> {
        if let Some(record) = self.store.get_by_user(user_id).await? {
            if record.last_applied(key) {
                return Ok(false);
            }
        }
        Ok(!self.ledger.contains(key).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::InMemorySubscriptionStore;
    use crate::domain::billing::{EventKind, Gateway, SubscriptionMutation};
    use crate::domain::foundation::Timestamp;

    fn guard(store: &Arc<InMemorySubscriptionStore>) -> IdempotencyGuard {
        IdempotencyGuard::new(store.clone(), store.clone())
    }

    fn paid() -> SubscriptionMutation {
        SubscriptionMutation {
            kind: EventKind::Paid,
            occurred_at: Timestamp::now(),
            billing_cycle_days: 30,
        }
    }

    #[tokio::test]
    async fn unseen_event_should_process() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let user = UserId::new("u1").unwrap();
        let key = LedgerKey::new(Gateway::GatewayA, "tx:settlement");

        assert!(guard(&store).should_process(&user, &key).await.unwrap());
    }

    #[tokio::test]
    async fn last_applied_event_is_skipped() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let user = UserId::new("u1").unwrap();
        let key = LedgerKey::new(Gateway::GatewayA, "tx:settlement");
        store.transactionally_apply(&user, &paid(), &key).await.unwrap();

        assert!(!guard(&store).should_process(&user, &key).await.unwrap());
    }

    #[tokio::test]
    async fn older_applied_event_is_found_in_ledger() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let user = UserId::new("u1").unwrap();
        let first = LedgerKey::new(Gateway::GatewayB, "inv_1");
        let second = LedgerKey::new(Gateway::GatewayB, "inv_2");
        store.transactionally_apply(&user, &paid(), &first).await.unwrap();
        store.transactionally_apply(&user, &paid(), &second).await.unwrap();

        assert!(!guard(&store).should_process(&user, &first).await.unwrap());
    }

    #[tokio::test]
    async fn same_id_on_other_gateway_is_processed() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        let user = UserId::new("u1").unwrap();
        store
            .transactionally_apply(&user, &paid(), &LedgerKey::new(Gateway::GatewayB, "evt-1"))
            .await
            .unwrap();

        let other = LedgerKey::new(Gateway::GatewayA, "evt-1");
        assert!(guard(&store).should_process(&user, &other).await.unwrap());
    }

    #[tokio::test]
    async fn store_failure_propagates() {
        let store = Arc::new(InMemorySubscriptionStore::new());
        store.set_failing(true);
        let user = UserId::new("u1").unwrap();
        let key = LedgerKey::new(Gateway::GatewayA, "tx:settlement");

        assert!(guard(&store).should_process(&user, &key).await.is_err());
    }
}
