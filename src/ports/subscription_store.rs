//! SubscriptionStore port - Transactional persistence of subscription records.
//!
//! The reconciler never reads, decides, and then writes in separate calls.
//! It hands the store a [`SubscriptionMutation`] and the event's
//! [`LedgerKey`]; the store must, inside ONE transaction:
//!
//! 1. insert the ledger key if absent (stop with `Duplicate` if present)
//! 2. lock and load the user's current record
//! 3. apply the mutation
//! 4. upsert the record and commit
//!
//! Both writes succeed or neither does. Two concurrent deliveries of the
//! same event therefore produce exactly one `Applied`.

use async_trait::async_trait;

use crate::domain::billing::{AppliedTransition, LedgerKey, SubscriptionMutation, SubscriptionRecord};
use crate::domain::foundation::{DomainError, UserId};

/// Result of a transactional apply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    /// Ledger entry inserted and record updated.
    Applied(AppliedTransition),
    /// Ledger already held the key; nothing was written.
    Duplicate,
}

impl ApplyResult {
    pub fn is_duplicate(&self) -> bool {
        matches!(self, ApplyResult::Duplicate)
    }
}

/// Port for reading and atomically mutating subscription records.
#[async_trait]
pub trait SubscriptionStore: Send + Sync {
    /// Find the record for a user.
    ///
    /// Returns `None` if the user never had a subscription event applied.
    async fn get_by_user(&self, user_id: &UserId)
        -> Result<Option<SubscriptionRecord>, DomainError>;

    /// Insert `ledger_key` and apply `mutation` as a single atomic unit.
    async fn transactionally_apply(
        &self,
        user_id: &UserId,
        mutation: &SubscriptionMutation,
        ledger_key: &LedgerKey,
    ) -> Result<ApplyResult, DomainError>;
}
