//! GetSubscriptionHandler - Query handler for a user's stored subscription.

use std::sync::Arc;

use crate::domain::billing::SubscriptionRecord;
use crate::domain::foundation::{DomainError, UserId};
use crate::ports::SubscriptionStore;

/// Query to get a user's subscription record.
#[derive(Debug, Clone)]
pub struct GetSubscriptionQuery {
    pub user_id: UserId,
}

/// `None` if no event was ever applied for the user.
pub type GetSubscriptionResult = Option<SubscriptionRecord>;

/// Handler used by operators during manual reconciliation.
pub struct GetSubscriptionHandler {
    store: Arc<dyn SubscriptionStore>,
}

impl GetSubscriptionHandler {
    pub fn new(store: Arc<dyn SubscriptionStore>) -> Self {
        Self { store }
    }

    pub async fn handle(
        &self,
        query: GetSubscriptionQuery,
    ) -> Result<GetSubscriptionResult, DomainError> {
        self.store.get_by_user(&query.user_id).await
    }
}
