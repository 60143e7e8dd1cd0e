//! EntitlementNotifier port - Tells the product whether a user is premium.

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, Timestamp, UserId};

/// Port for pushing entitlement changes to the consumer that gates
/// premium features.
///
/// Called only after the store transaction committed. Failures are
/// logged by the caller; the store remains the source of truth.
#[async_trait]
pub trait EntitlementNotifier: Send + Sync {
    /// Set or clear the premium flag for a user.
    ///
    /// `expires_at` is the end of the paid period when `active` is true.
    async fn set_premium(
        &self,
        user_id: &UserId,
        active: bool,
        expires_at: Option<Timestamp>,
    ) -> Result<(), DomainError>;
}
