//! PostgreSQL implementation of SubscriptionStore and DedupLedger.
//!
//! `transactionally_apply` runs in one transaction:
//! ledger insert (`ON CONFLICT DO NOTHING RETURNING`), row lock
//! (`SELECT ... FOR UPDATE`), mutation, upsert, commit. A concurrent
//! delivery of the same event blocks on the ledger's primary key until the
//! first transaction commits, then inserts nothing and rolls back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::billing::{
    Gateway, LedgerKey, SubscriptionMutation, SubscriptionRecord, SubscriptionStatus,
};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::{ApplyResult, DedupLedger, SubscriptionStore};

/// PostgreSQL implementation of the subscription ports.
///
/// Uses sqlx with connection pooling; schema lives in `migrations/`.
pub struct PostgresSubscriptionStore {
    pool: PgPool,
}

impl PostgresSubscriptionStore {
    /// Creates a new PostgresSubscriptionStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a subscription.
#[derive(Debug, sqlx::FromRow)]
struct SubscriptionRow {
    user_id: String,
    status: String,
    current_period_start: Option<DateTime<Utc>>,
    current_period_end: Option<DateTime<Utc>>,
    last_applied_event_id: Option<String>,
    last_applied_gateway: Option<String>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for SubscriptionRecord {
    type Error = DomainError;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let last_applied_gateway = row
            .last_applied_gateway
            .as_deref()
            .map(parse_gateway)
            .transpose()?;

        Ok(SubscriptionRecord {
            user_id: UserId::new(row.user_id).map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
            })?,
            status: parse_status(&row.status)?,
            current_period_start: row.current_period_start.map(Timestamp::from_datetime),
            current_period_end: row.current_period_end.map(Timestamp::from_datetime),
            last_applied_event_id: row.last_applied_event_id,
            last_applied_gateway,
            updated_at: Timestamp::from_datetime(row.updated_at),
        })
    }
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DomainError> {
    SubscriptionStatus::parse(&s.to_lowercase()).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid status value: {}", s),
        )
    })
}

fn parse_gateway(s: &str) -> Result<Gateway, DomainError> {
    Gateway::parse(s).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid gateway value: {}", s),
        )
    })
}

const SELECT_COLUMNS: &str = r#"
    SELECT user_id, status, current_period_start, current_period_end,
           last_applied_event_id, last_applied_gateway, updated_at
    FROM subscriptions
"#;

impl PostgresSubscriptionStore {
    async fn insert_ledger_entry(
        tx: &mut Transaction<'_, Postgres>,
        key: &LedgerKey,
    ) -> Result<bool, DomainError> {
        let row: Option<(String,)> = sqlx::query_as(
            r#"
            INSERT INTO dedup_ledger (gateway, gateway_event_id, processed_at)
            VALUES ($1, $2, NOW())
            ON CONFLICT (gateway, gateway_event_id) DO NOTHING
            RETURNING gateway_event_id
            "#,
        )
        .bind(key.gateway.as_str())
        .bind(&key.gateway_event_id)
        .fetch_optional(&mut **tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to insert ledger entry: {}", e)))?;

        Ok(row.is_some())
    }

    async fn lock_record(
        tx: &mut Transaction<'_, Postgres>,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        // Create the row first so the lock below always has something to
        // hold, serializing first-ever events for the same user too.
        sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, status, updated_at)
            VALUES ($1, 'none', NOW())
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id.as_str())
        .execute(&mut **tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to create subscription: {}", e)))?;

        let row: Option<SubscriptionRow> =
            sqlx::query_as(&format!("{} WHERE user_id = $1 FOR UPDATE", SELECT_COLUMNS))
                .bind(user_id.as_str())
                .fetch_optional(&mut **tx)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to lock subscription: {}", e))
                })?;

        // The placeholder created above is not a record yet.
        Ok(row
            .map(SubscriptionRecord::try_from)
            .transpose()?
            .filter(|r| r.last_applied_event_id.is_some()))
    }

    async fn write_record(
        tx: &mut Transaction<'_, Postgres>,
        record: &SubscriptionRecord,
    ) -> Result<(), DomainError> {
        sqlx::query(
            r#"
            UPDATE subscriptions SET
                status = $2,
                current_period_start = $3,
                current_period_end = $4,
                last_applied_event_id = $5,
                last_applied_gateway = $6,
                updated_at = $7
            WHERE user_id = $1
            "#,
        )
        .bind(record.user_id.as_str())
        .bind(record.status.as_str())
        .bind(record.current_period_start.map(|t| *t.as_datetime()))
        .bind(record.current_period_end.map(|t| *t.as_datetime()))
        .bind(&record.last_applied_event_id)
        .bind(record.last_applied_gateway.map(|g| g.as_str()))
        .bind(record.updated_at.as_datetime())
        .execute(&mut **tx)
        .await
        .map_err(|e| DomainError::database(format!("Failed to update subscription: {}", e)))?;

        Ok(())
    }
}

#[async_trait]
impl SubscriptionStore for PostgresSubscriptionStore {
    async fn get_by_user(
        &self,
        user_id: &UserId,
    ) -> Result<Option<SubscriptionRecord>, DomainError> {
        let row: Option<SubscriptionRow> =
            sqlx::query_as(&format!("{} WHERE user_id = $1", SELECT_COLUMNS))
                .bind(user_id.as_str())
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::database(format!("Failed to find subscription: {}", e))
                })?;

        row.map(SubscriptionRecord::try_from).transpose()
    }

    async fn transactionally_apply(
        &self,
        user_id: &UserId,
        mutation: &SubscriptionMutation,
        ledger_key: &LedgerKey,
    ) -> Result<ApplyResult, DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DomainError::database(format!("Failed to begin transaction: {}", e)))?;

        if !Self::insert_ledger_entry(&mut tx, ledger_key).await? {
            tx.rollback().await.map_err(|e| {
                DomainError::database(format!("Failed to roll back transaction: {}", e))
            })?;
            return Ok(ApplyResult::Duplicate);
        }

        let current = Self::lock_record(&mut tx, user_id).await?;
        let applied = mutation.apply(user_id, current, ledger_key);
        Self::write_record(&mut tx, &applied.record).await?;

        tx.commit()
            .await
            .map_err(|e| DomainError::database(format!("Failed to commit transaction: {}", e)))?;

        Ok(ApplyResult::Applied(applied))
    }
}

#[async_trait]
impl DedupLedger for PostgresSubscriptionStore {
    async fn contains(&self, key: &LedgerKey) -> Result<bool, DomainError> {
        let row: Option<(i32,)> = sqlx::query_as(
            r#"
            SELECT 1 FROM dedup_ledger
            WHERE gateway = $1 AND gateway_event_id = $2
            "#,
        )
        .bind(key.gateway.as_str())
        .bind(&key.gateway_event_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| DomainError::database(format!("Failed to query ledger: {}", e)))?;

        Ok(row.is_some())
    }

    async fn purge_before(&self, cutoff: Timestamp) -> Result<u64, DomainError> {
        let result = sqlx::query("DELETE FROM dedup_ledger WHERE processed_at < $1")
            .bind(cutoff.as_datetime())
            .execute(&self.pool)
            .await
            .map_err(|e| DomainError::database(format!("Failed to purge ledger: {}", e)))?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(status: &str, gateway: Option<&str>) -> SubscriptionRow {
        SubscriptionRow {
            user_id: "u1".to_string(),
            status: status.to_string(),
            current_period_start: Some(Utc::now()),
            current_period_end: None,
            last_applied_event_id: Some("inv_1".to_string()),
            last_applied_gateway: gateway.map(str::to_string),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn row_converts_to_record() {
        let record = SubscriptionRecord::try_from(row("active", Some("gateway_b"))).unwrap();
        assert_eq!(record.status, SubscriptionStatus::Active);
        assert_eq!(record.last_applied_gateway, Some(Gateway::GatewayB));
        assert!(record.current_period_start.is_some());
        assert!(record.current_period_end.is_none());
    }

    #[test]
    fn status_parsing_is_case_insensitive() {
        assert_eq!(parse_status("PAYMENT_FAILED").unwrap(), SubscriptionStatus::PaymentFailed);
    }

    #[test]
    fn unknown_status_is_a_database_error() {
        let err = SubscriptionRecord::try_from(row("past_due", None)).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn unknown_gateway_is_a_database_error() {
        let err = SubscriptionRecord::try_from(row("active", Some("stripe"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn empty_user_id_is_rejected() {
        let mut bad = row("active", None);
        bad.user_id = String::new();
        assert!(SubscriptionRecord::try_from(bad).is_err());
    }
}
