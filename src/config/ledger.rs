//! Dedup ledger retention configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Dedup ledger retention
#[derive(Debug, Clone, Deserialize)]
pub struct LedgerConfig {
    /// Entries older than this are purged
    #[serde(default = "default_retention_days")]
    pub retention_days: i64,

    /// How often the purge runs
    #[serde(default = "default_purge_interval")]
    pub purge_interval_secs: u64,
}

impl LedgerConfig {
    pub fn purge_interval(&self) -> Duration {
        Duration::from_secs(self.purge_interval_secs)
    }

    /// Validate ledger configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.retention_days < 1 {
            return Err(ValidationError::InvalidRetention);
        }
        if self.purge_interval_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            purge_interval_secs: default_purge_interval(),
        }
    }
}

fn default_retention_days() -> i64 {
    90
}

fn default_purge_interval() -> u64 {
    3600
}
