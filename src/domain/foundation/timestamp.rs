//! Timestamp value object for immutable points in time.

use chrono::{DateTime, Duration, FixedOffset, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use super::ValidationError;

/// Immutable point in time, always UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// Creates a timestamp for the current moment.
    pub fn now() -> Self {
        Self(Utc::now())
    }

    /// Creates a timestamp from a DateTime<Utc>.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self(dt)
    }

    /// Returns the inner DateTime.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Parses an RFC 3339 string such as `2024-01-15T10:30:00.000Z`.
    pub fn parse_rfc3339(field: &str, value: &str) -> Result<Self, ValidationError> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .map_err(|e| ValidationError::invalid_format(field, e.to_string()))
    }

    /// Parses a zone-less `YYYY-MM-DD HH:MM:SS` string recorded in a
    /// fixed UTC offset (in hours).
    pub fn parse_local(
        field: &str,
        value: &str,
        utc_offset_hours: i32,
    ) -> Result<Self, ValidationError> {
        let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S")
            .map_err(|e| ValidationError::invalid_format(field, e.to_string()))?;
        let offset = FixedOffset::east_opt(utc_offset_hours * 3600).ok_or_else(|| {
            ValidationError::invalid_format(field, format!("bad offset {}", utc_offset_hours))
        })?;
        offset
            .from_local_datetime(&naive)
            .single()
            .map(|dt| Self(dt.with_timezone(&Utc)))
            .ok_or_else(|| ValidationError::invalid_format(field, "ambiguous local time"))
    }

    /// Checks if this timestamp is before another.
    pub fn is_before(&self, other: &Timestamp) -> bool {
        self.0 < other.0
    }

    /// Checks if this timestamp is after another.
    pub fn is_after(&self, other: &Timestamp) -> bool {
        self.0 > other.0
    }

    /// Creates a new timestamp by adding the specified number of days.
    ///
    /// Negative values subtract days.
    pub fn add_days(&self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Creates a new timestamp by subtracting the specified number of days.
    pub fn minus_days(&self, days: i64) -> Self {
        Self(self.0 - Duration::days(days))
    }
}

impl Default for Timestamp {
    fn default() -> Self {
        Self::now()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}
