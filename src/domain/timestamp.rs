//! POSIX timestamp conversion for incremental sync.

use chrono::{DateTime, Utc};

use crate::error::StoreError;

/// Converts a client-supplied POSIX timestamp in milliseconds to a UTC
/// instant.
///
/// # Errors
///
/// Returns [`StoreError::InvalidTimestamp`] if the value is outside the
/// range `chrono` can represent.
pub fn timestamp_from_millis(millis: i64) -> Result<DateTime<Utc>, StoreError> {
    DateTime::from_timestamp_millis(millis).ok_or(StoreError::InvalidTimestamp(millis))
}
