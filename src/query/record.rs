//! Read access to the fields a [`super::GeoQuery`] filters on.

use chrono::{DateTime, Utc};

use crate::domain::GeoPoint;

/// A row that can be tested against a [`super::GeoQuery`] in process.
pub trait GeoRecord {
    /// Row position.
    fn position(&self) -> GeoPoint;

    /// Timestamp compared against the incremental-sync cutoff.
    fn modified_at(&self) -> Option<DateTime<Utc>>;

    /// Species identifier, for entity kinds that have one.
    fn species(&self) -> Option<i16> {
        None
    }

    /// Expiry instant, for entity kinds that expire.
    fn expires_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}
