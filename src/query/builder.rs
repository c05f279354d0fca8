//! [`GeoQuery`] construction and in-process evaluation.

use chrono::{DateTime, Utc};

use super::filter::{AreaFilter, RowOrder, SpeciesFilter};
use super::params::GeoQueryParams;
use super::profile::EntityProfile;
use super::record::GeoRecord;
use crate::domain::viewport::{OLD_VIEWPORT_FIELDS, VIEWPORT_FIELDS};
use crate::domain::timestamp_from_millis;
use crate::error::StoreError;

/// A fully resolved query against one entity table.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoQuery {
    /// Target entity.
    pub profile: EntityProfile,
    /// Rows must expire strictly after this instant.
    pub active_after: Option<DateTime<Utc>>,
    /// Species predicate.
    pub species: SpeciesFilter,
    /// Spatial and sync predicate.
    pub area: AreaFilter,
    /// Result ordering.
    pub order: RowOrder,
    /// Row cap.
    pub limit: u32,
    /// Left-join the raid sub-record.
    pub include_raid: bool,
}

impl GeoQuery {
    /// Builds a query from client parameters.
    ///
    /// All coordinates and the timestamp are validated first, whether or
    /// not they end up in the predicate. Composition:
    ///
    /// - entities with an expiry column only return rows expiring after
    ///   `now`;
    /// - a non-empty whitelist restricts species, otherwise a non-empty
    ///   blacklist excludes species;
    /// - a complete viewport bounds the rows; with a timestamp the rows
    ///   must also be newer than it, otherwise a complete old viewport is
    ///   subtracted;
    /// - without a viewport, the timestamp still applies unless the
    ///   profile requires a viewport for sync;
    /// - ranked profiles order viewport results by distance from its
    ///   center.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidCoordinate`] or
    /// [`StoreError::InvalidTimestamp`] on malformed input.
    pub fn build(
        profile: EntityProfile,
        params: &GeoQueryParams,
        limit: u32,
        now: DateTime<Utc>,
    ) -> Result<Self, StoreError> {
        let viewport = params.viewport.resolve(VIEWPORT_FIELDS)?;
        let old_viewport = params.old_viewport.resolve(OLD_VIEWPORT_FIELDS)?;
        let since = params.timestamp.map(timestamp_from_millis).transpose()?;

        let species = if profile.species.is_some() {
            SpeciesFilter::from_lists(&params.whitelist, &params.blacklist)
        } else {
            SpeciesFilter::Any
        };

        let area = match (viewport, since, old_viewport) {
            (None, Some(since), _) if !profile.sync_requires_viewport => {
                AreaFilter::ModifiedSince(since)
            }
            (None, _, _) => AreaFilter::Unbounded,
            (Some(viewport), Some(since), _) => AreaFilter::WithinModifiedSince { viewport, since },
            (Some(viewport), None, Some(old)) => AreaFilter::WithinExcluding { viewport, old },
            (Some(viewport), None, None) => AreaFilter::Within(viewport),
        };

        let order = match area.viewport() {
            Some(viewport) if profile.rank_by_distance => RowOrder::DistanceFrom(viewport.center()),
            _ => RowOrder::Unordered,
        };

        tracing::debug!(
            entity = profile.table,
            area = area.kind(),
            species = ?species,
            limit,
            "built geo query"
        );

        Ok(Self {
            profile,
            active_after: profile.expiry.map(|_| now),
            species,
            area,
            order,
            limit,
            include_raid: profile.joins_raid,
        })
    }

    /// Evaluates the predicate against a row. Ordering and the row cap are
    /// not part of the predicate.
    #[must_use]
    pub fn matches<R: GeoRecord>(&self, record: &R) -> bool {
        if let Some(now) = self.active_after
            && !record.expires_at().is_some_and(|t| t > now)
        {
            return false;
        }
        self.species.admits(record.species())
            && self.area.admits(record.position(), record.modified_at())
    }
}
