//! Predicate building blocks of a [`super::GeoQuery`].

use chrono::{DateTime, Utc};

use crate::domain::{GeoPoint, Viewport};

/// Spatial and incremental-sync predicate.
///
/// The sync timestamp and the old-viewport exclusion never combine: a
/// client either asks for what changed since `T` or for what became
/// visible after panning, so each combination is its own variant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AreaFilter {
    /// No spatial or sync restriction.
    Unbounded,
    /// Rows modified strictly after the instant, anywhere.
    ModifiedSince(DateTime<Utc>),
    /// Rows inside the viewport.
    Within(Viewport),
    /// Rows inside the viewport modified strictly after `since`.
    WithinModifiedSince {
        /// Current viewport.
        viewport: Viewport,
        /// Sync cutoff.
        since: DateTime<Utc>,
    },
    /// Rows inside `viewport` but outside `old`.
    WithinExcluding {
        /// Current viewport.
        viewport: Viewport,
        /// Viewport the client already holds rows for.
        old: Viewport,
    },
}

impl AreaFilter {
    /// Current viewport, if the filter is spatial.
    #[must_use]
    pub const fn viewport(&self) -> Option<&Viewport> {
        match self {
            Self::Within(viewport)
            | Self::WithinModifiedSince { viewport, .. }
            | Self::WithinExcluding { viewport, .. } => Some(viewport),
            Self::Unbounded | Self::ModifiedSince(_) => None,
        }
    }

    /// Sync cutoff, if any.
    #[must_use]
    pub const fn since(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::ModifiedSince(since) | Self::WithinModifiedSince { since, .. } => Some(*since),
            Self::Unbounded | Self::Within(_) | Self::WithinExcluding { .. } => None,
        }
    }

    /// Excluded viewport, if any.
    #[must_use]
    pub const fn excluded(&self) -> Option<&Viewport> {
        match self {
            Self::WithinExcluding { old, .. } => Some(old),
            _ => None,
        }
    }

    /// Short label for logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Unbounded => "unbounded",
            Self::ModifiedSince(_) => "modified_since",
            Self::Within(_) => "within",
            Self::WithinModifiedSince { .. } => "within_modified_since",
            Self::WithinExcluding { .. } => "within_excluding",
        }
    }

    /// Evaluates the predicate for one row.
    #[must_use]
    pub fn admits(&self, position: GeoPoint, modified: Option<DateTime<Utc>>) -> bool {
        let fresh = |since: DateTime<Utc>| modified.is_some_and(|m| m > since);
        match self {
            Self::Unbounded => true,
            Self::ModifiedSince(since) => fresh(*since),
            Self::Within(viewport) => viewport.contains(position),
            Self::WithinModifiedSince { viewport, since } => {
                viewport.contains(position) && fresh(*since)
            }
            Self::WithinExcluding { viewport, old } => {
                viewport.contains(position) && !old.contains(position)
            }
        }
    }
}

/// Species predicate.
///
/// Never holds an empty list: an empty whitelist or blacklist means no
/// species filter at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeciesFilter {
    /// Every species.
    Any,
    /// Only these species.
    Only(Vec<i16>),
    /// Every species except these.
    Except(Vec<i16>),
}

impl SpeciesFilter {
    /// Picks the filter from client lists. A non-empty whitelist wins over
    /// the blacklist.
    #[must_use]
    pub fn from_lists(whitelist: &[i16], blacklist: &[i16]) -> Self {
        if !whitelist.is_empty() {
            Self::Only(dedup(whitelist))
        } else if !blacklist.is_empty() {
            Self::Except(dedup(blacklist))
        } else {
            Self::Any
        }
    }

    /// Evaluates the predicate for a species. Rows without a species only
    /// pass [`SpeciesFilter::Any`].
    #[must_use]
    pub fn admits(&self, species: Option<i16>) -> bool {
        match self {
            Self::Any => true,
            Self::Only(ids) => species.is_some_and(|s| ids.contains(&s)),
            Self::Except(ids) => species.is_some_and(|s| !ids.contains(&s)),
        }
    }
}

fn dedup(ids: &[i16]) -> Vec<i16> {
    let mut ids = ids.to_vec();
    ids.sort_unstable();
    ids.dedup();
    ids
}

/// Result ordering.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RowOrder {
    /// Store order.
    Unordered,
    /// Ascending great-circle distance from the point.
    DistanceFrom(GeoPoint),
}
