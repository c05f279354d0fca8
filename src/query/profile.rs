//! Per-entity column names and query behaviour.

/// Describes how the shared builder treats one entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityProfile {
    /// Table name.
    pub table: &'static str,
    /// Latitude column.
    pub latitude: &'static str,
    /// Longitude column.
    pub longitude: &'static str,
    /// Column compared against the incremental-sync timestamp.
    pub modified: &'static str,
    /// Species column, if the entity can be filtered by species.
    pub species: Option<&'static str>,
    /// Expiry column; rows are only returned while it lies in the future.
    pub expiry: Option<&'static str>,
    /// Rank viewport results by distance from the viewport center.
    pub rank_by_distance: bool,
    /// Left-join the raid sub-record.
    pub joins_raid: bool,
    /// Without a viewport, return everything up to the cap and ignore the
    /// sync timestamp.
    pub sync_requires_viewport: bool,
}

/// Creature sightings (`pokemon` table).
pub const SPAWN_PROFILE: EntityProfile = EntityProfile {
    table: "pokemon",
    latitude: "latitude",
    longitude: "longitude",
    modified: "last_modified",
    species: Some("pokemon_id"),
    expiry: Some("disappear_time"),
    rank_by_distance: false,
    joins_raid: false,
    sync_requires_viewport: false,
};

/// Gyms (`gym` table).
pub const GYM_PROFILE: EntityProfile = EntityProfile {
    table: "gym",
    latitude: "latitude",
    longitude: "longitude",
    modified: "last_scanned",
    species: None,
    expiry: None,
    rank_by_distance: true,
    joins_raid: true,
    sync_requires_viewport: true,
};
