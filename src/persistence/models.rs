//! Database models for spawns, gyms, raids and gym members.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

use crate::domain::GeoPoint;
use crate::query::GeoRecord;

/// A row from the `pokemon` table: one creature sighting.
///
/// The record is logically expired once `disappear_time` has passed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Spawn {
    /// Encounter identifier (primary key).
    pub encounter_id: String,
    /// Spawn point the creature appeared at.
    pub spawnpoint_id: String,
    /// Species identifier.
    pub pokemon_id: i16,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Instant at which the sighting expires.
    pub disappear_time: DateTime<Utc>,
    /// Attack IV, when scanned.
    pub individual_attack: Option<i16>,
    /// Defense IV, when scanned.
    pub individual_defense: Option<i16>,
    /// Stamina IV, when scanned.
    pub individual_stamina: Option<i16>,
    /// Fast move identifier.
    pub move_1: Option<i16>,
    /// Charged move identifier.
    pub move_2: Option<i16>,
    /// Weight in kilograms.
    pub weight: Option<f32>,
    /// Height in metres.
    pub height: Option<f32>,
    /// Gender code.
    pub gender: Option<i16>,
    /// Last time the ingestion process touched this row.
    pub last_modified: Option<DateTime<Utc>>,
}

impl GeoRecord for Spawn {
    fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.last_modified
    }

    fn species(&self) -> Option<i16> {
        Some(self.pokemon_id)
    }

    fn expires_at(&self) -> Option<DateTime<Utc>> {
        Some(self.disappear_time)
    }
}

/// A row from the `gym` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Gym {
    /// Gym identifier (primary key).
    pub gym_id: String,
    /// Controlling team.
    pub team_id: i16,
    /// Species of the defending creature.
    pub guard_pokemon_id: i16,
    /// Free defender slots.
    pub slots_available: i16,
    /// Whether the gym is currently enabled.
    pub enabled: bool,
    /// Latitude in degrees.
    pub latitude: f64,
    /// Longitude in degrees.
    pub longitude: f64,
    /// Combined combat power of the defenders.
    pub total_cp: i16,
    /// Last change to the gym's control state.
    pub last_modified: DateTime<Utc>,
    /// Last time a scanner saw the gym.
    pub last_scanned: Option<DateTime<Utc>>,
}

impl GeoRecord for Gym {
    fn position(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }

    fn modified_at(&self) -> Option<DateTime<Utc>> {
        self.last_scanned
    }
}

/// A row from the `raid` table, at most one per gym.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Raid {
    /// Gym hosting the raid.
    pub gym_id: String,
    /// Raid tier.
    pub level: i16,
    /// Boss species, once hatched.
    pub pokemon_id: Option<i16>,
    /// Boss combat power.
    pub cp: Option<i32>,
    /// Boss fast move.
    pub move_1: Option<i16>,
    /// Boss charged move.
    pub move_2: Option<i16>,
    /// Instant the egg appeared.
    pub spawn: DateTime<Utc>,
    /// Instant the battle opens.
    pub start: DateTime<Utc>,
    /// Instant the raid ends.
    pub end: DateTime<Utc>,
    /// Last time a scanner saw the raid.
    pub last_scanned: DateTime<Utc>,
}

/// A row from the `gymmember` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct GymMember {
    /// Gym the creature defends.
    pub gym_id: String,
    /// Unique identifier of the deployed creature.
    pub pokemon_uid: String,
    /// Last time a scanner saw the member.
    pub last_scanned: DateTime<Utc>,
    /// Instant the creature was deployed.
    pub deployment_time: DateTime<Utc>,
    /// Combat power after motivation decay.
    pub cp_decayed: i16,
}

/// Always-empty `pokemon` list kept on serialized gyms so existing
/// clients still find the key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegacyPokemonList;

impl Serialize for LegacyPokemonList {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(std::iter::empty::<u8>())
    }
}

/// A gym as returned by a viewport query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GymRecord {
    /// Gym columns.
    #[serde(flatten)]
    pub gym: Gym,
    /// Joined raid, `null` when the gym has none.
    pub raid: Option<Raid>,
    /// Miles from the viewport center; present only for ranked queries.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
    /// Legacy empty list.
    pub pokemon: LegacyPokemonList,
}

impl GymRecord {
    /// Wraps a gym with its optional raid and distance.
    #[must_use]
    pub fn new(gym: Gym, raid: Option<Raid>, distance: Option<f64>) -> Self {
        Self {
            gym,
            raid,
            distance,
            pokemon: LegacyPokemonList,
        }
    }
}

/// A single gym with its raid and defending members.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GymDetail {
    /// Gym columns.
    #[serde(flatten)]
    pub gym: Gym,
    /// Joined raid, `null` when the gym has none.
    pub raid: Option<Raid>,
    /// Defending members.
    pub members: Vec<GymMember>,
    /// Legacy empty list.
    pub pokemon: LegacyPokemonList,
}

/// Flat row of a `gym LEFT JOIN raid` select.
///
/// Raid columns are prefixed with `raid_` and all nullable because of the
/// outer join; `distance` is `NULL` unless the query ranks by distance.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct GymRaidRow {
    #[sqlx(flatten)]
    pub gym: Gym,
    pub raid_gym_id: Option<String>,
    pub raid_level: Option<i16>,
    pub raid_pokemon_id: Option<i16>,
    pub raid_cp: Option<i32>,
    pub raid_move_1: Option<i16>,
    pub raid_move_2: Option<i16>,
    pub raid_spawn: Option<DateTime<Utc>>,
    pub raid_start: Option<DateTime<Utc>>,
    pub raid_end: Option<DateTime<Utc>>,
    pub raid_last_scanned: Option<DateTime<Utc>>,
    pub distance: Option<f64>,
}

impl GymRaidRow {
    fn take_raid(&mut self) -> Option<Raid> {
        let (Some(gym_id), Some(level), Some(spawn), Some(start), Some(end), Some(last_scanned)) = (
            self.raid_gym_id.take(),
            self.raid_level,
            self.raid_spawn,
            self.raid_start,
            self.raid_end,
            self.raid_last_scanned,
        ) else {
            return None;
        };
        Some(Raid {
            gym_id,
            level,
            pokemon_id: self.raid_pokemon_id,
            cp: self.raid_cp,
            move_1: self.raid_move_1,
            move_2: self.raid_move_2,
            spawn,
            start,
            end,
            last_scanned,
        })
    }

    pub(crate) fn into_record(mut self) -> GymRecord {
        let raid = self.take_raid();
        GymRecord::new(self.gym, raid, self.distance)
    }
}
