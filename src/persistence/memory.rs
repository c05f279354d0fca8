//! In-process store that evaluates queries with [`GeoQuery::matches`].
//!
//! Tables are plain maps behind a [`tokio::sync::RwLock`], so concurrent
//! reads never block each other. Rows are loaded with the `insert_*`
//! methods; there is no other write path.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::MapStore;
use super::models::{Gym, GymDetail, GymMember, GymRecord, LegacyPokemonList, Raid, Spawn};
use crate::domain::distance_miles;
use crate::error::StoreError;
use crate::query::{GeoQuery, GeoRecord, RowOrder};

#[derive(Debug, Default)]
struct Tables {
    spawns: HashMap<String, Spawn>,
    gyms: HashMap<String, Gym>,
    raids: HashMap<String, Raid>,
    members: HashMap<String, Vec<GymMember>>,
}

/// Map data held in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a spawn keyed by encounter id.
    pub async fn insert_spawn(&self, spawn: Spawn) {
        let mut tables = self.tables.write().await;
        tables.spawns.insert(spawn.encounter_id.clone(), spawn);
    }

    /// Inserts or replaces a gym keyed by gym id.
    pub async fn insert_gym(&self, gym: Gym) {
        let mut tables = self.tables.write().await;
        tables.gyms.insert(gym.gym_id.clone(), gym);
    }

    /// Inserts or replaces the raid of a gym.
    pub async fn insert_raid(&self, raid: Raid) {
        let mut tables = self.tables.write().await;
        tables.raids.insert(raid.gym_id.clone(), raid);
    }

    /// Appends a member to a gym.
    pub async fn insert_member(&self, member: GymMember) {
        let mut tables = self.tables.write().await;
        tables
            .members
            .entry(member.gym_id.clone())
            .or_default()
            .push(member);
    }

    /// Number of stored spawns, expired ones included.
    pub async fn spawn_count(&self) -> usize {
        self.tables.read().await.spawns.len()
    }

    /// Number of stored gyms.
    pub async fn gym_count(&self) -> usize {
        self.tables.read().await.gyms.len()
    }
}

fn cap(limit: u32) -> usize {
    usize::try_from(limit).unwrap_or(usize::MAX)
}

impl MapStore for MemoryStore {
    async fn find_spawns(&self, query: &GeoQuery) -> Result<Vec<Spawn>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .spawns
            .values()
            .filter(|spawn| query.matches(*spawn))
            .take(cap(query.limit))
            .cloned()
            .collect())
    }

    async fn find_gyms(&self, query: &GeoQuery) -> Result<Vec<GymRecord>, StoreError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<GymRecord> = tables
            .gyms
            .values()
            .filter(|gym| query.matches(*gym))
            .map(|gym| {
                let raid = if query.include_raid {
                    tables.raids.get(&gym.gym_id).cloned()
                } else {
                    None
                };
                let distance = match query.order {
                    RowOrder::DistanceFrom(center) => Some(distance_miles(center, gym.position())),
                    RowOrder::Unordered => None,
                };
                GymRecord::new(gym.clone(), raid, distance)
            })
            .collect();
        if let RowOrder::DistanceFrom(_) = query.order {
            rows.sort_by(|a, b| {
                a.distance
                    .unwrap_or(f64::MAX)
                    .total_cmp(&b.distance.unwrap_or(f64::MAX))
            });
        }
        rows.truncate(cap(query.limit));
        Ok(rows)
    }

    async fn find_gym(&self, gym_id: &str) -> Result<Option<GymDetail>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.gyms.get(gym_id).map(|gym| GymDetail {
            gym: gym.clone(),
            raid: tables.raids.get(gym_id).cloned(),
            members: tables.members.get(gym_id).cloned().unwrap_or_default(),
            pokemon: LegacyPokemonList,
        }))
    }
}
