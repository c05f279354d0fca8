//! Persistence layer: the store seam and its backends.
//!
//! [`MapStore`] is the only thing the service layer knows about storage.
//! [`postgres::PostgresStore`] renders each [`GeoQuery`] as parameterized
//! SQL through `sqlx`; [`memory::MemoryStore`] evaluates it in process.

pub mod memory;
pub mod models;
pub mod postgres;
pub(crate) mod sql;

use std::future::Future;

use crate::error::StoreError;
use crate::query::GeoQuery;
use models::{GymDetail, GymRecord, Spawn};

pub use memory::MemoryStore;
pub use postgres::PostgresStore;

/// Read access to spawn and gym rows.
///
/// Implementations apply the query's predicate, ordering and row cap;
/// they never retry and report failures unchanged.
pub trait MapStore: Send + Sync {
    /// Spawns matching the query.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    fn find_spawns(
        &self,
        query: &GeoQuery,
    ) -> impl Future<Output = Result<Vec<Spawn>, StoreError>> + Send;

    /// Gyms matching the query, with raid joined and distance when ranked.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    fn find_gyms(
        &self,
        query: &GeoQuery,
    ) -> impl Future<Output = Result<Vec<GymRecord>, StoreError>> + Send;

    /// A single gym with raid and members, or `None`.
    ///
    /// # Errors
    ///
    /// Returns a [`StoreError`] if the backend fails.
    fn find_gym(
        &self,
        gym_id: &str,
    ) -> impl Future<Output = Result<Option<GymDetail>, StoreError>> + Send;
}
