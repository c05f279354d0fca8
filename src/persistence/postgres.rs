//! PostgreSQL implementation of the persistence layer.

use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

use super::MapStore;
use super::models::{GymDetail, GymMember, GymRaidRow, GymRecord, Spawn};
use super::sql;
use crate::config::StoreConfig;
use crate::error::StoreError;
use crate::query::GeoQuery;

/// PostgreSQL-backed store using `sqlx::PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Creates a store over an existing connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens a connection pool sized by the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Database`] if the database is unreachable.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(config.connect_timeout())
            .connect(&config.database_url)
            .await
            .inspect_err(|e| tracing::warn!(error = %e, "database connection failed"))?;

        tracing::info!(
            max_connections = config.database_max_connections,
            "connected to map database"
        );
        Ok(Self::new(pool))
    }

    /// Returns the underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl MapStore for PostgresStore {
    async fn find_spawns(&self, query: &GeoQuery) -> Result<Vec<Spawn>, StoreError> {
        let mut builder = sql::select_spawns(query);
        let rows = builder
            .build_query_as::<Spawn>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn find_gyms(&self, query: &GeoQuery) -> Result<Vec<GymRecord>, StoreError> {
        let mut builder = sql::select_gyms(query);
        let rows = builder
            .build_query_as::<GymRaidRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(GymRaidRow::into_record).collect())
    }

    async fn find_gym(&self, gym_id: &str) -> Result<Option<GymDetail>, StoreError> {
        let mut builder = sql::select_gym_by_id(gym_id);
        let row = builder
            .build_query_as::<GymRaidRow>()
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let members = sqlx::query_as::<_, GymMember>(
            "SELECT gym_id, pokemon_uid, last_scanned, deployment_time, cp_decayed \
             FROM gymmember WHERE gym_id = $1 ORDER BY deployment_time ASC",
        )
        .bind(gym_id)
        .fetch_all(&self.pool)
        .await?;

        let record = row.into_record();
        Ok(Some(GymDetail {
            gym: record.gym,
            raid: record.raid,
            members,
            pokemon: record.pokemon,
        }))
    }
}
