//! Map data service: spawn and gym reads for map clients.

use std::sync::Arc;

use chrono::Utc;

use crate::config::StoreConfig;
use crate::domain::ViewportBounds;
use crate::error::StoreError;
use crate::persistence::MapStore;
use crate::persistence::models::{GymDetail, GymRecord, Spawn};
use crate::query::{GYM_PROFILE, GeoQuery, GeoQueryParams, SPAWN_PROFILE};

/// Read-only facade over a [`MapStore`].
///
/// Stateless apart from the configured row caps; every call validates its
/// parameters before the store is touched and returns store errors as-is.
#[derive(Debug)]
pub struct MapDataService<S> {
    store: Arc<S>,
    pokemon_limit: u32,
    gym_limit: u32,
}

impl<S> Clone for MapDataService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            pokemon_limit: self.pokemon_limit,
            gym_limit: self.gym_limit,
        }
    }
}

impl<S: MapStore> MapDataService<S> {
    /// Creates a service with the row caps from `config`.
    #[must_use]
    pub fn new(store: Arc<S>, config: &StoreConfig) -> Self {
        Self {
            store,
            pokemon_limit: config.pokemon_limit_per_query,
            gym_limit: config.gym_limit_per_query,
        }
    }

    /// Returns a reference to the inner store.
    #[must_use]
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Active spawns, optionally bounded by a viewport, excluding the
    /// blacklisted species.
    ///
    /// With `timestamp`, only spawns modified after it are returned and
    /// `old_viewport` is ignored.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed coordinates or timestamp,
    /// or the store's error.
    pub async fn get_active_spawns(
        &self,
        blacklist: &[i16],
        viewport: ViewportBounds,
        timestamp: Option<i64>,
        old_viewport: ViewportBounds,
    ) -> Result<Vec<Spawn>, StoreError> {
        let params = GeoQueryParams {
            blacklist: blacklist.to_vec(),
            viewport,
            old_viewport,
            timestamp,
            ..GeoQueryParams::default()
        };
        self.spawns(&params).await
    }

    /// Active spawns of the whitelisted species, optionally bounded by a
    /// viewport. An empty whitelist falls back to the blacklist, and an
    /// empty blacklist to no species filter.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed coordinates, or the
    /// store's error.
    pub async fn get_active_spawns_by_ids(
        &self,
        whitelist: &[i16],
        blacklist: &[i16],
        viewport: ViewportBounds,
    ) -> Result<Vec<Spawn>, StoreError> {
        let params = GeoQueryParams {
            whitelist: whitelist.to_vec(),
            blacklist: blacklist.to_vec(),
            viewport,
            ..GeoQueryParams::default()
        };
        self.spawns(&params).await
    }

    /// Gyms with their raid. Inside a viewport, results are ranked by
    /// distance from its center; without one, up to the cap are returned
    /// unordered and the sync parameters are ignored.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed coordinates or timestamp,
    /// or the store's error.
    pub async fn get_gyms(
        &self,
        viewport: ViewportBounds,
        timestamp: Option<i64>,
        old_viewport: ViewportBounds,
    ) -> Result<Vec<GymRecord>, StoreError> {
        let params = GeoQueryParams {
            viewport,
            old_viewport,
            timestamp,
            ..GeoQueryParams::default()
        };
        self.gyms(&params).await
    }

    /// A single gym with raid and members.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidRequest`] for a blank id, or the
    /// store's error.
    pub async fn get_gym(&self, gym_id: &str) -> Result<Option<GymDetail>, StoreError> {
        let gym_id = gym_id.trim();
        if gym_id.is_empty() {
            return Err(StoreError::InvalidRequest("gym id is empty".to_string()));
        }
        let gym = self.store.find_gym(gym_id).await?;
        tracing::debug!(gym_id, found = gym.is_some(), "gym lookup");
        Ok(gym)
    }

    /// Spawns for arbitrary client parameters.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed input, or the store's
    /// error.
    pub async fn spawns(&self, params: &GeoQueryParams) -> Result<Vec<Spawn>, StoreError> {
        let query = GeoQuery::build(SPAWN_PROFILE, params, self.pokemon_limit, Utc::now())?;
        let rows = self.store.find_spawns(&query).await?;
        tracing::debug!(rows = rows.len(), area = query.area.kind(), "spawns fetched");
        Ok(rows)
    }

    /// Gyms for arbitrary client parameters. Species lists are ignored.
    ///
    /// # Errors
    ///
    /// Returns a validation error for malformed input, or the store's
    /// error.
    pub async fn gyms(&self, params: &GeoQueryParams) -> Result<Vec<GymRecord>, StoreError> {
        let query = GeoQuery::build(GYM_PROFILE, params, self.gym_limit, Utc::now())?;
        let rows = self.store.find_gyms(&query).await?;
        tracing::debug!(rows = rows.len(), area = query.area.kind(), "gyms fetched");
        Ok(rows)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use chrono::Duration;

    use super::*;
    use crate::domain::{GeoPoint, Viewport};
    use crate::persistence::MemoryStore;
    use crate::persistence::models::{Gym, Raid};
    use crate::query::MapQueryString;

    fn spawn(id: &str, species: i16, lat: f64, lng: f64) -> Spawn {
        Spawn {
            encounter_id: id.to_string(),
            spawnpoint_id: format!("sp-{id}"),
            pokemon_id: species,
            latitude: lat,
            longitude: lng,
            disappear_time: Utc::now() + Duration::minutes(15),
            individual_attack: None,
            individual_defense: None,
            individual_stamina: None,
            move_1: None,
            move_2: None,
            weight: None,
            height: None,
            gender: None,
            last_modified: Some(Utc::now()),
        }
    }

    fn gym(id: &str, lat: f64, lng: f64) -> Gym {
        Gym {
            gym_id: id.to_string(),
            team_id: 3,
            guard_pokemon_id: 59,
            slots_available: 2,
            enabled: true,
            latitude: lat,
            longitude: lng,
            total_cp: 8_000,
            last_modified: Utc::now(),
            last_scanned: Some(Utc::now()),
        }
    }

    fn config(pokemon_limit: u32, gym_limit: u32) -> StoreConfig {
        StoreConfig {
            pokemon_limit_per_query: pokemon_limit,
            gym_limit_per_query: gym_limit,
            ..StoreConfig::default()
        }
    }

    fn service(store: MemoryStore) -> MapDataService<MemoryStore> {
        MapDataService::new(Arc::new(store), &StoreConfig::default())
    }

    fn ids<T>(rows: &[T], id: impl Fn(&T) -> &str) -> Vec<String> {
        let mut ids: Vec<String> = rows.iter().map(|r| id(r).to_string()).collect();
        ids.sort();
        ids
    }

    fn viewport(sw_lat: f64, sw_lng: f64, ne_lat: f64, ne_lng: f64) -> Viewport {
        let Ok(vp) = Viewport::new(sw_lat, sw_lng, ne_lat, ne_lng) else {
            panic!("valid viewport");
        };
        vp
    }

    async fn spawn_grid() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert_spawn(spawn("a", 1, 2.0, 2.0)).await;
        store.insert_spawn(spawn("b", 4, 7.0, 7.0)).await;
        store.insert_spawn(spawn("c", 7, 2.0, 8.0)).await;
        store.insert_spawn(spawn("d", 1, 20.0, 20.0)).await;
        store
    }

    #[tokio::test]
    async fn viewport_contains_every_result() {
        let svc = service(spawn_grid().await);
        let Ok(rows) = svc
            .get_active_spawns(
                &[],
                ViewportBounds::new(0.0, 0.0, 10.0, 10.0),
                None,
                ViewportBounds::none(),
            )
            .await
        else {
            panic!("query failed");
        };
        let vp = viewport(0.0, 0.0, 10.0, 10.0);
        assert!(rows.iter().all(|s| vp.contains(GeoPoint::new(s.latitude, s.longitude))));
        assert_eq!(ids(&rows, |s| s.encounter_id.as_str()), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn expired_spawns_are_never_returned() {
        let store = spawn_grid().await;
        let mut expired = spawn("old", 1, 2.0, 2.0);
        expired.disappear_time = Utc::now() - Duration::milliseconds(1000);
        store.insert_spawn(expired).await;
        let svc = service(store);

        let Ok(rows) = svc
            .get_active_spawns(&[], ViewportBounds::none(), None, ViewportBounds::none())
            .await
        else {
            panic!("query failed");
        };
        assert!(rows.iter().all(|s| s.encounter_id != "old"));
        assert_eq!(rows.len(), 4);
    }

    #[tokio::test]
    async fn blacklist_excludes_species() {
        let svc = service(spawn_grid().await);
        let Ok(rows) = svc
            .get_active_spawns(&[1], ViewportBounds::none(), None, ViewportBounds::none())
            .await
        else {
            panic!("query failed");
        };
        assert!(rows.iter().all(|s| s.pokemon_id != 1));
        assert_eq!(ids(&rows, |s| s.encounter_id.as_str()), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn whitelist_restricts_species() {
        let svc = service(spawn_grid().await);
        let Ok(rows) = svc
            .get_active_spawns_by_ids(&[4, 7], &[], ViewportBounds::none())
            .await
        else {
            panic!("query failed");
        };
        assert!(rows.iter().all(|s| [4, 7].contains(&s.pokemon_id)));
        assert_eq!(rows.len(), 2);
    }

    #[tokio::test]
    async fn empty_whitelist_is_no_filter() {
        let svc = service(spawn_grid().await);
        let Ok(rows) = svc
            .get_active_spawns_by_ids(&[], &[], ViewportBounds::new(0.0, 0.0, 10.0, 10.0))
            .await
        else {
            panic!("query failed");
        };
        assert_eq!(rows.len(), 3);
    }

    #[tokio::test]
    async fn timestamp_filters_and_skips_old_viewport() {
        let store = MemoryStore::new();
        let cutoff = Utc::now() - Duration::minutes(10);
        let mut stale = spawn("stale", 1, 2.0, 2.0);
        stale.last_modified = Some(cutoff - Duration::minutes(1));
        let mut unmodified = spawn("unmodified", 1, 3.0, 3.0);
        unmodified.last_modified = None;
        store.insert_spawn(stale).await;
        store.insert_spawn(unmodified).await;
        // Inside the old viewport but fresh: must still come back.
        store.insert_spawn(spawn("fresh-old-area", 1, 1.0, 1.0)).await;
        store.insert_spawn(spawn("fresh", 1, 8.0, 8.0)).await;
        let svc = service(store);

        let Ok(rows) = svc
            .get_active_spawns(
                &[],
                ViewportBounds::new(0.0, 0.0, 10.0, 10.0),
                Some(cutoff.timestamp_millis()),
                ViewportBounds::new(0.0, 0.0, 5.0, 5.0),
            )
            .await
        else {
            panic!("query failed");
        };
        assert!(rows.iter().all(|s| s.last_modified.is_some_and(|m| m > cutoff)));
        assert_eq!(ids(&rows, |s| s.encounter_id.as_str()), vec!["fresh", "fresh-old-area"]);
    }

    #[tokio::test]
    async fn old_viewport_is_excluded_without_timestamp() {
        let svc = service(spawn_grid().await);
        let old = viewport(0.0, 0.0, 5.0, 5.0);
        let Ok(rows) = svc
            .get_active_spawns(
                &[],
                ViewportBounds::new(0.0, 0.0, 10.0, 10.0),
                None,
                old.into(),
            )
            .await
        else {
            panic!("query failed");
        };
        assert!(rows.iter().all(|s| !old.contains(GeoPoint::new(s.latitude, s.longitude))));
        assert_eq!(ids(&rows, |s| s.encounter_id.as_str()), vec!["b", "c"]);
    }

    #[tokio::test]
    async fn row_cap_is_enforced() {
        let store = MemoryStore::new();
        for i in 0..25 {
            store
                .insert_spawn(spawn(&format!("s{i}"), 1, 1.0, f64::from(i) * 0.1))
                .await;
            store.insert_gym(gym(&format!("g{i}"), 1.0, f64::from(i) * 0.1)).await;
        }
        let svc = MapDataService::new(Arc::new(store), &config(10, 5));

        let Ok(spawns) = svc
            .get_active_spawns(&[], ViewportBounds::none(), None, ViewportBounds::none())
            .await
        else {
            panic!("query failed");
        };
        assert_eq!(spawns.len(), 10);

        let Ok(gyms) = svc
            .get_gyms(
                ViewportBounds::new(0.0, 0.0, 10.0, 10.0),
                None,
                ViewportBounds::none(),
            )
            .await
        else {
            panic!("query failed");
        };
        assert_eq!(gyms.len(), 5);
    }

    #[tokio::test]
    async fn gyms_rank_by_distance_from_center() {
        let store = MemoryStore::new();
        store.insert_gym(gym("corner", 10.0, 10.0)).await;
        store.insert_gym(gym("center", 5.0, 5.0)).await;
        let svc = service(store);

        let Ok(rows) = svc
            .get_gyms(
                ViewportBounds::new(0.0, 0.0, 10.0, 10.0),
                None,
                ViewportBounds::none(),
            )
            .await
        else {
            panic!("query failed");
        };
        let [first, second] = rows.as_slice() else {
            panic!("expected two gyms");
        };
        assert_eq!(first.gym.gym_id, "center");
        assert!(first.distance.is_some_and(|d| d < 1e-3));
        assert_eq!(second.gym.gym_id, "corner");
        assert!(second.distance.is_some_and(|d| d > 0.0));
    }

    #[tokio::test]
    async fn gyms_inside_old_viewport_are_excluded() {
        let store = MemoryStore::new();
        store.insert_gym(gym("seen", 2.0, 2.0)).await;
        store.insert_gym(gym("new", 7.0, 7.0)).await;
        store.insert_gym(gym("band", 2.0, 8.0)).await;
        let svc = service(store);

        let Ok(rows) = svc
            .get_gyms(
                ViewportBounds::new(0.0, 0.0, 10.0, 10.0),
                None,
                ViewportBounds::new(0.0, 0.0, 5.0, 5.0),
            )
            .await
        else {
            panic!("query failed");
        };
        let [first, second] = rows.as_slice() else {
            panic!("expected two gyms");
        };
        assert_eq!(first.gym.gym_id, "new");
        assert_eq!(second.gym.gym_id, "band");
        let (Some(near), Some(far)) = (first.distance, second.distance) else {
            panic!("ranked gyms carry a distance");
        };
        assert!(near < far);
    }

    #[tokio::test]
    async fn gyms_without_viewport_are_unranked_with_raid() {
        let store = MemoryStore::new();
        store.insert_gym(gym("raided", 1.0, 1.0)).await;
        store.insert_gym(gym("quiet", 50.0, 50.0)).await;
        let now = Utc::now();
        store
            .insert_raid(Raid {
                gym_id: "raided".to_string(),
                level: 5,
                pokemon_id: Some(150),
                cp: Some(45_000),
                move_1: Some(1),
                move_2: Some(2),
                spawn: now,
                start: now,
                end: now + Duration::minutes(45),
                last_scanned: now,
            })
            .await;
        let svc = service(store);

        let Ok(rows) = svc
            .get_gyms(ViewportBounds::none(), Some(0), ViewportBounds::none())
            .await
        else {
            panic!("query failed");
        };
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.distance.is_none()));
        for row in &rows {
            match row.gym.gym_id.as_str() {
                "raided" => assert_eq!(row.raid.as_ref().map(|r| r.level), Some(5)),
                _ => assert!(row.raid.is_none()),
            }
        }
    }

    #[tokio::test]
    async fn gym_timestamp_uses_last_scanned() {
        let store = MemoryStore::new();
        let cutoff = Utc::now() - Duration::minutes(5);
        let mut old = gym("old", 1.0, 1.0);
        old.last_scanned = Some(cutoff - Duration::seconds(1));
        store.insert_gym(old).await;
        store.insert_gym(gym("new", 2.0, 2.0)).await;
        let svc = service(store);

        let Ok(rows) = svc
            .get_gyms(
                ViewportBounds::new(0.0, 0.0, 10.0, 10.0),
                Some(cutoff.timestamp_millis()),
                ViewportBounds::new(0.0, 0.0, 10.0, 10.0),
            )
            .await
        else {
            panic!("query failed");
        };
        assert_eq!(ids(&rows, |r| r.gym.gym_id.as_str()), vec!["new"]);
    }

    #[tokio::test]
    async fn query_string_drives_spawn_lookup() {
        let svc = service(spawn_grid().await);
        let json = serde_json::json!({
            "swLat": 0.0, "swLng": 0.0, "neLat": 10.0, "neLng": 10.0,
            "blacklist": "4",
        });
        let Ok(q) = serde_json::from_value::<MapQueryString>(json) else {
            panic!("deserialization failed");
        };
        let Ok(rows) = svc.spawns(&q.into()).await else {
            panic!("query failed");
        };
        assert_eq!(ids(&rows, |s| s.encounter_id.as_str()), vec!["a", "c"]);
    }

    #[tokio::test]
    async fn get_gym_rejects_blank_id() {
        let svc = service(MemoryStore::new());
        assert!(matches!(
            svc.get_gym("  ").await,
            Err(StoreError::InvalidRequest(_))
        ));
        let Ok(none) = svc.get_gym("missing").await else {
            panic!("lookup failed");
        };
        assert!(none.is_none());
    }

    /// Store that counts calls and always fails.
    #[derive(Debug, Default)]
    struct BrokenStore {
        calls: AtomicUsize,
    }

    impl BrokenStore {
        fn fail<T>(&self) -> Result<T, StoreError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        }
    }

    impl MapStore for BrokenStore {
        async fn find_spawns(&self, _query: &GeoQuery) -> Result<Vec<Spawn>, StoreError> {
            self.fail()
        }

        async fn find_gyms(&self, _query: &GeoQuery) -> Result<Vec<GymRecord>, StoreError> {
            self.fail()
        }

        async fn find_gym(&self, _gym_id: &str) -> Result<Option<GymDetail>, StoreError> {
            self.fail()
        }
    }

    #[tokio::test]
    async fn validation_fails_before_store_access() {
        let store = Arc::new(BrokenStore::default());
        let svc = MapDataService::new(Arc::clone(&store), &StoreConfig::default());

        let result = svc
            .get_gyms(
                ViewportBounds::new(0.0, 0.0, 10.0, 200.0),
                None,
                ViewportBounds::none(),
            )
            .await;
        assert!(matches!(result, Err(StoreError::InvalidCoordinate { .. })));

        let result = svc
            .get_active_spawns(
                &[],
                ViewportBounds::none(),
                Some(i64::MAX),
                ViewportBounds::none(),
            )
            .await;
        assert!(matches!(result, Err(StoreError::InvalidTimestamp(_))));
        assert_eq!(store.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn store_errors_propagate_unchanged() {
        let store = Arc::new(BrokenStore::default());
        let svc = MapDataService::new(Arc::clone(&store), &StoreConfig::default());

        let result = svc
            .get_active_spawns_by_ids(&[1], &[], ViewportBounds::none())
            .await;
        assert!(matches!(
            result,
            Err(StoreError::Database(sqlx::Error::PoolTimedOut))
        ));
        assert_eq!(store.calls.load(Ordering::SeqCst), 1);
    }
}
