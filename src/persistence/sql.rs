//! Renders a [`GeoQuery`] as parameterized PostgreSQL.
//!
//! Every client value goes through `push_bind`; only identifiers from an
//! [`EntityProfile`] and fixed fragments are pushed as text.

use sqlx::{Postgres, QueryBuilder};

use crate::domain::{EARTH_RADIUS_MILES, GeoPoint, Viewport};
use crate::query::{EntityProfile, GYM_PROFILE, GeoQuery, RowOrder, SpeciesFilter};

const SPAWN_COLUMNS: &[&str] = &[
    "encounter_id",
    "spawnpoint_id",
    "pokemon_id",
    "latitude",
    "longitude",
    "disappear_time",
    "individual_attack",
    "individual_defense",
    "individual_stamina",
    "move_1",
    "move_2",
    "weight",
    "height",
    "gender",
    "last_modified",
];

const GYM_COLUMNS: &[&str] = &[
    "gym_id",
    "team_id",
    "guard_pokemon_id",
    "slots_available",
    "enabled",
    "latitude",
    "longitude",
    "total_cp",
    "last_modified",
    "last_scanned",
];

/// `(column, alias, type)` of joined raid columns. The type is used for a
/// typed `NULL` when the join is skipped.
const RAID_COLUMNS: &[(&str, &str, &str)] = &[
    ("gym_id", "raid_gym_id", "text"),
    ("level", "raid_level", "smallint"),
    ("pokemon_id", "raid_pokemon_id", "smallint"),
    ("cp", "raid_cp", "integer"),
    ("move_1", "raid_move_1", "smallint"),
    ("move_2", "raid_move_2", "smallint"),
    ("spawn", "raid_spawn", "timestamptz"),
    ("\"start\"", "raid_start", "timestamptz"),
    ("\"end\"", "raid_end", "timestamptz"),
    ("last_scanned", "raid_last_scanned", "timestamptz"),
];

/// `SELECT` for spawn rows.
pub(crate) fn select_spawns(query: &GeoQuery) -> QueryBuilder<'static, Postgres> {
    let table = query.profile.table;
    let mut qb = QueryBuilder::new("SELECT ");
    push_columns(&mut qb, table, SPAWN_COLUMNS);
    qb.push(format!(" FROM {table}"));
    push_predicate(&mut qb, query);
    push_order_and_limit(&mut qb, query);
    qb
}

/// `SELECT` for gym rows, shaped for `GymRaidRow`.
pub(crate) fn select_gyms(query: &GeoQuery) -> QueryBuilder<'static, Postgres> {
    let profile = &query.profile;
    let mut qb = QueryBuilder::new("SELECT ");
    push_gym_columns(&mut qb, profile.table, query.include_raid);
    qb.push(", ");
    match query.order {
        RowOrder::DistanceFrom(center) => push_distance(&mut qb, profile, center),
        RowOrder::Unordered => {
            qb.push("NULL::double precision AS distance");
        }
    }
    push_gym_from(&mut qb, profile.table, query.include_raid);
    push_predicate(&mut qb, query);
    push_order_and_limit(&mut qb, query);
    qb
}

/// `SELECT` for one gym by primary key, raid joined.
pub(crate) fn select_gym_by_id(gym_id: &str) -> QueryBuilder<'static, Postgres> {
    let table = GYM_PROFILE.table;
    let mut qb = QueryBuilder::new("SELECT ");
    push_gym_columns(&mut qb, table, true);
    qb.push(", NULL::double precision AS distance");
    push_gym_from(&mut qb, table, true);
    qb.push(format!(" WHERE {table}.gym_id = "))
        .push_bind(gym_id.to_string())
        .push(" LIMIT 1");
    qb
}

fn push_columns(qb: &mut QueryBuilder<'static, Postgres>, table: &str, columns: &[&str]) {
    let mut separated = qb.separated(", ");
    for column in columns {
        separated.push(format!("{table}.{column}"));
    }
}

fn push_gym_columns(qb: &mut QueryBuilder<'static, Postgres>, table: &str, join_raid: bool) {
    push_columns(qb, table, GYM_COLUMNS);
    for (column, alias, sql_type) in RAID_COLUMNS {
        if join_raid {
            qb.push(format!(", raid.{column} AS {alias}"));
        } else {
            qb.push(format!(", NULL::{sql_type} AS {alias}"));
        }
    }
}

fn push_gym_from(qb: &mut QueryBuilder<'static, Postgres>, table: &str, join_raid: bool) {
    qb.push(format!(" FROM {table}"));
    if join_raid {
        qb.push(format!(" LEFT JOIN raid ON raid.gym_id = {table}.gym_id"));
    }
}

/// Spherical law of cosines, clamped like [`crate::domain::distance_miles`].
fn push_distance(qb: &mut QueryBuilder<'static, Postgres>, profile: &EntityProfile, center: GeoPoint) {
    let lat = format!("{}.{}", profile.table, profile.latitude);
    let lng = format!("{}.{}", profile.table, profile.longitude);
    qb.push(format!(
        "{EARTH_RADIUS_MILES} * acos(LEAST(1.0, GREATEST(-1.0, cos(radians("
    ))
    .push_bind(center.lat)
    .push(format!(
        ")) * cos(radians({lat})) * cos(radians({lng}) - radians("
    ))
    .push_bind(center.lng)
    .push(")) + sin(radians(")
    .push_bind(center.lat)
    .push(format!(")) * sin(radians({lat}))))) AS distance"));
}

fn push_predicate(qb: &mut QueryBuilder<'static, Postgres>, query: &GeoQuery) {
    let profile = &query.profile;
    let table = profile.table;
    let mut first = true;

    if let (Some(column), Some(now)) = (profile.expiry, query.active_after) {
        push_conjunction(qb, &mut first);
        qb.push(format!("{table}.{column} > ")).push_bind(now);
    }

    if let Some(column) = profile.species {
        match &query.species {
            SpeciesFilter::Any => {}
            SpeciesFilter::Only(ids) => {
                push_conjunction(qb, &mut first);
                qb.push(format!("{table}.{column} = ANY("))
                    .push_bind(ids.clone())
                    .push(")");
            }
            SpeciesFilter::Except(ids) => {
                push_conjunction(qb, &mut first);
                qb.push(format!("{table}.{column} <> ALL("))
                    .push_bind(ids.clone())
                    .push(")");
            }
        }
    }

    if let Some(viewport) = query.area.viewport() {
        push_conjunction(qb, &mut first);
        push_box(qb, profile, viewport);
    }

    if let Some(since) = query.area.since() {
        push_conjunction(qb, &mut first);
        qb.push(format!("{table}.{} > ", profile.modified))
            .push_bind(since);
    }

    if let Some(old) = query.area.excluded() {
        push_conjunction(qb, &mut first);
        qb.push("NOT ");
        push_box(qb, profile, old);
    }
}

fn push_conjunction(qb: &mut QueryBuilder<'static, Postgres>, first: &mut bool) {
    qb.push(if *first { " WHERE " } else { " AND " });
    *first = false;
}

fn push_box(qb: &mut QueryBuilder<'static, Postgres>, profile: &EntityProfile, viewport: &Viewport) {
    let table = profile.table;
    qb.push(format!("({table}.{} BETWEEN ", profile.latitude))
        .push_bind(viewport.sw_lat)
        .push(" AND ")
        .push_bind(viewport.ne_lat)
        .push(format!(" AND {table}.{} BETWEEN ", profile.longitude))
        .push_bind(viewport.sw_lng)
        .push(" AND ")
        .push_bind(viewport.ne_lng)
        .push(")");
}

fn push_order_and_limit(qb: &mut QueryBuilder<'static, Postgres>, query: &GeoQuery) {
    if let RowOrder::DistanceFrom(_) = query.order {
        qb.push(" ORDER BY distance ASC");
    }
    qb.push(" LIMIT ").push_bind(i64::from(query.limit));
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::ViewportBounds;
    use crate::query::{GeoQueryParams, SPAWN_PROFILE};

    fn build(profile: EntityProfile, params: &GeoQueryParams) -> GeoQuery {
        let Ok(query) = GeoQuery::build(profile, params, 1000, Utc::now()) else {
            panic!("valid params");
        };
        query
    }

    #[test]
    fn bare_spawn_query_filters_expiry_only() {
        let qb = select_spawns(&build(SPAWN_PROFILE, &GeoQueryParams::default()));
        let sql = qb.sql();
        assert!(sql.starts_with("SELECT pokemon.encounter_id, pokemon.spawnpoint_id"));
        assert!(sql.contains(" FROM pokemon WHERE pokemon.disappear_time > $1 LIMIT $2"));
        assert!(!sql.contains("ORDER BY"));
    }

    #[test]
    fn empty_species_lists_generate_no_set_test() {
        let params = GeoQueryParams {
            whitelist: vec![],
            blacklist: vec![],
            ..GeoQueryParams::default()
        };
        let qb = select_spawns(&build(SPAWN_PROFILE, &params));
        assert!(!qb.sql().contains("ANY("));
        assert!(!qb.sql().contains("ALL("));
    }

    #[test]
    fn whitelist_and_blacklist_render_set_tests() {
        let only = GeoQueryParams {
            whitelist: vec![1, 4],
            ..GeoQueryParams::default()
        };
        let qb = select_spawns(&build(SPAWN_PROFILE, &only));
        assert!(qb.sql().contains("pokemon.pokemon_id = ANY($2)"));

        let except = GeoQueryParams {
            blacklist: vec![16],
            ..GeoQueryParams::default()
        };
        let qb = select_spawns(&build(SPAWN_PROFILE, &except));
        assert!(qb.sql().contains("pokemon.pokemon_id <> ALL($2)"));
    }

    #[test]
    fn spawn_exclusion_negates_old_box() {
        let params = GeoQueryParams {
            viewport: ViewportBounds::new(0.0, 0.0, 10.0, 10.0),
            old_viewport: ViewportBounds::new(0.0, 0.0, 5.0, 5.0),
            ..GeoQueryParams::default()
        };
        let qb = select_spawns(&build(SPAWN_PROFILE, &params));
        assert!(qb.sql().contains(
            " AND (pokemon.latitude BETWEEN $2 AND $3 AND pokemon.longitude BETWEEN $4 AND $5) \
             AND NOT (pokemon.latitude BETWEEN $6 AND $7 AND pokemon.longitude BETWEEN $8 AND $9) \
             LIMIT $10"
        ));
    }

    #[test]
    fn spawn_timestamp_skips_exclusion() {
        let params = GeoQueryParams {
            viewport: ViewportBounds::new(0.0, 0.0, 10.0, 10.0),
            old_viewport: ViewportBounds::new(0.0, 0.0, 5.0, 5.0),
            timestamp: Some(1_500_000_000_000),
            ..GeoQueryParams::default()
        };
        let qb = select_spawns(&build(SPAWN_PROFILE, &params));
        assert!(qb.sql().contains("pokemon.last_modified > $6"));
        assert!(!qb.sql().contains("NOT ("));
    }

    #[test]
    fn gym_without_viewport_joins_raid_unordered() {
        let qb = select_gyms(&build(GYM_PROFILE, &GeoQueryParams::default()));
        let sql = qb.sql();
        assert!(sql.contains("raid.\"end\" AS raid_end"));
        assert!(sql.contains("NULL::double precision AS distance"));
        assert!(sql.ends_with(" FROM gym LEFT JOIN raid ON raid.gym_id = gym.gym_id LIMIT $1"));
    }

    #[test]
    fn gym_viewport_ranks_by_distance() {
        let params = GeoQueryParams {
            viewport: ViewportBounds::new(0.0, 0.0, 10.0, 10.0),
            timestamp: Some(1_500_000_000_000),
            ..GeoQueryParams::default()
        };
        let qb = select_gyms(&build(GYM_PROFILE, &params));
        let sql = qb.sql();
        assert!(sql.contains(
            "3959 * acos(LEAST(1.0, GREATEST(-1.0, cos(radians($1)) * cos(radians(gym.latitude)) \
             * cos(radians(gym.longitude) - radians($2)) + sin(radians($3)) \
             * sin(radians(gym.latitude))))) AS distance"
        ));
        assert!(sql.contains(" WHERE (gym.latitude BETWEEN $4 AND $5"));
        assert!(sql.contains(" AND gym.last_scanned > $8"));
        assert!(sql.ends_with(" ORDER BY distance ASC LIMIT $9"));
    }

    #[test]
    fn gym_by_id_filters_primary_key() {
        let qb = select_gym_by_id("abc");
        assert!(qb.sql().ends_with(" WHERE gym.gym_id = $1 LIMIT 1"));
        assert!(qb.sql().contains(&format!(" FROM {} LEFT JOIN raid", GYM_PROFILE.table)));
    }

    #[test]
    fn gym_exclusion_negates_old_box_before_ranking() {
        let params = GeoQueryParams {
            viewport: ViewportBounds::new(0.0, 0.0, 10.0, 10.0),
            old_viewport: ViewportBounds::new(0.0, 0.0, 5.0, 5.0),
            ..GeoQueryParams::default()
        };
        let qb = select_gyms(&build(GYM_PROFILE, &params));
        assert!(qb.sql().ends_with(
            " WHERE (gym.latitude BETWEEN $4 AND $5 AND gym.longitude BETWEEN $6 AND $7) \
             AND NOT (gym.latitude BETWEEN $8 AND $9 AND gym.longitude BETWEEN $10 AND $11) \
             ORDER BY distance ASC LIMIT $12"
        ));
    }
}
