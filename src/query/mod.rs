//! Geo-query builder.
//!
//! Turns optional client parameters (viewport, old viewport, sync
//! timestamp, species lists) into an explicit [`GeoQuery`]: a tagged
//! area predicate, a species predicate, an ordering and a row cap. One
//! builder serves both entity kinds; an [`EntityProfile`] supplies the
//! column names and the per-entity behaviour.
//!
//! The query is store-agnostic. The PostgreSQL backend renders it as SQL,
//! the in-memory backend evaluates it with [`GeoQuery::matches`].

pub mod builder;
pub mod filter;
pub mod params;
pub mod profile;
pub mod record;

pub use builder::GeoQuery;
pub use filter::{AreaFilter, RowOrder, SpeciesFilter};
pub use params::{GeoQueryParams, MapQueryString};
pub use profile::{EntityProfile, GYM_PROFILE, SPAWN_PROFILE};
pub use record::GeoRecord;
