//! Service layer: the public read operations.
//!
//! [`MapDataService`] validates client parameters, builds a
//! [`crate::query::GeoQuery`] and hands it to a
//! [`crate::persistence::MapStore`].

pub mod map_data_service;

pub use map_data_service::MapDataService;
