//! # pogomap-store
//!
//! Viewport-aware read access to spawn and gym records for a live map.
//!
//! Map clients send a visible bounding box, optionally the box they saw
//! last and the time of their last sync. This crate turns those
//! parameters into an explicit query, validates them, and runs the query
//! against PostgreSQL or an in-memory store.
//!
//! ## Architecture
//!
//! ```text
//! API layer (not part of this crate)
//!     │
//!     ├── MapDataService (service/)
//!     │
//!     ├── GeoQuery builder (query/)
//!     ├── Viewport, distance (domain/)
//!     │
//!     ├── MapStore trait (persistence/)
//!     ├── PostgresStore ── sqlx::PgPool
//!     └── MemoryStore
//! ```

pub mod config;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod query;
pub mod service;
pub mod telemetry;
