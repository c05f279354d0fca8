//! Domain layer: coordinates, viewports and great-circle distance.
//!
//! These types are independent of any store. Everything a client sends
//! as raw numbers is validated here before a query is built.

pub mod distance;
pub mod timestamp;
pub mod viewport;

pub use distance::{EARTH_RADIUS_MILES, distance_miles};
pub use timestamp::timestamp_from_millis;
pub use viewport::{GeoPoint, Viewport, ViewportBounds};
