//! Great-circle distance on a spherical Earth.
//!
//! Uses the spherical law of cosines, which is what the SQL backend
//! renders as a computed `distance` column. Both paths must agree, so
//! the formula lives here once and the SQL text mirrors it.

use super::GeoPoint;

/// Mean Earth radius in statute miles.
pub const EARTH_RADIUS_MILES: f64 = 3959.0;

/// Distance in miles between two points.
///
/// `3959 * acos(cos(φ1)·cos(φ2)·cos(λ2 − λ1) + sin(φ1)·sin(φ2))`
///
/// The cosine term is clamped to `[-1, 1]`: for identical or antipodal
/// points rounding can push it just outside the domain of `acos`.
///
/// # Arguments
///
/// * `from` - Reference point (the viewport center in gym queries)
/// * `to` - Candidate row position
#[must_use]
pub fn distance_miles(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lng = to.lng.to_radians() - from.lng.to_radians();

    let cos_angle = lat1.cos() * lat2.cos() * delta_lng.cos() + lat1.sin() * lat2.sin();
    EARTH_RADIUS_MILES * cos_angle.clamp(-1.0, 1.0).acos()
}
