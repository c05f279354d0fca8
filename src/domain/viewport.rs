//! Map viewports and coordinate validation.
//!
//! A [`Viewport`] is an axis-aligned latitude/longitude box that has
//! passed validation. [`ViewportBounds`] is the raw, possibly partial
//! form a client sends; it only becomes a viewport when all four bounds
//! are present.

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Client parameter names for a viewport, in `sw_lat, sw_lng, ne_lat,
/// ne_lng` order. Used to label validation errors.
pub type BoundNames = [&'static str; 4];

/// Parameter names of the current viewport.
pub const VIEWPORT_FIELDS: BoundNames = ["swLat", "swLng", "neLat", "neLng"];

/// Parameter names of the previously acknowledged viewport.
pub const OLD_VIEWPORT_FIELDS: BoundNames = ["oSwLat", "oSwLng", "oNeLat", "oNeLng"];

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

impl GeoPoint {
    /// Creates a point without validation.
    #[must_use]
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Validated axis-aligned bounding box.
///
/// Bounds are inclusive on all four sides. A box whose south-west corner
/// lies north or east of its north-east corner is accepted and simply
/// contains nothing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// South-west latitude.
    pub sw_lat: f64,
    /// South-west longitude.
    pub sw_lng: f64,
    /// North-east latitude.
    pub ne_lat: f64,
    /// North-east longitude.
    pub ne_lng: f64,
}

impl Viewport {
    /// Creates a viewport after validating every bound.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidCoordinate`] if a bound is non-finite,
    /// a latitude lies outside `[-90, 90]` or a longitude outside
    /// `[-180, 180]`.
    pub fn new(sw_lat: f64, sw_lng: f64, ne_lat: f64, ne_lng: f64) -> Result<Self, StoreError> {
        let [sw_lat_name, sw_lng_name, ne_lat_name, ne_lng_name] = VIEWPORT_FIELDS;
        Ok(Self {
            sw_lat: check_latitude(sw_lat_name, sw_lat)?,
            sw_lng: check_longitude(sw_lng_name, sw_lng)?,
            ne_lat: check_latitude(ne_lat_name, ne_lat)?,
            ne_lng: check_longitude(ne_lng_name, ne_lng)?,
        })
    }

    /// Geometric center of the box.
    #[must_use]
    pub fn center(&self) -> GeoPoint {
        GeoPoint {
            lat: self.ne_lat - (self.ne_lat - self.sw_lat) / 2.0,
            lng: self.ne_lng - (self.ne_lng - self.sw_lng) / 2.0,
        }
    }

    /// Returns `true` if the point lies inside the box, edges included.
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.sw_lat
            && point.lat <= self.ne_lat
            && point.lng >= self.sw_lng
            && point.lng <= self.ne_lng
    }
}

/// Raw viewport bounds as received from a client. Any bound may be
/// missing.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ViewportBounds {
    /// South-west latitude.
    pub sw_lat: Option<f64>,
    /// South-west longitude.
    pub sw_lng: Option<f64>,
    /// North-east latitude.
    pub ne_lat: Option<f64>,
    /// North-east longitude.
    pub ne_lng: Option<f64>,
}

impl ViewportBounds {
    /// Bounds with all four corners present.
    #[must_use]
    pub const fn new(sw_lat: f64, sw_lng: f64, ne_lat: f64, ne_lng: f64) -> Self {
        Self {
            sw_lat: Some(sw_lat),
            sw_lng: Some(sw_lng),
            ne_lat: Some(ne_lat),
            ne_lng: Some(ne_lng),
        }
    }

    /// No bounds at all.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            sw_lat: None,
            sw_lng: None,
            ne_lat: None,
            ne_lng: None,
        }
    }

    /// Validates whichever bounds are present and builds a viewport when
    /// all four are.
    ///
    /// Returns `Ok(None)` when at least one bound is missing. `names`
    /// labels the bounds in error messages.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::InvalidCoordinate`] for the first present bound
    /// that is non-finite or out of range.
    pub fn resolve(&self, names: BoundNames) -> Result<Option<Viewport>, StoreError> {
        let [sw_lat_name, sw_lng_name, ne_lat_name, ne_lng_name] = names;
        let sw_lat = self
            .sw_lat
            .map(|v| check_latitude(sw_lat_name, v))
            .transpose()?;
        let sw_lng = self
            .sw_lng
            .map(|v| check_longitude(sw_lng_name, v))
            .transpose()?;
        let ne_lat = self
            .ne_lat
            .map(|v| check_latitude(ne_lat_name, v))
            .transpose()?;
        let ne_lng = self
            .ne_lng
            .map(|v| check_longitude(ne_lng_name, v))
            .transpose()?;

        let (Some(sw_lat), Some(sw_lng), Some(ne_lat), Some(ne_lng)) =
            (sw_lat, sw_lng, ne_lat, ne_lng)
        else {
            return Ok(None);
        };

        Ok(Some(Viewport {
            sw_lat,
            sw_lng,
            ne_lat,
            ne_lng,
        }))
    }
}

impl From<Viewport> for ViewportBounds {
    fn from(viewport: Viewport) -> Self {
        Self::new(
            viewport.sw_lat,
            viewport.sw_lng,
            viewport.ne_lat,
            viewport.ne_lng,
        )
    }
}

fn check_latitude(field: &'static str, value: f64) -> Result<f64, StoreError> {
    if value.is_finite() && (-90.0..=90.0).contains(&value) {
        Ok(value)
    } else {
        Err(StoreError::InvalidCoordinate { field, value })
    }
}

fn check_longitude(field: &'static str, value: f64) -> Result<f64, StoreError> {
    if value.is_finite() && (-180.0..=180.0).contains(&value) {
        Ok(value)
    } else {
        Err(StoreError::InvalidCoordinate { field, value })
    }
}
