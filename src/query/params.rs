//! Client-facing query parameters.

use serde::{Deserialize, Deserializer};

use crate::domain::ViewportBounds;

/// Validated-later builder input. Every field is optional; empty species
/// lists mean no species filter.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoQueryParams {
    /// Species to include exclusively.
    pub whitelist: Vec<i16>,
    /// Species to exclude.
    pub blacklist: Vec<i16>,
    /// Current viewport.
    pub viewport: ViewportBounds,
    /// Viewport the client already holds rows for.
    pub old_viewport: ViewportBounds,
    /// Incremental-sync cutoff, POSIX milliseconds.
    pub timestamp: Option<i64>,
}

/// Parameters in the shape map clients send them (`swLat`, `oNeLng`,
/// `timestamp`, ...).
///
/// Species lists accept either a JSON array or a comma-separated string
/// such as `"16,19,41"`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapQueryString {
    /// Species to include exclusively.
    #[serde(default, deserialize_with = "species_list")]
    pub whitelist: Vec<i16>,
    /// Species to exclude.
    #[serde(default, deserialize_with = "species_list")]
    pub blacklist: Vec<i16>,
    /// South-west latitude.
    pub sw_lat: Option<f64>,
    /// South-west longitude.
    pub sw_lng: Option<f64>,
    /// North-east latitude.
    pub ne_lat: Option<f64>,
    /// North-east longitude.
    pub ne_lng: Option<f64>,
    /// Old south-west latitude.
    pub o_sw_lat: Option<f64>,
    /// Old south-west longitude.
    pub o_sw_lng: Option<f64>,
    /// Old north-east latitude.
    pub o_ne_lat: Option<f64>,
    /// Old north-east longitude.
    pub o_ne_lng: Option<f64>,
    /// Incremental-sync cutoff, POSIX milliseconds.
    pub timestamp: Option<i64>,
}

impl From<MapQueryString> for GeoQueryParams {
    fn from(q: MapQueryString) -> Self {
        Self {
            whitelist: q.whitelist,
            blacklist: q.blacklist,
            viewport: ViewportBounds {
                sw_lat: q.sw_lat,
                sw_lng: q.sw_lng,
                ne_lat: q.ne_lat,
                ne_lng: q.ne_lng,
            },
            old_viewport: ViewportBounds {
                sw_lat: q.o_sw_lat,
                sw_lng: q.o_sw_lng,
                ne_lat: q.o_ne_lat,
                ne_lng: q.o_ne_lng,
            },
            timestamp: q.timestamp,
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrCsv {
    List(Vec<i16>),
    Csv(String),
}

fn species_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<i16>, D::Error> {
    match ListOrCsv::deserialize(deserializer)? {
        ListOrCsv::List(ids) => Ok(ids),
        ListOrCsv::Csv(raw) => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<i16>()
                    .map_err(|_| serde::de::Error::custom(format!("invalid species id: {s}")))
            })
            .collect(),
    }
}
