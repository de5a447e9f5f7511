use serde::{Deserialize, Serialize};
use shared::{Bounds, Coordinate, Poi, RoutePreferences};

#[derive(Debug, Deserialize)]
pub struct TrackRequest {
    pub xml: String,
    /// Simplification tolerance in meters; defaults to the on-screen
    /// preview tolerance.
    #[serde(default)]
    pub tolerance_meters: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TrackResponse {
    pub path: Vec<Coordinate>,
    pub samples: Vec<Coordinate>,
    pub distance_km: f64,
    pub gpx_base64: String,
    pub point_count: usize,
}

#[derive(Debug, Deserialize)]
pub struct OverlayRequest {
    pub xml: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OverlayResponse {
    pub paths: Vec<Vec<Coordinate>>,
    /// True when the rendering cap dropped trailing linestrings.
    pub truncated: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RouteAltRequest {
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub waypoints: Vec<String>,
    #[serde(default)]
    pub prefs: RoutePreferences,
}

#[derive(Debug, Deserialize)]
pub struct PhotoRequest {
    pub name: String,
    #[serde(default)]
    pub bounds: Option<Bounds>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PoiResponse {
    pub pois: Vec<Poi>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PoiRequest {
    pub origin: String,
    pub destination: String,
    #[serde(default)]
    pub date_iso: Option<String>,
    #[serde(default)]
    pub samples: Vec<Coordinate>,
    #[serde(default)]
    pub preference: Option<String>,
}
