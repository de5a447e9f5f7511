use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lon.is_finite()
    }
}

/// Rectangular map bounds used to bias place searches near the route.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutePreferences {
    #[serde(default)]
    pub avoid_highways: bool,
    #[serde(default)]
    pub avoid_tolls: bool,
    #[serde(default)]
    pub prefer_curvy: bool,
    #[serde(default = "default_max_extra_time")]
    pub max_extra_time_min: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region_hint: Option<String>,
}

impl Default for RoutePreferences {
    fn default() -> Self {
        Self {
            avoid_highways: false,
            avoid_tolls: false,
            prefer_curvy: false,
            max_extra_time_min: default_max_extra_time(),
            region_hint: None,
        }
    }
}

pub fn default_max_extra_time() -> u32 {
    40
}

/// One candidate route among the alternatives the agent proposes.
/// Distance and duration stay as display text because the agent reports
/// them in prose; `delta_minutes` and `curvy_percent` are the only
/// numeric summary fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteAlternative {
    pub id: String,
    pub name: String,
    pub origin: String,
    pub destination: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub waypoints: Option<Vec<String>>,
    pub distance_text: String,
    pub duration_text: String,
    pub delta_minutes: i32,
    pub curvy_percent: u8,
    pub why_text: Vec<String>,
    pub key_roads: Vec<String>,
    #[serde(default)]
    pub is_recommended: bool,
}

/// A recommended roadside stop, optionally enriched with photo data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poi {
    pub id: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tips: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// Auxiliary photo data attached to a named place by the enrichment pool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PhotoInfo {
    pub photo_url: Option<String>,
    pub attribution: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
}
