use crate::error::TripError;

/// Credentials and agent ids, read once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub you_api_key: String,
    /// RouteAlt agent (alternative-route recommendations)
    pub route_alt_agent_id: String,
    /// POI agent (roadside-stop recommendations)
    pub poi_agent_id: String,
    pub google_maps_key: String,
}

impl Config {
    pub fn from_env() -> Result<Self, TripError> {
        Ok(Self {
            you_api_key: require("YOU_API_KEY")?,
            route_alt_agent_id: require("YOU_ROUTE_ID")?,
            poi_agent_id: require("YOU_AGENT_ID")?,
            google_maps_key: require("GOOGLE_MAPS_API_KEY")?,
        })
    }
}

fn require(name: &'static str) -> Result<String, TripError> {
    std::env::var(name).map_err(|_| TripError::MissingEnv(name))
}
