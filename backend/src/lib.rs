pub mod agent;
pub mod config;
pub mod enrich;
pub mod error;
pub mod geo;
pub mod gpx_export;
pub mod kml;
pub mod models;
pub mod places;
pub mod retry;
pub mod route_alt;
pub mod sample;
pub mod simplify;
pub mod track;

use std::sync::Arc;
use std::time::Duration;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::post};
use shared::{ApiError, Bounds, Coordinate};
use tokio::sync::Mutex;
use tower_http::cors::CorsLayer;

use crate::agent::{PoiOutcome, RouteAltOutcome};
use crate::config::Config;
use crate::enrich::{CancelFlag, PhotoCache, DEFAULT_ENRICH_CONCURRENCY};
use crate::error::TripError;
use crate::gpx_export::encode_track_as_gpx;
use crate::models::{
    OverlayRequest, OverlayResponse, PhotoRequest, PoiRequest, PoiResponse, RouteAltRequest,
    TrackRequest, TrackResponse,
};
use crate::retry::with_retry;

const PHOTO_LOOKUP_RETRIES: u32 = 2;
const PHOTO_LOOKUP_BASE_DELAY: Duration = Duration::from_millis(300);

#[derive(Clone)]
pub struct AppState {
    pub http: reqwest::Client,
    pub config: Arc<Config>,
    pub photos: Arc<PhotoCache>,
    /// Flag of the most recent POI enrichment batch; each new request
    /// supersedes (cancels) the previous one.
    pub active_enrichment: Arc<Mutex<CancelFlag>>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            config: Arc::new(config),
            photos: Arc::new(PhotoCache::default()),
            active_enrichment: Arc::new(Mutex::new(CancelFlag::new())),
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/track", post(track_handler))
        .route("/api/overlay", post(overlay_handler))
        .route("/api/route-alt", post(route_alt_handler))
        .route("/api/photos", post(photos_handler))
        .route("/api/pois", post(pois_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn track_handler(
    Json(req): Json<TrackRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let tolerance = req.tolerance_meters.unwrap_or(track::PREVIEW_TOLERANCE_M);
    if !tolerance.is_finite() || tolerance < 0.0 {
        return Err(bad_request("tolerance_meters must be non-negative"));
    }

    let path = track::parse_gpx_trackpoints(&req.xml);
    let simplified = simplify::simplify(&path, tolerance);
    tracing::debug!(
        "track parsed: {} points, {} after simplification",
        path.len(),
        simplified.len()
    );

    let samples = sample::sample_route(&simplified, sample::DEFAULT_SAMPLE_STEP_KM);
    let distance_km = geo::path_distance_meters(&simplified) / 1000.0;
    let gpx_base64 = encode_track_as_gpx(&simplified, "roadtripper track").map_err(internal_error)?;

    Ok(Json(TrackResponse {
        point_count: path.len(),
        path: simplified,
        samples,
        distance_km,
        gpx_base64,
    }))
}

async fn overlay_handler(
    Json(req): Json<OverlayRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    let mut paths = kml::parse_kml_linestrings(&req.xml, kml::DEFAULT_OVERLAY_TOLERANCE_M);
    let truncated = paths.len() > kml::MAX_OVERLAY_PATHS;
    if truncated {
        tracing::warn!(
            "overlay has {} linestrings, capping at {}",
            paths.len(),
            kml::MAX_OVERLAY_PATHS
        );
        paths.truncate(kml::MAX_OVERLAY_PATHS);
    }
    Ok(Json(OverlayResponse { paths, truncated }))
}

async fn route_alt_handler(
    State(state): State<AppState>,
    Json(req): Json<RouteAltRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    if req.origin.trim().is_empty() || req.destination.trim().is_empty() {
        return Err(bad_request("Missing origin or destination"));
    }

    match agent::fetch_route_alternatives(&state.http, &state.config, &req)
        .await
        .map_err(bad_gateway)?
    {
        RouteAltOutcome::Parsed(parsed) => Ok(Json(parsed)),
        RouteAltOutcome::Refused { status, message } => Err(refusal(status, message)),
    }
}

async fn photos_handler(
    State(state): State<AppState>,
    Json(req): Json<PhotoRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    if req.name.trim().is_empty() {
        return Err(bad_request("Missing name"));
    }

    if let Some(cached) = state.photos.get(&req.name).await {
        return Ok(Json(cached));
    }

    let info = with_retry(
        || places::lookup_place_photo(&state.http, &state.config.google_maps_key, &req.name, req.bounds),
        PHOTO_LOOKUP_RETRIES,
        PHOTO_LOOKUP_BASE_DELAY,
    )
    .await
    .map_err(internal_error)?;

    state.photos.insert(&req.name, info.clone()).await;
    Ok(Json(info))
}

async fn pois_handler(
    State(state): State<AppState>,
    Json(req): Json<PoiRequest>,
) -> Result<impl IntoResponse, (StatusCode, Json<ApiError>)> {
    if req.origin.trim().is_empty() || req.destination.trim().is_empty() {
        return Err(bad_request("Missing origin or destination"));
    }

    let cancel = {
        let mut active = state.active_enrichment.lock().await;
        active.cancel();
        *active = CancelFlag::new();
        active.clone()
    };

    let pois = match agent::fetch_pois(&state.http, &state.config, &req)
        .await
        .map_err(bad_gateway)?
    {
        PoiOutcome::Pois(pois) => pois,
        PoiOutcome::Refused { status, message } => return Err(refusal(status, message)),
    };

    let bounds = bounds_from_samples(&req.samples);
    let enriched = enrich::enrich_pois(
        &pois,
        |poi| {
            let http = &state.http;
            let key = &state.config.google_maps_key;
            async move {
                with_retry(
                    || places::lookup_place_photo(http, key, &poi.name, bounds),
                    PHOTO_LOOKUP_RETRIES,
                    PHOTO_LOOKUP_BASE_DELAY,
                )
                .await
            }
        },
        DEFAULT_ENRICH_CONCURRENCY,
        &state.photos,
        &cancel,
    )
    .await;

    Ok(Json(PoiResponse { pois: enriched }))
}

fn bounds_from_samples(samples: &[Coordinate]) -> Option<Bounds> {
    let first = samples.first()?;
    let mut bounds = Bounds {
        north: first.lat,
        south: first.lat,
        east: first.lon,
        west: first.lon,
    };
    for p in &samples[1..] {
        bounds.north = bounds.north.max(p.lat);
        bounds.south = bounds.south.min(p.lat);
        bounds.east = bounds.east.max(p.lon);
        bounds.west = bounds.west.min(p.lon);
    }
    Some(bounds)
}

fn bad_request(message: &str) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::BAD_REQUEST,
        Json(ApiError {
            message: message.to_string(),
        }),
    )
}

fn internal_error(err: TripError) -> (StatusCode, Json<ApiError>) {
    tracing::error!("request failed: {err}");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}

fn bad_gateway(err: TripError) -> (StatusCode, Json<ApiError>) {
    tracing::warn!("upstream agent call failed: {err}");
    (
        StatusCode::BAD_GATEWAY,
        Json(ApiError {
            message: err.to_string(),
        }),
    )
}

fn refusal(status: u16, message: String) -> (StatusCode, Json<ApiError>) {
    (
        StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
        Json(ApiError { message }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds_from_samples() {
        let samples = vec![
            Coordinate {
                lat: 40.0,
                lon: -75.0,
            },
            Coordinate {
                lat: 41.0,
                lon: -74.5,
            },
            Coordinate {
                lat: 39.5,
                lon: -76.0,
            },
        ];
        let bounds = bounds_from_samples(&samples).expect("bounds");
        assert_eq!(bounds.north, 41.0);
        assert_eq!(bounds.south, 39.5);
        assert_eq!(bounds.east, -74.5);
        assert_eq!(bounds.west, -76.0);
    }

    #[test]
    fn test_bounds_empty_samples() {
        assert!(bounds_from_samples(&[]).is_none());
    }
}
