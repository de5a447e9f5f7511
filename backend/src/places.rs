//! Google Places photo lookup for roadside stops.
//!
//! One text search biased to the route's bounds, then a details fetch
//! for a website link when a place id is available. A place with no
//! photo is a definitive empty result, not an error; only transport
//! and upstream-status failures surface as `Err` so the caller's retry
//! wrapper can act on them.

use reqwest::Client;
use shared::{Bounds, PhotoInfo};

use crate::error::TripError;

const TEXT_SEARCH_URL: &str = "https://maps.googleapis.com/maps/api/place/textsearch/json";
const DETAILS_URL: &str = "https://maps.googleapis.com/maps/api/place/details/json";
const PHOTO_URL: &str = "https://maps.googleapis.com/maps/api/place/photo";
const PHOTO_MAX_WIDTH: &str = "480";

#[derive(Debug, serde::Deserialize)]
struct TextSearchResponse {
    #[serde(default)]
    results: Vec<PlaceCandidate>,
}

#[derive(Debug, serde::Deserialize)]
struct PlaceCandidate {
    #[serde(default)]
    place_id: Option<String>,
    #[serde(default)]
    photos: Vec<PlacePhoto>,
}

#[derive(Debug, serde::Deserialize)]
struct PlacePhoto {
    photo_reference: String,
    #[serde(default)]
    html_attributions: Vec<String>,
}

#[derive(Debug, serde::Deserialize)]
struct DetailsResponse {
    #[serde(default)]
    result: Option<PlaceDetails>,
}

#[derive(Debug, serde::Deserialize)]
struct PlaceDetails {
    #[serde(default)]
    website: Option<String>,
    #[serde(default)]
    url: Option<String>,
}

pub async fn lookup_place_photo(
    client: &Client,
    api_key: &str,
    name: &str,
    bounds: Option<Bounds>,
) -> Result<PhotoInfo, TripError> {
    let mut params = vec![
        ("query".to_string(), name.to_string()),
        ("key".to_string(), api_key.to_string()),
    ];
    if let Some(b) = bounds {
        params.push((
            "locationbias".to_string(),
            format!("rectangle:{},{}|{},{}", b.south, b.west, b.north, b.east),
        ));
    }

    let search: TextSearchResponse = client
        .get(TEXT_SEARCH_URL)
        .query(&params)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    let Some(candidate) = search.results.into_iter().next() else {
        return Ok(PhotoInfo::default());
    };

    let website = match candidate.place_id.as_deref() {
        Some(place_id) => fetch_website(client, api_key, place_id).await,
        None => None,
    };

    let Some(photo) = candidate.photos.into_iter().next() else {
        return Ok(PhotoInfo {
            photo_url: None,
            attribution: None,
            website,
        });
    };

    let attribution = if photo.html_attributions.is_empty() {
        None
    } else {
        Some(photo.html_attributions.join(" "))
    };

    Ok(PhotoInfo {
        photo_url: Some(photo_url(&photo.photo_reference, api_key)),
        attribution,
        website,
    })
}

/// Details errors are swallowed; a missing website link never blocks a
/// photo result.
async fn fetch_website(client: &Client, api_key: &str, place_id: &str) -> Option<String> {
    let result = client
        .get(DETAILS_URL)
        .query(&[
            ("place_id", place_id),
            ("fields", "website,url"),
            ("key", api_key),
        ])
        .send()
        .await
        .ok()?
        .json::<DetailsResponse>()
        .await;

    match result {
        Ok(details) => details.result.and_then(|d| d.website.or(d.url)),
        Err(err) => {
            tracing::debug!("place details lookup failed for {place_id}: {err}");
            None
        }
    }
}

fn photo_url(photo_reference: &str, api_key: &str) -> String {
    // the base is a constant, so parse can only fail on the params side
    reqwest::Url::parse_with_params(
        PHOTO_URL,
        &[
            ("maxwidth", PHOTO_MAX_WIDTH),
            ("photo_reference", photo_reference),
            ("key", api_key),
        ],
    )
    .map(String::from)
    .unwrap_or_else(|_| PHOTO_URL.to_string())
}
