//! You.com agent clients for the two recommendation flows: alternative
//! routes (markdown reply) and roadside stops (strict JSON reply).

use std::time::Duration;

use chrono::{NaiveDate, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::Poi;

use crate::config::Config;
use crate::error::TripError;
use crate::models::{PoiRequest, RouteAltRequest};
use crate::retry::with_retry;
use crate::route_alt::{parse_route_alt_markdown, ParsedRouteAltResponse};

const AGENT_RUNS_URL: &str = "https://api.you.com/v1/agents/runs";
const AGENT_MAX_RETRIES: u32 = 3;
const AGENT_BASE_DELAY: Duration = Duration::from_millis(400);

/// The POI agent is asked for at most this many stops; extra entries in
/// the reply are dropped.
pub const MAX_POIS: usize = 10;

static JSON_ARRAY: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)\[.*?\]").unwrap());

#[derive(Debug, Serialize)]
struct AgentRunRequest<'a> {
    agent: &'a str,
    input: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct AgentRunResponse {
    #[serde(default)]
    output: Vec<AgentOutput>,
}

#[derive(Debug, Deserialize)]
struct AgentOutput {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    content: Option<String>,
}

/// Reply of a single agent run. Only transient upstream statuses (502,
/// 503) surface as `Err` so that `with_retry` retries them; every other
/// failure is an already-formed `Refused` value that bypasses the loop.
#[derive(Debug)]
enum AgentReply {
    Text(String),
    Refused { status: u16, message: String },
}

#[derive(Debug)]
pub enum RouteAltOutcome {
    Parsed(ParsedRouteAltResponse),
    Refused { status: u16, message: String },
}

#[derive(Debug)]
pub enum PoiOutcome {
    Pois(Vec<Poi>),
    Refused { status: u16, message: String },
}

pub async fn fetch_route_alternatives(
    client: &Client,
    config: &Config,
    req: &RouteAltRequest,
) -> Result<RouteAltOutcome, TripError> {
    let prompt = build_route_alt_prompt(req);
    let reply = with_retry(
        || run_agent(client, &config.you_api_key, &config.route_alt_agent_id, &prompt),
        AGENT_MAX_RETRIES,
        AGENT_BASE_DELAY,
    )
    .await?;

    Ok(match reply {
        AgentReply::Text(text) => RouteAltOutcome::Parsed(parse_route_alt_markdown(
            &text,
            &req.origin,
            &req.destination,
        )),
        AgentReply::Refused { status, message } => RouteAltOutcome::Refused { status, message },
    })
}

pub async fn fetch_pois(
    client: &Client,
    config: &Config,
    req: &PoiRequest,
) -> Result<PoiOutcome, TripError> {
    let prompt = build_poi_prompt(req);
    let reply = with_retry(
        || run_agent(client, &config.you_api_key, &config.poi_agent_id, &prompt),
        AGENT_MAX_RETRIES,
        AGENT_BASE_DELAY,
    )
    .await?;

    Ok(match reply {
        AgentReply::Text(text) => match extract_poi_array(&text) {
            Some(pois) => PoiOutcome::Pois(pois),
            None => {
                tracing::warn!("POI agent reply did not contain a valid JSON array");
                PoiOutcome::Refused {
                    status: 502,
                    message: "Invalid agent response".to_string(),
                }
            }
        },
        AgentReply::Refused { status, message } => PoiOutcome::Refused { status, message },
    })
}

async fn run_agent(
    client: &Client,
    api_key: &str,
    agent_id: &str,
    prompt: &str,
) -> Result<AgentReply, TripError> {
    let resp = client
        .post(AGENT_RUNS_URL)
        .bearer_auth(api_key)
        .json(&AgentRunRequest {
            agent: agent_id,
            input: prompt,
            stream: false,
        })
        .send()
        .await?;

    let status = resp.status().as_u16();
    if status == 502 || status == 503 {
        return Err(TripError::AgentTransient(status));
    }
    if !resp.status().is_success() {
        let message = resp.text().await.unwrap_or_default();
        return Ok(AgentReply::Refused { status, message });
    }

    let data: AgentRunResponse = resp.json().await?;
    let text = data
        .output
        .into_iter()
        .find_map(|o| o.text.or(o.content))
        .unwrap_or_default();
    if text.trim().is_empty() {
        return Ok(AgentReply::Refused {
            status: 502,
            message: "Empty or invalid agent response".to_string(),
        });
    }
    Ok(AgentReply::Text(text))
}

fn build_route_alt_prompt(req: &RouteAltRequest) -> String {
    let input = serde_json::json!({
        "origin": req.origin,
        "destination": req.destination,
        "waypoints": req.waypoints,
        "prefs": {
            "avoid_highways": req.prefs.avoid_highways,
            "avoid_tolls": req.prefs.avoid_tolls,
            "prefer_curvy": req.prefs.prefer_curvy,
            "max_extra_time_min": req.prefs.max_extra_time_min,
            "region_hint": req.prefs.region_hint,
            // export links are generated client side
            "need_export_url": false,
        },
    });
    let input = serde_json::to_string_pretty(&input).unwrap_or_default();

    format!(
        "You are RouteAlt Pro. Analyze the following route request and provide 2-3 \
         high-quality alternative routes.\n\n{input}\n\nReturn your response in the exact \
         Markdown format specified in your instructions, with Summary and Alternatives sections."
    )
}

fn build_poi_prompt(req: &PoiRequest) -> String {
    let date = req
        .date_iso
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
        .unwrap_or_else(|| Utc::now().date_naive());
    let weekday = date.format("%A").to_string().to_uppercase();
    let date_text = req
        .date_iso
        .clone()
        .unwrap_or_else(|| "today".to_string());

    let samples_text = req
        .samples
        .iter()
        .map(|p| format!("{:.4},{:.4}", p.lat, p.lon))
        .collect::<Vec<_>>()
        .join(" | ");

    let mut lines = vec![
        "You are an expert travel and route assistant helping users create scenic, \
         activity-filled journeys in Pennsylvania or New Jersey."
            .to_string(),
        format!(
            "The user is traveling from {} to {} on {weekday} ({date_text}).",
            req.origin, req.destination
        ),
    ];
    if !samples_text.is_empty() {
        lines.push(format!(
            "Approximate route sample points (lat,lon): {samples_text}"
        ));
    }
    lines.push(
        "Recommend up to 10 roadside stops along the route: scenic roads, state parks, \
         hiking trails, local breweries, restaurants, museums, historical sites, and \
         active events."
            .to_string(),
    );
    if let Some(preference) = req.preference.as_deref().filter(|p| !p.is_empty()) {
        lines.push(format!(
            "User preference: {preference}. Prioritize results that best match this request."
        ));
    }
    lines.push(
        "Focus on actionable travel recommendations near the route. For each stop include: \
         name, lat, lng, type, emoji, short description, and tips if helpful."
            .to_string(),
    );
    lines.push(
        "Return a strict JSON array only of objects: [{ name: string; lat: number; \
         lng: number; description?: string; emoji?: string; type?: string; tips?: string }]. \
         No markdown or extra keys."
            .to_string(),
    );
    lines.join("\n")
}

/// The agent reply as deserialized; `lng`/`type` follow the prompt's
/// JSON contract.
#[derive(Debug, Deserialize)]
struct AgentPoi {
    name: String,
    lat: f64,
    lng: f64,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    emoji: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    tips: Option<String>,
}

/// Pull a POI array out of the agent's reply. The prompt demands a
/// strict JSON array but replies sometimes arrive wrapped in prose or a
/// code fence, so a bracketed array is salvaged from mixed content
/// before giving up. Entries with non-finite coordinates are dropped
/// and anything past `MAX_POIS` is truncated.
fn extract_poi_array(text: &str) -> Option<Vec<Poi>> {
    let parsed: Vec<AgentPoi> = serde_json::from_str(text.trim()).ok().or_else(|| {
        let candidate = JSON_ARRAY.find(text)?;
        serde_json::from_str(candidate.as_str()).ok()
    })?;

    let pois = parsed
        .into_iter()
        .filter(|p| p.lat.is_finite() && p.lng.is_finite())
        .take(MAX_POIS)
        .enumerate()
        .map(|(i, p)| Poi {
            id: format!("{i}-{}", p.name),
            name: p.name,
            lat: p.lat,
            lon: p.lng,
            emoji: p.emoji,
            kind: p.kind,
            description: p.description,
            tips: p.tips,
            photo_url: None,
            attribution: None,
            website: None,
        })
        .collect();
    Some(pois)
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::Coordinate;

    #[test]
    fn test_extract_strict_array() {
        let text = r#"[{"name":"Bushkill Falls","lat":41.1139,"lng":-75.0057,"type":"waterfall"}]"#;
        let pois = extract_poi_array(text).expect("pois");
        assert_eq!(pois.len(), 1);
        assert_eq!(pois[0].id, "0-Bushkill Falls");
        assert_eq!(pois[0].lon, -75.0057);
        assert_eq!(pois[0].kind.as_deref(), Some("waterfall"));
    }

    #[test]
    fn test_extract_array_from_prose() {
        let text = "Here are my picks:\n```json\n[{\"name\":\"Pine Creek Gorge\",\"lat\":41.7,\"lng\":-77.4}]\n```\nEnjoy!";
        let pois = extract_poi_array(text).expect("pois");
        assert_eq!(pois.len(), 1);
        assert_eq!(pois[0].name, "Pine Creek Gorge");
    }

    #[test]
    fn test_extract_rejects_non_json() {
        assert!(extract_poi_array("no stops today, sorry").is_none());
    }

    #[test]
    fn test_extract_truncates_to_max() {
        let entries: Vec<String> = (0..15)
            .map(|i| format!(r#"{{"name":"Stop {i}","lat":40.0,"lng":-75.0}}"#))
            .collect();
        let text = format!("[{}]", entries.join(","));
        let pois = extract_poi_array(&text).expect("pois");
        assert_eq!(pois.len(), MAX_POIS);
    }

    #[test]
    fn test_extract_drops_non_finite_coordinates() {
        let text = r#"[{"name":"A","lat":40.0,"lng":-75.0},{"name":"B","lat":1e999,"lng":-75.0}]"#;
        let pois = extract_poi_array(text).expect("pois");
        assert_eq!(pois.len(), 1);
        assert_eq!(pois[0].name, "A");
    }

    #[test]
    fn test_poi_prompt_mentions_weekday_and_samples() {
        let req = PoiRequest {
            origin: "Philadelphia, PA".to_string(),
            destination: "Jim Thorpe, PA".to_string(),
            date_iso: Some("2025-07-04".to_string()),
            samples: vec![Coordinate {
                lat: 40.1234,
                lon: -75.5432,
            }],
            preference: Some("waterfalls".to_string()),
        };
        let prompt = build_poi_prompt(&req);
        assert!(prompt.contains("FRIDAY"));
        assert!(prompt.contains("40.1234,-75.5432"));
        assert!(prompt.contains("waterfalls"));
    }

    #[test]
    fn test_route_alt_prompt_embeds_preferences() {
        let req = RouteAltRequest {
            origin: "Easton, PA".to_string(),
            destination: "Cape May, NJ".to_string(),
            waypoints: vec!["Lambertville, NJ".to_string()],
            prefs: Default::default(),
        };
        let prompt = build_route_alt_prompt(&req);
        assert!(prompt.contains("RouteAlt Pro"));
        assert!(prompt.contains("Cape May, NJ"));
        assert!(prompt.contains("\"max_extra_time_min\": 40"));
        assert!(prompt.contains("need_export_url"));
    }
}
