//! Parser for the RouteAlt agent's markdown replies.
//!
//! The agent is asked for a `## Summary` section followed by
//! `## Alternatives` with one `**Alt X — Name**` block per candidate,
//! but the reply is LLM-generated and not contractually structured.
//! The parser therefore degrades per field instead of rejecting the
//! whole reply: every detected header yields exactly one record, with
//! defaults filled in for anything that failed to parse.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use shared::RouteAlternative;

static ALT_HEADER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\*\*Alt\s+([ABC])\s*—\s*(.+?)\*\*").unwrap());
static BASELINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)Baseline distance/time:\s*([\d.]+)\s*mi,?\s*([\d.]+)\s*(?:min|h|m)").unwrap()
});
static DISTANCE_TIME_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Distance/Time:").unwrap());
static DISTANCE_TIME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)([\d.]+)\s*mi[,\s]+([\d.]+)\s*(?:h|m)").unwrap());
static DELTA: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Δ\s*vs\s*baseline:\s*([+-]?\d+)\s*min").unwrap());
static CURVY_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Curvy\s*%").unwrap());
static CURVY_VALUE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\d+)%").unwrap());
static WHY_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)Why\s+this\s+route:").unwrap());
static KEY_ROADS_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)Key\s+roads/segments:").unwrap());

#[derive(Debug, Default, Serialize)]
pub struct ParsedRouteAltResponse {
    pub baseline_distance: String,
    pub baseline_time: String,
    pub alternatives: Vec<RouteAlternative>,
}

/// Parse the agent's markdown into typed route alternatives.
///
/// `fallback_origin` and `fallback_destination` fill those fields on
/// every record, since the agent is never asked to repeat them. A reply
/// with no recognizable `Alt` headers yields an empty vec, not an
/// error.
pub fn parse_route_alt_markdown(
    markdown: &str,
    fallback_origin: &str,
    fallback_destination: &str,
) -> ParsedRouteAltResponse {
    let mut parser = AltParser::new(fallback_origin, fallback_destination);
    for line in markdown.lines().map(str::trim).filter(|l| !l.is_empty()) {
        parser.feed(line);
    }
    parser.finish()
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    None,
    Summary,
    Alternatives,
}

#[derive(Debug, Default)]
struct PartialAlternative {
    id: Option<String>,
    name: Option<String>,
    distance_text: Option<String>,
    duration_text: Option<String>,
    delta_minutes: Option<i32>,
    curvy_percent: Option<u32>,
    key_roads: Vec<String>,
    is_recommended: bool,
}

struct AltParser<'a> {
    fallback_origin: &'a str,
    fallback_destination: &'a str,
    section: Section,
    current: Option<PartialAlternative>,
    in_why_block: bool,
    in_key_roads_block: bool,
    why_bullets: Vec<String>,
    baseline_distance: String,
    baseline_time: String,
    alternatives: Vec<RouteAlternative>,
}

impl<'a> AltParser<'a> {
    fn new(fallback_origin: &'a str, fallback_destination: &'a str) -> Self {
        Self {
            fallback_origin,
            fallback_destination,
            section: Section::None,
            current: None,
            in_why_block: false,
            in_key_roads_block: false,
            why_bullets: Vec::new(),
            baseline_distance: String::new(),
            baseline_time: String::new(),
            alternatives: Vec::new(),
        }
    }

    fn feed(&mut self, line: &str) {
        if line.starts_with("## Summary") {
            self.section = Section::Summary;
            return;
        }
        if line.starts_with("## Alternatives") {
            self.section = Section::Alternatives;
            return;
        }

        match self.section {
            Section::Summary => self.feed_summary(line),
            Section::Alternatives => self.feed_alternative(line),
            Section::None => {}
        }
    }

    fn feed_summary(&mut self, line: &str) {
        if let Some(caps) = BASELINE.captures(line) {
            self.baseline_distance = format!("{} mi", &caps[1]);
            self.baseline_time = format!("{} min", &caps[2]);
        }
    }

    fn feed_alternative(&mut self, line: &str) {
        if let Some(caps) = ALT_HEADER.captures(line) {
            self.finalize_current();
            let letter = caps[1].to_lowercase();
            let id = format!("alt-{letter}");
            let name = caps[2].trim();
            self.current = Some(PartialAlternative {
                // Alt A is the recommended pick by convention; the text
                // itself never says so
                is_recommended: id == "alt-a",
                id: Some(id),
                name: (!name.is_empty()).then(|| name.to_string()),
                ..Default::default()
            });
            self.in_why_block = false;
            self.in_key_roads_block = false;
            return;
        }

        let Some(current) = self.current.as_mut() else {
            return;
        };

        if DISTANCE_TIME_LABEL.is_match(line) {
            if let Some(caps) = DISTANCE_TIME.captures(line) {
                current.distance_text = Some(format!("{} mi", &caps[1]));
                current.duration_text = Some(format!("{} min", &caps[2]));
            }
            if let Some(caps) = DELTA.captures(line) {
                current.delta_minutes = caps[1].parse().ok();
            }
            return;
        }

        if CURVY_LABEL.is_match(line) {
            if let Some(caps) = CURVY_VALUE.captures(line) {
                current.curvy_percent = caps[1].parse().ok();
            }
            return;
        }

        if WHY_LABEL.is_match(line) {
            self.in_why_block = true;
            self.in_key_roads_block = false;
            return;
        }

        if KEY_ROADS_LABEL.is_match(line) {
            self.in_why_block = false;
            self.in_key_roads_block = true;
            // Same-line content after the label is an initial road list
            if let Some((_, rest)) = line.split_once(':') {
                current.key_roads.extend(split_roads(rest));
            }
            return;
        }

        if self.in_why_block {
            if let Some(bullet) = line.strip_prefix('-').or_else(|| line.strip_prefix('•')) {
                self.why_bullets.push(bullet.trim().to_string());
            }
            return;
        }

        if self.in_key_roads_block {
            current.key_roads.extend(split_roads(line));
        }
    }

    fn finalize_current(&mut self) {
        let Some(partial) = self.current.take() else {
            return;
        };
        let bullets = std::mem::take(&mut self.why_bullets);
        let alt = complete_alternative(
            partial,
            self.fallback_origin,
            self.fallback_destination,
            bullets,
        );
        let alt = match validate_alternative(&alt) {
            Ok(()) => alt,
            Err(reason) => {
                tracing::warn!(
                    "route alternative '{}' failed validation ({reason}); substituting minimal record",
                    alt.id
                );
                minimal_valid_alternative(alt, self.fallback_origin, self.fallback_destination)
            }
        };
        self.alternatives.push(alt);
    }

    fn finish(mut self) -> ParsedRouteAltResponse {
        self.finalize_current();
        ParsedRouteAltResponse {
            baseline_distance: self.baseline_distance,
            baseline_time: self.baseline_time,
            alternatives: self.alternatives,
        }
    }
}

fn split_roads(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(str::to_string)
        .collect()
}

fn complete_alternative(
    partial: PartialAlternative,
    fallback_origin: &str,
    fallback_destination: &str,
    why_bullets: Vec<String>,
) -> RouteAlternative {
    RouteAlternative {
        id: partial.id.unwrap_or_else(|| "alt-unknown".to_string()),
        name: partial.name.unwrap_or_else(|| "Unknown Route".to_string()),
        origin: fallback_origin.to_string(),
        destination: fallback_destination.to_string(),
        waypoints: None,
        distance_text: partial.distance_text.unwrap_or_else(placeholder),
        duration_text: partial.duration_text.unwrap_or_else(placeholder),
        delta_minutes: partial.delta_minutes.unwrap_or(0),
        // values past 100 are agent nonsense; clamp into the schema range
        curvy_percent: partial.curvy_percent.map(|v| v.min(100) as u8).unwrap_or(0),
        why_text: if why_bullets.is_empty() {
            vec!["No description provided".to_string()]
        } else {
            why_bullets
        },
        key_roads: partial.key_roads,
        is_recommended: partial.is_recommended,
    }
}

fn placeholder() -> String {
    "—".to_string()
}

fn validate_alternative(alt: &RouteAlternative) -> Result<(), String> {
    if alt.id.trim().is_empty() {
        return Err("empty id".to_string());
    }
    if alt.name.trim().is_empty() {
        return Err("empty name".to_string());
    }
    if alt.origin.trim().is_empty() || alt.destination.trim().is_empty() {
        return Err("empty origin or destination".to_string());
    }
    if alt.why_text.is_empty() {
        return Err("empty why_text".to_string());
    }
    Ok(())
}

/// Rebuild a failed record from whatever fields did validate, so the
/// output count always matches the number of detected headers.
fn minimal_valid_alternative(
    alt: RouteAlternative,
    fallback_origin: &str,
    fallback_destination: &str,
) -> RouteAlternative {
    RouteAlternative {
        id: non_empty_or(alt.id, "alt-unknown"),
        name: non_empty_or(alt.name, "Unknown Route"),
        origin: non_empty_or(alt.origin, fallback_origin),
        destination: non_empty_or(alt.destination, fallback_destination),
        waypoints: alt.waypoints,
        distance_text: non_empty_or(alt.distance_text, "—"),
        duration_text: non_empty_or(alt.duration_text, "—"),
        delta_minutes: alt.delta_minutes,
        curvy_percent: alt.curvy_percent,
        why_text: if alt.why_text.is_empty() {
            vec!["No description provided".to_string()]
        } else {
            alt.why_text
        },
        key_roads: alt.key_roads,
        is_recommended: alt.is_recommended,
    }
}

fn non_empty_or(value: String, default: &str) -> String {
    if value.trim().is_empty() {
        default.to_string()
    } else {
        value
    }
}
