use quick_xml::events::Event;
use quick_xml::Reader;
use shared::Coordinate;

use crate::simplify::simplify;

/// Overlay documents are render-only, so they get a more aggressive
/// default than uploaded tracks.
pub const DEFAULT_OVERLAY_TOLERANCE_M: f64 = 10.0;

/// Cap on how many linestrings the HTTP layer forwards for rendering.
/// The parser itself always returns the complete set it found; callers
/// that render decide whether to truncate.
pub const MAX_OVERLAY_PATHS: usize = 3000;

/// Extract every `<LineString>` from a KML document as an independent
/// path, each simplified with `tolerance_meters`.
///
/// Coordinate tuples are whitespace-separated `lon,lat[,alt]` triples;
/// altitude is ignored and malformed tuples are dropped. Simplified
/// linestrings with fewer than two points are discarded.
pub fn parse_kml_linestrings(xml: &str, tolerance_meters: f64) -> Vec<Vec<Coordinate>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut paths = Vec::new();
    let mut buf = Vec::new();
    let mut in_linestring = false;
    let mut in_coordinates = false;
    let mut coords_text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"LineString" => in_linestring = true,
                b"coordinates" if in_linestring => {
                    in_coordinates = true;
                    coords_text.clear();
                }
                _ => {}
            },
            Ok(Event::Text(e)) if in_coordinates => {
                if let Ok(text) = e.unescape() {
                    coords_text.push_str(&text);
                    coords_text.push(' ');
                }
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"coordinates" if in_coordinates => {
                    in_coordinates = false;
                    let points = parse_coordinate_tuples(&coords_text);
                    if !points.is_empty() {
                        let simplified = simplify(&points, tolerance_meters);
                        if simplified.len() > 1 {
                            paths.push(simplified);
                        }
                    }
                }
                b"LineString" => in_linestring = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(err) => {
                tracing::warn!("stopping KML scan on malformed XML: {err}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    paths
}

fn parse_coordinate_tuples(text: &str) -> Vec<Coordinate> {
    text.split_whitespace()
        .filter_map(|tuple| {
            let mut parts = tuple.split(',');
            let lon: f64 = parts.next()?.parse().ok()?;
            let lat: f64 = parts.next()?.parse().ok()?;
            let point = Coordinate { lat, lon };
            point.is_finite().then_some(point)
        })
        .collect()
}
