use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use shared::Coordinate;

/// Tolerance for on-screen track previews.
pub const PREVIEW_TOLERANCE_M: f64 = 20.0;
/// Coarser tolerance used when deriving waypoints from an uploaded track.
pub const WAYPOINT_TOLERANCE_M: f64 = 100.0;

/// Extract every trackpoint from a GPX document, in document order.
///
/// This is a lenient scan, not a schema-validating parse: a trackpoint
/// with an unparseable lat or lon is dropped, a missing attribute
/// defaults to 0, and a malformed document yields whatever points were
/// read before the error. Partial geometry beats total failure here.
/// Callers apply `simplify` themselves with a use-appropriate tolerance.
pub fn parse_gpx_trackpoints(xml: &str) -> Vec<Coordinate> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut points = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e) | Event::Empty(e)) => {
                if e.name().as_ref() == b"trkpt" {
                    if let Some(point) = trackpoint_from_attributes(&e) {
                        points.push(point);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(err) => {
                tracing::warn!("stopping GPX scan on malformed XML: {err}");
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    points
}

fn trackpoint_from_attributes(e: &BytesStart<'_>) -> Option<Coordinate> {
    let mut lat = 0.0_f64;
    let mut lon = 0.0_f64;

    for attr in e.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.as_ref() {
            b"lat" => lat = value.trim().parse().unwrap_or(f64::NAN),
            b"lon" => lon = value.trim().parse().unwrap_or(f64::NAN),
            _ => {}
        }
    }

    let point = Coordinate { lat, lon };
    point.is_finite().then_some(point)
}
