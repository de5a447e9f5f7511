use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use geo_types::Point;
use gpx::{Gpx, GpxVersion, Track, TrackSegment, Waypoint};
use shared::Coordinate;

use crate::error::TripError;

/// Re-encode a processed path as a downloadable GPX document,
/// base64-wrapped for JSON transport.
pub fn encode_track_as_gpx(path: &[Coordinate], name: &str) -> Result<String, TripError> {
    let mut gpx = Gpx {
        version: GpxVersion::Gpx11,
        creator: Some("roadtripper".into()),
        ..Default::default()
    };
    let mut track = Track {
        name: Some(name.into()),
        ..Default::default()
    };

    let mut segment = TrackSegment::new();
    for waypoint in path.iter().map(to_waypoint) {
        segment.points.push(waypoint);
    }
    track.segments.push(segment);
    gpx.tracks.push(track);

    let mut buffer = Vec::new();
    gpx::write(&gpx, &mut buffer)?;
    Ok(BASE64.encode(buffer))
}

fn to_waypoint(coord: &Coordinate) -> Waypoint {
    Waypoint::new(Point::new(coord.lon, coord.lat))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encodes_non_empty_document() {
        let path = vec![
            Coordinate {
                lat: 40.1,
                lon: -75.1,
            },
            Coordinate {
                lat: 40.2,
                lon: -75.2,
            },
        ];
        let encoded = encode_track_as_gpx(&path, "preview").expect("gpx");
        let decoded = BASE64.decode(encoded).expect("base64");
        let xml = String::from_utf8(decoded).expect("utf8");
        assert!(xml.contains("roadtripper"));
        assert!(xml.contains("preview"));
        assert!(xml.contains("40.1"));
    }
}
