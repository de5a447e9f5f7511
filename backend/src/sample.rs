use shared::Coordinate;

use crate::geo::distance_meters;

/// Roughly every 25 miles; keeps the sample list prompt-friendly even
/// for day-long routes.
pub const DEFAULT_SAMPLE_STEP_KM: f64 = 40.0;

/// Thin a dense path down to points spaced at least `step_km` apart
/// along the path. The final point is always appended so the
/// destination is represented regardless of spacing.
pub fn sample_route(path: &[Coordinate], step_km: f64) -> Vec<Coordinate> {
    if path.is_empty() {
        return Vec::new();
    }

    let step_m = step_km * 1000.0;
    let mut samples = Vec::new();
    let mut accumulated = 0.0;

    for pair in path.windows(2) {
        accumulated += distance_meters(pair[0], pair[1]);
        if accumulated >= step_m {
            samples.push(pair[1]);
            accumulated = 0.0;
        }
    }

    samples.push(path[path.len() - 1]);
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }

    // Points ~11.1 km apart going north
    fn northbound(n: usize) -> Vec<Coordinate> {
        (0..n).map(|i| coord(40.0 + 0.1 * i as f64, -75.0)).collect()
    }

    #[test]
    fn test_empty_path() {
        assert!(sample_route(&[], DEFAULT_SAMPLE_STEP_KM).is_empty());
    }

    #[test]
    fn test_single_point_path() {
        let path = vec![coord(40.0, -75.0)];
        assert_eq!(sample_route(&path, DEFAULT_SAMPLE_STEP_KM), path);
    }

    #[test]
    fn test_last_point_always_included() {
        let path = northbound(10);
        let samples = sample_route(&path, DEFAULT_SAMPLE_STEP_KM);
        assert!(!samples.is_empty());
        assert_eq!(samples.last(), path.last());
    }

    #[test]
    fn test_step_spacing() {
        // ~100 km of path, 40 km step: samples at ~44 km and ~89 km,
        // plus the unconditional final point
        let path = northbound(10);
        let samples = sample_route(&path, 40.0);
        assert_eq!(samples.len(), 3);
        assert_eq!(samples[0], coord(40.4, -75.0));
        assert_eq!(samples[1], coord(40.8, -75.0));
        assert_eq!(samples[2], coord(40.9, -75.0));
    }

    #[test]
    fn test_final_point_duplicated_when_it_lands_on_step() {
        // Two points ~55 km apart with a 40 km step: the second point is
        // emitted by the threshold and then appended again as the tail
        let path = vec![coord(40.0, -75.0), coord(40.5, -75.0)];
        let samples = sample_route(&path, 40.0);
        assert_eq!(samples.len(), 2);
        assert_eq!(samples[0], samples[1]);
    }

    #[test]
    fn test_short_route_yields_only_destination() {
        let path = vec![coord(40.0, -75.0), coord(40.05, -75.0), coord(40.1, -75.0)];
        let samples = sample_route(&path, 40.0);
        assert_eq!(samples, vec![coord(40.1, -75.0)]);
    }
}
