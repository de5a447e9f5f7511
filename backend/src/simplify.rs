use shared::Coordinate;

/// Flat-earth conversion between meters and degrees. This is deliberately
/// not latitude-aware: the overlay and track tolerances used across the
/// app were tuned against this constant for the PA/NJ region, where the
/// distortion stays small. Known limitation, do not correct.
const METERS_PER_DEGREE: f64 = 111_320.0;

/// Douglas-Peucker polyline reduction with a real-world tolerance in
/// meters. The first and last points are always retained and paths of
/// two or fewer points come back unchanged.
///
/// Worst case O(n^2); fine for tracks of a few thousand points, but
/// multi-linestring overlay documents should be simplified per
/// linestring (see `kml`), never as one concatenated path.
pub fn simplify(path: &[Coordinate], tolerance_meters: f64) -> Vec<Coordinate> {
    assert!(
        tolerance_meters >= 0.0,
        "simplification tolerance must be non-negative"
    );
    if path.len() <= 2 {
        return path.to_vec();
    }

    let epsilon = tolerance_meters / METERS_PER_DEGREE;
    let mut keep = Vec::new();
    douglas_peucker(path, 0, path.len() - 1, epsilon, &mut keep);
    keep.sort_unstable();
    keep.dedup();
    keep.into_iter().map(|i| path[i]).collect()
}

fn douglas_peucker(
    points: &[Coordinate],
    start: usize,
    end: usize,
    epsilon: f64,
    keep: &mut Vec<usize>,
) {
    let mut max_dist = 0.0;
    let mut index = start + 1;
    for i in start + 1..end {
        let dist = segment_distance(points[start], points[end], points[i]);
        if dist > max_dist {
            max_dist = dist;
            index = i;
        }
    }

    if max_dist > epsilon {
        douglas_peucker(points, start, index, epsilon, keep);
        douglas_peucker(points, index, end, epsilon, keep);
    } else {
        keep.push(start);
        keep.push(end);
    }
}

/// Perpendicular distance from `p` to the segment `a`-`b`, computed in
/// planar (lon, lat) degree space with the projection clamped onto the
/// segment.
fn segment_distance(a: Coordinate, b: Coordinate, p: Coordinate) -> f64 {
    let abx = b.lon - a.lon;
    let aby = b.lat - a.lat;
    let apx = p.lon - a.lon;
    let apy = p.lat - a.lat;

    let len_sq = abx * abx + aby * aby;
    let t = if len_sq == 0.0 {
        0.0
    } else {
        ((apx * abx + apy * aby) / len_sq).clamp(0.0, 1.0)
    };

    let dx = apx - t * abx;
    let dy = apy - t * aby;
    (dx * dx + dy * dy).sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coord(lat: f64, lon: f64) -> Coordinate {
        Coordinate { lat, lon }
    }

    #[test]
    fn test_short_paths_unchanged() {
        let empty: Vec<Coordinate> = Vec::new();
        assert_eq!(simplify(&empty, 50.0), empty);

        let single = vec![coord(40.0, -75.0)];
        assert_eq!(simplify(&single, 50.0), single);

        let pair = vec![coord(40.0, -75.0), coord(40.1, -75.1)];
        assert_eq!(simplify(&pair, 50.0), pair);
    }

    #[test]
    fn test_collinear_points_collapse() {
        let path = vec![
            coord(40.0, -75.0),
            coord(40.1, -75.0),
            coord(40.2, -75.0),
            coord(40.3, -75.0),
        ];
        let simplified = simplify(&path, 20.0);
        assert_eq!(simplified, vec![coord(40.0, -75.0), coord(40.3, -75.0)]);
    }

    #[test]
    fn test_spike_is_retained() {
        // Middle point sits ~1.1 km off the chord, well past a 50 m tolerance
        let path = vec![
            coord(40.0, -75.0),
            coord(40.1, -75.01),
            coord(40.2, -75.0),
        ];
        let simplified = simplify(&path, 50.0);
        assert_eq!(simplified, path);
    }

    #[test]
    fn test_endpoints_always_kept() {
        let path = vec![
            coord(40.0, -75.0),
            coord(40.0001, -75.0001),
            coord(40.0002, -75.0),
            coord(40.0003, -75.0002),
            coord(40.0004, -75.0),
        ];
        let simplified = simplify(&path, 500.0);
        assert_eq!(simplified.first(), path.first());
        assert_eq!(simplified.last(), path.last());
    }

    #[test]
    fn test_duplicate_points_do_not_break_projection() {
        let path = vec![
            coord(40.0, -75.0),
            coord(40.1, -75.05),
            coord(40.0, -75.0),
        ];
        let simplified = simplify(&path, 10.0);
        assert!(simplified.len() <= path.len());
        assert_eq!(simplified.first(), path.first());
        assert_eq!(simplified.last(), path.last());
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn test_negative_tolerance_panics() {
        let path = vec![coord(40.0, -75.0), coord(40.1, -75.0), coord(40.2, -75.0)];
        simplify(&path, -1.0);
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn track() -> impl Strategy<Value = Vec<Coordinate>> {
            prop::collection::vec(
                (39.0..42.0, -76.0..-74.0).prop_map(|(lat, lon)| Coordinate { lat, lon }),
                3..40,
            )
        }

        proptest! {
            #[test]
            fn prop_never_longer_than_input(path in track(), tol in 0.0..5_000.0f64) {
                let simplified = simplify(&path, tol);
                prop_assert!(simplified.len() <= path.len());
            }

            #[test]
            fn prop_endpoints_retained(path in track(), tol in 0.0..5_000.0f64) {
                let simplified = simplify(&path, tol);
                prop_assert_eq!(simplified.first(), path.first());
                prop_assert_eq!(simplified.last(), path.last());
            }

            #[test]
            fn prop_larger_tolerance_never_keeps_more(
                path in track(),
                tol in 0.0..2_000.0f64,
                extra in 0.0..2_000.0f64
            ) {
                let tight = simplify(&path, tol);
                let loose = simplify(&path, tol + extra);
                prop_assert!(loose.len() <= tight.len());
            }

            #[test]
            fn prop_output_is_subsequence(path in track(), tol in 0.0..5_000.0f64) {
                let simplified = simplify(&path, tol);
                let mut cursor = 0;
                for point in &simplified {
                    let found = path[cursor..].iter().position(|p| p == point);
                    prop_assert!(found.is_some());
                    cursor += found.unwrap() + 1;
                }
            }
        }
    }
}
