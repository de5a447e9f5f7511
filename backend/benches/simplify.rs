use backend::simplify::simplify;
use backend::track::parse_gpx_trackpoints;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use shared::Coordinate;

/// A wavy northbound path; the sine component keeps points off the
/// straight line so simplification has real work to do.
fn wavy_path(len: usize) -> Vec<Coordinate> {
    (0..len)
        .map(|i| {
            let t = i as f64;
            Coordinate {
                lat: 40.0 + t * 0.0005,
                lon: -75.0 + (t * 0.1).sin() * 0.002,
            }
        })
        .collect()
}

fn synthetic_gpx(len: usize) -> String {
    let mut xml = String::from("<gpx><trk><trkseg>");
    for p in wavy_path(len) {
        xml.push_str(&format!(r#"<trkpt lat="{}" lon="{}"/>"#, p.lat, p.lon));
    }
    xml.push_str("</trkseg></trk></gpx>");
    xml
}

fn benchmark_simplify(c: &mut Criterion) {
    let mut group = c.benchmark_group("simplify");

    for len in [500usize, 5_000, 50_000] {
        let path = wavy_path(len);
        group.bench_with_input(BenchmarkId::new("tolerance_20m", len), &path, |b, path| {
            b.iter(|| simplify(black_box(path), 20.0));
        });
    }

    group.finish();
}

fn benchmark_track_pipeline(c: &mut Criterion) {
    let xml = synthetic_gpx(10_000);

    c.bench_function("parse_and_simplify_10k", |b| {
        b.iter(|| {
            let points = parse_gpx_trackpoints(black_box(&xml));
            simplify(&points, 20.0)
        });
    });
}

criterion_group!(benches, benchmark_simplify, benchmark_track_pipeline);
criterion_main!(benches);
