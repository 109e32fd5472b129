use criterion::{black_box, criterion_group, criterion_main, Criterion};
use clusterroi::{overlapping_rois, AtlasDict};
use ndarray::{Array1, Array3};

const NUM_LABELS: i32 = 180;

fn dict() -> AtlasDict {
    (1..=NUM_LABELS).map(|l| (l, format!("ROI_{}", l))).collect()
}

fn surface_rois(clusters: &Array1<f32>, atlas: &Array1<i32>, dict: &AtlasDict) -> Vec<String> {
    overlapping_rois(clusters, atlas, dict).unwrap()
}

fn volume_rois(clusters: &Array3<f32>, atlas: &Array3<i32>, dict: &AtlasDict) -> Vec<String> {
    overlapping_rois(clusters, atlas, dict).unwrap()
}

fn bench_overlap(c: &mut Criterion) {
    let dict = dict();

    let surf_atlas = Array1::from_shape_fn(32492, |i| i as i32 % (NUM_LABELS + 1));
    let surf_clusters = Array1::from_shape_fn(32492, |i| if i % 7 == 0 { 1.0 } else { 0.0 });
    c.bench_function("surface_overlap", |b| {
        b.iter(|| surface_rois(black_box(&surf_clusters), black_box(&surf_atlas), &dict))
    });

    let vol_atlas = Array3::from_shape_fn((91, 109, 91), |(x, y, z)| (x + y + z) as i32 % (NUM_LABELS + 1));
    let vol_clusters = Array3::from_shape_fn((91, 109, 91), |(x, _, _)| if (30..40).contains(&x) { 2.0 } else { 0.0 });
    c.bench_function("volume_overlap", |b| {
        b.iter(|| volume_rois(black_box(&vol_clusters), black_box(&vol_atlas), &dict))
    });
}

criterion_group!(benches, bench_overlap);
criterion_main!(benches);
