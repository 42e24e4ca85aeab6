//! Benchmarks for the faceclear analysis pipeline.
//!
//! Run with: cargo bench -p faceclear-core

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use faceclear_core::config::RestoreConfig;
use faceclear_core::{RasterImage, RegionRestorer, SharpnessScorer};

fn face_sized_region() -> RasterImage {
    RasterImage::from_fn(96, 96, |x, y| {
        let v = ((x * 7 + y * 13) % 256) as u8;
        [v, v.wrapping_add(40), v.wrapping_add(80)]
    })
}

fn benchmark_sharpness_score(c: &mut Criterion) {
    let region = face_sized_region();

    c.bench_function("sharpness_score_96px", |b| {
        b.iter(|| SharpnessScorer::score(black_box(&region)))
    });
}

fn benchmark_restore(c: &mut Criterion) {
    let restorer = RegionRestorer::new(RestoreConfig::default());
    let region = face_sized_region();

    c.bench_function("restore_region_96px", |b| {
        b.iter(|| restorer.restore(black_box(&region)).unwrap())
    });
}

fn benchmark_png_encode(c: &mut Criterion) {
    let image = face_sized_region();

    c.bench_function("encode_png_96px", |b| {
        b.iter(|| black_box(&image).encode_png().unwrap())
    });
}

criterion_group!(
    benches,
    benchmark_sharpness_score,
    benchmark_restore,
    benchmark_png_encode
);
criterion_main!(benches);
