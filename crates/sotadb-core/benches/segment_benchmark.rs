//! Insert and search benchmarks for a single segment.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use sotadb_core::{DistanceMetric, Point, Segment, SegmentParams, VisitedPool};

#[allow(clippy::cast_precision_loss)]
fn generate_vector(dimension: usize, seed: u64) -> Vec<f32> {
    let mut v = Vec::with_capacity(dimension);
    let mut x = seed.wrapping_add(1);
    for _ in 0..dimension {
        x = x.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        v.push((x >> 33) as f32 / (1u64 << 31) as f32 - 0.5);
    }
    v
}

fn build_segment(n: u64, dimension: usize) -> Segment {
    let params = SegmentParams::new(16, 200, n as usize);
    let segment =
        Segment::new(params, DistanceMetric::Euclidean, Arc::new(VisitedPool::new())).unwrap();
    for i in 0..n {
        assert!(segment.add(Point::new(i, generate_vector(dimension, i))));
    }
    segment
}

fn bench_insert(c: &mut Criterion) {
    let dimension = 64;
    c.bench_function("segment_insert_1k", |b| {
        b.iter(|| {
            let segment = {
                let params = SegmentParams::new(16, 100, 1000);
                Segment::new(params, DistanceMetric::Euclidean, Arc::new(VisitedPool::new()))
                    .unwrap()
            };
            for i in 0..1000u64 {
                segment.add(black_box(Point::new(i, generate_vector(dimension, i))));
            }
            black_box(segment.len())
        });
    });
}

fn bench_search(c: &mut Criterion) {
    let dimension = 64;
    let segment = build_segment(10_000, dimension);

    c.bench_function("segment_knn_k10_ef100", |b| {
        let mut seed = 0u64;
        b.iter(|| {
            seed = seed.wrapping_add(1);
            let query = generate_vector(dimension, 1_000_000 + seed);
            black_box(segment.search(black_box(&query), 10, 100))
        });
    });
}

criterion_group!(benches, bench_insert, bench_search);
criterion_main!(benches);
