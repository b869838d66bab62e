//! Tests for `persistence` module

use std::sync::Arc;

use super::core::Segment;
use super::params::SegmentParams;
use super::pool::VisitedPool;
use crate::distance::DistanceMetric;
use crate::error::Error;
use crate::point::Point;

fn segment_with(params: SegmentParams) -> Segment {
    Segment::new(params, DistanceMetric::Euclidean, Arc::new(VisitedPool::new())).unwrap()
}

#[allow(clippy::cast_precision_loss)]
fn vec_for(seed: u64, dimension: usize) -> Vec<f32> {
    let mut v = Vec::with_capacity(dimension);
    let mut x = seed.wrapping_add(1);
    for _ in 0..dimension {
        x = x.wrapping_mul(6_364_136_223_846_793_005).wrapping_add(1);
        v.push((x >> 33) as f32 / (1u64 << 31) as f32 - 0.5);
    }
    v
}

/// Asserts that two segments hold identical vectors, lookups and adjacency.
fn assert_same_graph(a: &Segment, b: &Segment) {
    assert_eq!(a.len(), b.len());
    assert_eq!(a.stats().high_water, b.stats().high_water);

    #[allow(clippy::cast_possible_truncation)]
    for internal in 0..a.stats().high_water as u32 {
        match (a.node(internal), b.node(internal)) {
            (None, None) => {}
            (Some(left), Some(right)) => {
                assert_eq!(left.external_id(), right.external_id());
                assert_eq!(left.vector(), right.vector());
                assert_eq!(left.max_level(), right.max_level());
                for level in 0..=left.max_level() {
                    assert_eq!(
                        left.out_neighbors(level),
                        right.out_neighbors(level),
                        "out-lists differ at node {internal} layer {level}"
                    );
                    assert_eq!(
                        left.in_neighbors(level),
                        right.in_neighbors(level),
                        "in-lists differ at node {internal} layer {level}"
                    );
                }
            }
            (left, right) => panic!(
                "slot {internal} liveness differs: {} vs {}",
                left.is_some(),
                right.is_some()
            ),
        }
    }
}

#[test]
fn test_round_trip_with_holes() {
    let dir = tempfile::tempdir().unwrap();
    let params = SegmentParams::new(4, 64, 64).with_remove_enabled(true);
    let segment = segment_with(params);

    for i in 0..40u64 {
        assert!(segment.add(Point::new(i, vec_for(i, 8))));
    }
    assert!(segment.remove(5));
    assert!(segment.remove(17));

    segment.snapshot(dir.path()).unwrap();
    let loaded = Segment::load(
        params,
        DistanceMetric::Euclidean,
        Arc::new(VisitedPool::new()),
        dir.path(),
    )
    .unwrap();

    assert_same_graph(&segment, &loaded);
    assert_eq!(loaded.stats().freed, 2);

    // The loaded segment keeps working: recycle a hole, then search.
    assert!(loaded.add(Point::new(500, vec_for(500, 8))));
    assert_eq!(loaded.stats().high_water, 40);
    let hits = loaded.search(&vec_for(3, 8), 1, 40);
    assert_eq!(hits[0].id, 3);
}

#[test]
fn test_round_trip_without_in_edges() {
    let dir = tempfile::tempdir().unwrap();
    let params = SegmentParams::new(4, 64, 32);
    let segment = segment_with(params);

    for i in 0..20u64 {
        assert!(segment.add(Point::new(i, vec_for(i, 4))));
    }
    segment.snapshot(dir.path()).unwrap();
    assert!(
        !dir.path().join("links_in.bin").exists(),
        "in-links artifact only exists when removal is enabled"
    );

    let loaded = Segment::load(
        params,
        DistanceMetric::Euclidean,
        Arc::new(VisitedPool::new()),
        dir.path(),
    )
    .unwrap();
    assert_same_graph(&segment, &loaded);
}

#[test]
fn test_round_trip_empty_segment() {
    let dir = tempfile::tempdir().unwrap();
    let params = SegmentParams::new(8, 100, 16);
    let segment = segment_with(params);

    segment.snapshot(dir.path()).unwrap();
    let loaded = Segment::load(
        params,
        DistanceMetric::Euclidean,
        Arc::new(VisitedPool::new()),
        dir.path(),
    )
    .unwrap();
    assert!(loaded.is_empty());
    assert!(loaded.search(&[0.0; 4], 3, 10).is_empty());
}

#[test]
fn test_load_missing_artifact_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let params = SegmentParams::new(8, 100, 16);
    let err = Segment::load(
        params,
        DistanceMetric::Euclidean,
        Arc::new(VisitedPool::new()),
        dir.path(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Io(_)), "got {err}");
}

#[test]
fn test_load_truncated_artifact_is_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let params = SegmentParams::new(4, 64, 32);
    let segment = segment_with(params);
    for i in 0..10u64 {
        assert!(segment.add(Point::new(i, vec_for(i, 4))));
    }
    segment.snapshot(dir.path()).unwrap();

    let vectors = dir.path().join("vectors.bin");
    let bytes = std::fs::read(&vectors).unwrap();
    std::fs::write(&vectors, &bytes[..bytes.len() / 2]).unwrap();

    let err = Segment::load(
        params,
        DistanceMetric::Euclidean,
        Arc::new(VisitedPool::new()),
        dir.path(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Serialization(_)), "got {err}");
}

#[test]
fn test_load_rejects_capacity_overflow() {
    let dir = tempfile::tempdir().unwrap();
    let params = SegmentParams::new(4, 64, 64);
    let segment = segment_with(params);
    for i in 0..30u64 {
        assert!(segment.add(Point::new(i, vec_for(i, 4))));
    }
    segment.snapshot(dir.path()).unwrap();

    let small = SegmentParams::new(4, 64, 8);
    let err = Segment::load(
        small,
        DistanceMetric::Euclidean,
        Arc::new(VisitedPool::new()),
        dir.path(),
    )
    .unwrap_err();
    assert!(matches!(err, Error::Corrupted(_)), "got {err}");
}

#[test]
fn test_snapshot_does_not_disturb_state() {
    let dir = tempfile::tempdir().unwrap();
    let params = SegmentParams::new(4, 64, 32).with_remove_enabled(true);
    let segment = segment_with(params);
    for i in 0..20u64 {
        assert!(segment.add(Point::new(i, vec_for(i, 4))));
    }

    let before = segment.stats();
    segment.snapshot(dir.path()).unwrap();
    assert_eq!(segment.stats(), before);
    assert!(segment.add(Point::new(99, vec_for(99, 4))));
}
