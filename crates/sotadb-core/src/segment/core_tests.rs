//! Tests for `core` module: insert/remove scenarios and graph invariants.

use std::sync::Arc;

use super::core::Segment;
use super::params::SegmentParams;
use super::pool::VisitedPool;
use crate::distance::DistanceMetric;
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

/// Checks degree bounds, in/out mirroring and entry-point liveness over the
/// whole arena.
fn check_graph(segment: &Segment) {
    let params = *segment.params();
    let high_water = segment.stats().high_water;

    #[allow(clippy::cast_possible_truncation)]
    for internal in 0..high_water as u32 {
        let Some(node) = segment.node(internal) else {
            continue;
        };
        for level in 0..=node.max_level() {
            let outs = node.out_neighbors(level);
            assert!(
                outs.len() <= params.degree_cap(level),
                "node {internal} exceeds degree cap on layer {level}"
            );
            for nbr in outs {
                let nbr_node = segment
                    .node(nbr)
                    .unwrap_or_else(|| panic!("node {internal} links to dead node {nbr}"));
                assert!(
                    nbr_node.max_level() >= level,
                    "node {internal} links to {nbr} above its top layer"
                );
                if params.remove_enabled {
                    assert!(
                        nbr_node.in_neighbors(level).contains(&internal),
                        "edge {internal}->{nbr} is not mirrored on layer {level}"
                    );
                }
            }
            if params.remove_enabled {
                for pred in node.in_neighbors(level) {
                    let pred_node = segment
                        .node(pred)
                        .unwrap_or_else(|| panic!("dead in-neighbor {pred} of {internal}"));
                    assert!(
                        pred_node.out_neighbors(level).contains(&internal),
                        "in-edge {pred}->{internal} has no out-edge on layer {level}"
                    );
                }
            }
        }
    }

    if let Some(entry_level) = segment.stats().max_level {
        #[allow(clippy::cast_possible_truncation)]
        let observed = (0..high_water as u32)
            .filter_map(|i| segment.node(i))
            .map(|n| n.max_level())
            .max()
            .expect("entry implies a live node");
        assert_eq!(entry_level, observed, "entry point is not at the top layer");
    }
}

#[test]
fn test_empty_segment_search_is_empty() {
    let segment = segment_with(SegmentParams::new(16, 200, 100));
    assert!(segment.is_empty());
    assert!(segment.search(&[1.0, 0.0, 0.0], 5, 50).is_empty());
}

#[test]
fn test_single_insert_exact_hit() {
    let params = SegmentParams::new(16, 200, 100);
    let segment = Segment::new(
        params,
        DistanceMetric::Cosine,
        Arc::new(VisitedPool::new()),
    )
    .unwrap();

    assert!(segment.add(Point::new(42, vec![1.0, 0.0, 0.0])));
    let hits = segment.search(&[1.0, 0.0, 0.0], 1, 10);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, 42);
    assert!(hits[0].distance.abs() < 1e-6);
}

#[test]
fn test_insert_fill_remove_and_recycle() {
    let params = SegmentParams::new(4, 100, 100).with_remove_enabled(true);
    let segment = segment_with(params);

    for i in 0..100u64 {
        assert!(segment.add(Point::new(i, vec_for(i, 8))), "insert {i}");
    }
    assert_eq!(segment.len(), 100);
    check_graph(&segment);

    assert!(segment.remove(50));
    assert_eq!(segment.len(), 99);
    check_graph(&segment);

    // The freed slot makes room for one more.
    assert!(segment.add(Point::new(1000, vec_for(1000, 8))));
    assert_eq!(segment.len(), 100);
    assert_eq!(segment.stats().high_water, 100);
    assert_eq!(segment.stats().freed, 0);
    check_graph(&segment);

    let hits = segment.search(&vec_for(1000, 8), 1, 50);
    assert_eq!(hits[0].id, 1000);
}

#[test]
fn test_idempotent_duplicate_add() {
    let params = SegmentParams::new(8, 100, 10).with_remove_enabled(true);
    let segment = segment_with(params);

    let point = Point::new(7, vec![0.5, 0.5, 0.0]);
    assert!(segment.add(point.clone()));
    assert!(segment.add(point));
    assert_eq!(segment.len(), 1);
    assert_eq!(segment.stats().high_water, 1);
}

#[test]
fn test_duplicate_update_rejected_without_remove() {
    let segment = segment_with(SegmentParams::new(8, 100, 10));

    assert!(segment.add(Point::new(7, vec![1.0, 0.0])));
    assert!(!segment.add(Point::new(7, vec![0.0, 1.0])));
    assert_eq!(segment.len(), 1);
    assert_eq!(segment.vector(0).unwrap(), vec![1.0, 0.0]);
}

#[test]
fn test_duplicate_update_replaces_vector() {
    let params = SegmentParams::new(8, 100, 10).with_remove_enabled(true);
    let segment = segment_with(params);

    assert!(segment.add(Point::new(7, vec![1.0, 0.0])));
    assert!(segment.add(Point::new(7, vec![0.0, 1.0])));
    assert_eq!(segment.len(), 1);
    // The freed slot is recycled for the replacement node.
    assert_eq!(segment.stats().high_water, 1);
    assert_eq!(segment.vector(0).unwrap(), vec![0.0, 1.0]);

    let hits = segment.search(&[0.0, 1.0], 1, 10);
    assert_eq!(hits[0].id, 7);
    assert!(hits[0].distance.abs() < 1e-6);
}

#[test]
fn test_capacity_bound_and_recovery() {
    let params = SegmentParams::new(4, 16, 10).with_remove_enabled(true);
    let segment = segment_with(params);

    for i in 0..10u64 {
        assert!(segment.add(Point::new(i, vec_for(i, 4))));
    }
    assert!(!segment.add(Point::new(100, vec_for(100, 4))), "over capacity");

    assert!(segment.remove(3));
    assert!(segment.add(Point::new(100, vec_for(100, 4))));
    assert_eq!(segment.len(), 10);
}

#[test]
fn test_remove_disabled_and_missing() {
    let segment = segment_with(SegmentParams::new(8, 100, 10));
    assert!(segment.add(Point::new(1, vec![1.0])));
    assert!(!segment.remove(0), "tracking disabled");

    let params = SegmentParams::new(8, 100, 10).with_remove_enabled(true);
    let tracked = segment_with(params);
    assert!(!tracked.remove(0), "nothing live");
    assert!(tracked.add(Point::new(1, vec![1.0])));
    assert!(tracked.remove(0));
    assert!(!tracked.remove(0), "already removed");
}

#[test]
fn test_remove_all_nodes_empties_segment() {
    let params = SegmentParams::new(4, 64, 40).with_remove_enabled(true);
    let segment = segment_with(params);

    for i in 0..30u64 {
        assert!(segment.add(Point::new(i, vec_for(i, 6))));
    }
    for internal in 0..30u32 {
        assert!(segment.remove(internal), "remove {internal}");
        check_graph(&segment);
    }
    assert!(segment.is_empty());
    assert_eq!(segment.stats().max_level, None);
    assert!(segment.search(&vec_for(3, 6), 3, 20).is_empty());
}

#[test]
fn test_dimension_mismatch_rejected() {
    let segment = segment_with(SegmentParams::new(8, 100, 10));
    assert!(segment.add(Point::new(1, vec![1.0, 0.0])));

    // The first vector fixed the dimensionality at 2.
    assert!(!segment.add(Point::new(2, vec![1.0, 0.0, 0.0])));
    assert_eq!(segment.len(), 1);

    assert!(segment.search(&[1.0, 0.0, 0.0], 1, 10).is_empty());
    assert_eq!(segment.search(&[1.0, 0.0], 1, 10).len(), 1);
}

#[test]
fn test_node_and_vector_accessors() {
    let segment = segment_with(SegmentParams::new(8, 100, 10));
    assert!(segment.add(Point::new(9, vec![1.0, 2.0])));

    let node = segment.node(0).unwrap();
    assert_eq!(node.id(), 0);
    assert_eq!(node.external_id(), 9);
    assert_eq!(node.point().id, 9);
    assert_eq!(segment.vector(0).unwrap(), vec![1.0, 2.0]);

    assert!(segment.node(1).is_none());
    assert!(segment.vector(99).is_none());
    assert!(segment.node(10_000).is_none(), "out of arena bounds");
}

#[test]
fn test_graph_invariants_after_bulk_insert() {
    let params = SegmentParams::new(4, 64, 200).with_remove_enabled(true);
    let segment = segment_with(params);
    for i in 0..200u64 {
        assert!(segment.add(Point::new(i, vec_for(i, 8))));
    }
    check_graph(&segment);
}

#[test]
fn test_base_id_offsets_lookup() {
    let params = SegmentParams::new(8, 100, 10).with_base_id(4096);
    let segment = segment_with(params);
    assert!(segment.add(Point::new(5, vec![1.0, 0.0])));
    // The same external id maps back to the local slot.
    assert!(segment.add(Point::new(6, vec![0.0, 1.0])));
    assert_eq!(segment.len(), 2);
    let hits = segment.search(&[1.0, 0.0], 1, 10);
    assert_eq!(hits[0].id, 5);
}
