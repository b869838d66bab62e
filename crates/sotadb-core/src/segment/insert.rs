//! The insertion protocol.
//!
//! An insert serializes on the segment-wide mutex only long enough to check
//! for duplicates, allocate an id and snapshot the entry point. Inserts that
//! cannot rotate the entry point release the mutex there and wire themselves
//! into the graph concurrently, holding the topology lock in read mode and
//! individual node monitors for the brief list mutations.

use std::sync::Arc;

use super::core::{EntryPoint, Segment};
use super::node::{Node, NodeId};
use super::ordered_float::OrderedFloat;
use super::search::Candidate;
use crate::error::Error;
use crate::point::Point;

impl Segment {
    /// Inserts `point` into the graph.
    ///
    /// Returns `true` on acceptance, and also for an exact duplicate
    /// (same external id, same vector) when removal is enabled — the insert
    /// is idempotent in that case. Returns `false` when the segment is full,
    /// when the external id is already mapped outside this segment, when a
    /// duplicate arrives while removal is disabled, or when the vector's
    /// dimensionality disagrees with the graph.
    pub fn add(&self, point: Point) -> bool {
        let mut global = Some(self.ids.lock());

        // The first admitted vector fixes the graph's dimensionality.
        if let Some(ep) = *self.entry.read() {
            if let Some(entry_node) = self.node(ep.id) {
                let expected = entry_node.vector().len();
                if expected != point.vector.len() {
                    let err = Error::DimensionMismatch {
                        expected,
                        actual: point.vector.len(),
                    };
                    tracing::warn!(external_id = point.id, error = %err, "insert rejected");
                    return false;
                }
            }
        }

        // The lookup can only be trusted for duplicate decisions while the
        // segment-wide mutex is held.
        if let Some(existing) = self.lookup.get(point.id) {
            if !self.params.remove_enabled {
                tracing::debug!(external_id = point.id, "duplicate rejected: removal disabled");
                return false;
            }
            if !self.lookup.in_segment(existing) {
                tracing::debug!(
                    external_id = point.id,
                    global_id = existing,
                    "duplicate mapped to another segment"
                );
                return false;
            }
            let internal = self.lookup.to_internal(existing);
            if self
                .node(internal)
                .is_some_and(|n| n.vector() == point.vector.as_slice())
            {
                return true;
            }
            // Changed vector: unlink the old node inline, then insert fresh.
            let alloc = global.as_mut().expect("segment mutex held");
            self.unlink(internal, alloc);
        }

        let Some(internal) = global
            .as_mut()
            .expect("segment mutex held")
            .allocate(self.params.capacity)
        else {
            let err = Error::CapacityExceeded {
                capacity: self.params.capacity,
            };
            tracing::warn!(external_id = point.id, error = %err, "insert rejected");
            return false;
        };

        let level = self.levels.level_for(point.id);
        let entry_snapshot = *self.entry.read();
        let rotates = entry_snapshot.is_none_or(|ep| level > ep.level);
        if entry_snapshot.is_some() && !rotates {
            // This insert cannot move the entry point; let other inserts run.
            global = None;
        }

        let _view = self.topology.read();
        let node = Arc::new(Node::new(
            internal,
            point,
            level,
            self.params.max_connections,
            self.params.max_connections_0,
            self.params.remove_enabled,
        ));
        // Marked before publication: other inserts must not link to this
        // node until all of its layers are wired.
        let _building = self.in_flight.mark(internal);

        self.slots[internal as usize].store(Some(Arc::clone(&node)));
        self.lookup.insert(node.external_id(), internal);

        if let Some(ep) = entry_snapshot {
            let query = node.vector();
            let mut cur = ep.id;
            if level < ep.level {
                cur = self.greedy_descent(query, cur, ep.level, level + 1);
            }
            for layer in (0..=level.min(ep.level)).rev() {
                let top = self.search_layer(cur, query, self.params.ef_construction, layer);
                if let Some(best) = top.first() {
                    cur = best.id;
                }
                self.mutually_connect(&node, &top, layer);
            }
        }

        if rotates {
            // Only reached with the segment-wide mutex still held.
            *self.entry.write() = Some(EntryPoint {
                id: internal,
                level,
            });
            tracing::trace!(internal, level, "entry point rotated");
        }
        true
    }

    /// Wires `node` into `layer`: picks up to the layer's degree cap from
    /// `candidates` via the spread heuristic, adds forward edges, and gives
    /// each picked neighbor a reverse edge — re-selecting the neighbor's
    /// out-list when it is already at capacity.
    fn mutually_connect(&self, node: &Arc<Node>, candidates: &[Candidate], layer: usize) {
        let cap = self.params.degree_cap(layer);
        let track_in = self.params.remove_enabled;
        let selected = self.select_heuristic(candidates, cap);

        let mut links = node.links();
        for cand in selected {
            // Half-built nodes are invisible to linking.
            if self.in_flight.contains(cand.id) {
                continue;
            }
            // Gone if a removal raced this insert; nothing to wire.
            let Some(neighbor) = self.node(cand.id) else {
                continue;
            };
            links.push_out(layer, cand.id);

            let mut evicted: Vec<NodeId> = Vec::new();
            {
                let mut nl = neighbor.links();
                if track_in {
                    nl.push_in(layer, node.id());
                }
                if nl.out_len(layer) < cap {
                    nl.push_out(layer, node.id());
                    if track_in {
                        links.push_in(layer, cand.id);
                    }
                } else {
                    // Re-select the neighbor's out-list among its current
                    // targets plus the new node, keeping the `cap` closest
                    // to the neighbor itself.
                    let mut pool: Vec<Candidate> = Vec::with_capacity(cap + 1);
                    for &other in nl.out(layer) {
                        let Some(other_node) = self.node(other) else {
                            continue;
                        };
                        let Ok(dist) = self.metric.distance(neighbor.vector(), other_node.vector())
                        else {
                            continue;
                        };
                        pool.push(Candidate {
                            dist: OrderedFloat(dist),
                            id: other,
                        });
                    }
                    pool.push(Candidate {
                        dist: cand.dist,
                        id: node.id(),
                    });
                    pool.sort_unstable();

                    let kept: Vec<NodeId> = pool.iter().take(cap).map(|c| c.id).collect();
                    if track_in {
                        if kept.contains(&node.id()) {
                            links.push_in(layer, cand.id);
                        }
                        evicted = pool
                            .iter()
                            .skip(cap)
                            .map(|c| c.id)
                            .filter(|&id| id != node.id())
                            .collect();
                    }
                    nl.set_out(layer, kept);
                }
            }
            // In-edge fixups for evicted nodes run after the neighbor's
            // monitor is dropped: at most one established node's monitor is
            // held at any point.
            for evictee in evicted {
                if let Some(evicted_node) = self.node(evictee) {
                    evicted_node.links().remove_in(layer, cand.id);
                }
            }
        }
    }
}
