//! Graph traversal: layer-local best-first search, the greedy zoom used to
//! reach lower layers, heuristic neighbor selection and k-NN queries.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::sync::Arc;

use super::core::Segment;
use super::node::{Node, NodeId};
use super::ordered_float::OrderedFloat;
use super::params::SearchQuality;

/// One k-NN match: the external id of a node and its distance to the query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchResult {
    /// External id of the matched node.
    pub id: u64,
    /// Distance to the query under the segment's metric.
    pub distance: f32,
}

/// Heap entry during traversal. Equal distances order by ascending internal
/// id, so search output is deterministic across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct Candidate {
    pub(super) dist: OrderedFloat,
    pub(super) id: NodeId,
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.dist
            .cmp(&other.dist)
            .then_with(|| self.id.cmp(&other.id))
    }
}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Segment {
    fn dist_to(&self, query: &[f32], node: &Node) -> Option<OrderedFloat> {
        self.metric
            .distance(query, node.vector())
            .ok()
            .map(OrderedFloat)
    }

    /// Best-first beam search across one layer's subgraph.
    ///
    /// Returns at most `k` candidates sorted by distance ascending. Each
    /// traversed node's monitor is held only while its out-list is copied.
    pub(super) fn search_layer(
        &self,
        entry: NodeId,
        query: &[f32],
        k: usize,
        level: usize,
    ) -> Vec<Candidate> {
        if k == 0 {
            return Vec::new();
        }
        // A concurrent removal can clear any slot between snapshotting a
        // neighbor list and resolving its ids. Absent slots are skipped
        // throughout the traversal.
        let Some(entry_node) = self.node(entry) else {
            return Vec::new();
        };

        let Some(entry_dist) = self.dist_to(query, &entry_node) else {
            return Vec::new();
        };

        let mut visited = self.visited.acquire();
        visited.insert(entry);

        let first = Candidate {
            dist: entry_dist,
            id: entry,
        };
        let mut top: BinaryHeap<Candidate> = BinaryHeap::with_capacity(k + 1);
        let mut frontier: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
        top.push(first);
        frontier.push(Reverse(first));
        let mut lower_bound = first.dist;

        while let Some(Reverse(cand)) = frontier.pop() {
            if cand.dist > lower_bound {
                break;
            }
            let Some(cand_node) = self.node(cand.id) else {
                continue;
            };
            for nbr in cand_node.out_neighbors(level) {
                if !visited.insert(nbr) {
                    continue;
                }
                let Some(nbr_node) = self.node(nbr) else {
                    continue;
                };
                let Some(dist) = self.dist_to(query, &nbr_node) else {
                    continue;
                };
                let next = Candidate { dist, id: nbr };
                if top.len() < k {
                    frontier.push(Reverse(next));
                    top.push(next);
                } else if top.peek().is_some_and(|worst| next < *worst) {
                    frontier.push(Reverse(next));
                    top.pop();
                    top.push(next);
                }
                if let Some(worst) = top.peek() {
                    lower_bound = worst.dist;
                }
            }
        }
        top.into_sorted_vec()
    }

    /// Greedy walk from `entry` down to `to`, taking the best local minimum
    /// on each layer. Used to zoom through the sparse upper layers.
    pub(super) fn greedy_descent(
        &self,
        query: &[f32],
        entry: NodeId,
        from: usize,
        to: usize,
    ) -> NodeId {
        let mut cur = entry;
        let Some(cur_node) = self.node(cur) else {
            return cur;
        };
        let Some(mut cur_dist) = self.dist_to(query, &cur_node) else {
            return cur;
        };

        for level in (to..=from).rev() {
            loop {
                let Some(node) = self.node(cur) else {
                    return cur;
                };
                let mut improved = false;
                for nbr in node.out_neighbors(level) {
                    let Some(nbr_node) = self.node(nbr) else {
                        continue;
                    };
                    let Some(d) = self.dist_to(query, &nbr_node) else {
                        continue;
                    };
                    if d < cur_dist {
                        cur = nbr;
                        cur_dist = d;
                        improved = true;
                    }
                }
                if !improved {
                    break;
                }
            }
        }
        cur
    }

    /// Prunes `candidates` (sorted by distance ascending) down to at most
    /// `m`, keeping angular spread: a candidate is accepted only if it is
    /// closer to the query than to every already-accepted neighbor.
    pub(super) fn select_heuristic(
        &self,
        candidates: &[Candidate],
        m: usize,
    ) -> Vec<Candidate> {
        let mut selected: Vec<(Candidate, Arc<Node>)> = Vec::with_capacity(m);
        for &cand in candidates {
            if selected.len() >= m {
                break;
            }
            let Some(cand_node) = self.node(cand.id) else {
                continue;
            };
            let spread = selected.iter().all(|(_, picked)| {
                self.metric
                    .distance(cand_node.vector(), picked.vector())
                    .is_ok_and(|d| cand.dist.0 < d)
            });
            if spread {
                selected.push((cand, cand_node));
            }
        }
        selected.into_iter().map(|(cand, _)| cand).collect()
    }

    /// Searches for the `k` nearest neighbors of `query` with beam width
    /// `max(ef, k)`.
    ///
    /// Results are sorted by distance ascending; ties order by internal id.
    /// An empty segment, or a query whose dimensionality disagrees with the
    /// stored vectors, returns an empty list.
    #[must_use]
    pub fn search(&self, query: &[f32], k: usize, ef: usize) -> Vec<SearchResult> {
        let _view = self.topology.read();
        let Some(ep) = *self.entry.read() else {
            return Vec::new();
        };
        if k == 0 {
            return Vec::new();
        }

        let mut entry = ep.id;
        if ep.level > 0 {
            entry = self.greedy_descent(query, entry, ep.level, 1);
        }
        let top = self.search_layer(entry, query, ef.max(k), 0);

        top.into_iter()
            .take(k)
            .filter_map(|cand| {
                let node = self.node(cand.id)?;
                Some(SearchResult {
                    id: node.external_id(),
                    distance: cand.dist.0,
                })
            })
            .collect()
    }

    /// [`Segment::search`] with the beam width chosen by a quality profile.
    #[must_use]
    pub fn search_with_quality(
        &self,
        query: &[f32],
        k: usize,
        quality: SearchQuality,
    ) -> Vec<SearchResult> {
        self.search(query, k, quality.ef(k))
    }
}
