//! Node records and their adjacency lists.
//!
//! A node is created fully initialized, published into its arena slot once,
//! and never moves. Everything except the adjacency lists is immutable after
//! publication; the lists are guarded by the node's own mutex, which doubles
//! as the per-node monitor of the locking protocol.

use crate::point::Point;
use parking_lot::{Mutex, MutexGuard};

/// Dense index into a segment's node arena.
pub type NodeId = u32;

/// A single graph node: payload plus one out-list (and optionally one
/// in-list) per layer it participates in.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    point: Point,
    max_level: usize,
    links: Mutex<Links>,
}

/// Adjacency lists of one node, all layers. Guarded by the owning node's
/// mutex; `inc` is `None` unless the segment tracks in-edges.
#[derive(Debug)]
pub(super) struct Links {
    out: Vec<Vec<NodeId>>,
    inc: Option<Vec<Vec<NodeId>>>,
}

impl Links {
    fn new(max_level: usize, m: usize, m0: usize, track_in: bool) -> Self {
        let lists = |reserve: bool| {
            (0..=max_level)
                .map(|level| {
                    if reserve {
                        Vec::with_capacity(if level == 0 { m0 } else { m })
                    } else {
                        Vec::new()
                    }
                })
                .collect::<Vec<_>>()
        };
        Self {
            out: lists(true),
            inc: track_in.then(|| lists(false)),
        }
    }

    /// Rebuilds lists from persisted data.
    pub(super) fn from_parts(out: Vec<Vec<NodeId>>, inc: Option<Vec<Vec<NodeId>>>) -> Self {
        Self { out, inc }
    }

    pub(super) fn out(&self, level: usize) -> &[NodeId] {
        self.out.get(level).map_or(&[], Vec::as_slice)
    }

    pub(super) fn out_len(&self, level: usize) -> usize {
        self.out.get(level).map_or(0, Vec::len)
    }

    pub(super) fn push_out(&mut self, level: usize, id: NodeId) {
        if let Some(list) = self.out.get_mut(level) {
            list.push(id);
        }
    }

    pub(super) fn set_out(&mut self, level: usize, ids: Vec<NodeId>) {
        if let Some(list) = self.out.get_mut(level) {
            *list = ids;
        }
    }

    pub(super) fn remove_out(&mut self, level: usize, id: NodeId) {
        if let Some(list) = self.out.get_mut(level) {
            list.retain(|&n| n != id);
        }
    }

    pub(super) fn incoming(&self, level: usize) -> &[NodeId] {
        self.inc
            .as_ref()
            .and_then(|inc| inc.get(level))
            .map_or(&[], Vec::as_slice)
    }

    pub(super) fn push_in(&mut self, level: usize, id: NodeId) {
        if let Some(list) = self.inc.as_mut().and_then(|inc| inc.get_mut(level)) {
            list.push(id);
        }
    }

    pub(super) fn remove_in(&mut self, level: usize, id: NodeId) {
        if let Some(list) = self.inc.as_mut().and_then(|inc| inc.get_mut(level)) {
            list.retain(|&n| n != id);
        }
    }
}

impl Node {
    /// Creates a fully initialized node, ready for publication.
    pub(super) fn new(
        id: NodeId,
        point: Point,
        max_level: usize,
        m: usize,
        m0: usize,
        track_in: bool,
    ) -> Self {
        Self {
            id,
            point,
            max_level,
            links: Mutex::new(Links::new(max_level, m, m0, track_in)),
        }
    }

    /// Rebuilds a node from persisted adjacency data.
    pub(super) fn from_parts(
        id: NodeId,
        point: Point,
        out: Vec<Vec<NodeId>>,
        inc: Option<Vec<Vec<NodeId>>>,
    ) -> Self {
        let max_level = out.len().saturating_sub(1);
        Self {
            id,
            point,
            max_level,
            links: Mutex::new(Links::from_parts(out, inc)),
        }
    }

    /// Internal id of this node.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// External id carried by this node's payload.
    #[must_use]
    pub fn external_id(&self) -> u64 {
        self.point.id
    }

    /// The stored vector.
    #[must_use]
    pub fn vector(&self) -> &[f32] {
        &self.point.vector
    }

    /// The stored payload.
    #[must_use]
    pub fn point(&self) -> &Point {
        &self.point
    }

    /// Highest layer this node participates in.
    #[must_use]
    pub fn max_level(&self) -> usize {
        self.max_level
    }

    /// Snapshot of the out-neighbors on `level` (empty above `max_level`).
    #[must_use]
    pub fn out_neighbors(&self, level: usize) -> Vec<NodeId> {
        self.links.lock().out(level).to_vec()
    }

    /// Snapshot of the in-neighbors on `level`. Always empty when the
    /// segment does not track in-edges.
    #[must_use]
    pub fn in_neighbors(&self, level: usize) -> Vec<NodeId> {
        self.links.lock().incoming(level).to_vec()
    }

    /// Acquires this node's monitor.
    pub(super) fn links(&self) -> MutexGuard<'_, Links> {
        self.links.lock()
    }
}
