//! The segment object: node arena, coordinator state, constructors and
//! accessors.

use std::sync::Arc;

use arc_swap::ArcSwapOption;
use parking_lot::{Mutex, RwLock};

use super::level::LevelSampler;
use super::mappings::IdMap;
use super::node::{Node, NodeId};
use super::params::SegmentParams;
use super::pool::{ConstructionSet, VisitedPool};
use crate::distance::DistanceMetric;
use crate::error::Result;

/// Hands out internal ids, recycling slots vacated by removal.
///
/// All access happens under the segment-wide mutex that owns this value.
#[derive(Debug, Default)]
pub(super) struct IdAllocator {
    high_water: NodeId,
    freed: Vec<NodeId>,
}

impl IdAllocator {
    /// Pops a recycled id, or advances the high-water mark while capacity
    /// remains.
    pub(super) fn allocate(&mut self, capacity: usize) -> Option<NodeId> {
        if let Some(id) = self.freed.pop() {
            return Some(id);
        }
        if (self.high_water as usize) < capacity {
            let id = self.high_water;
            self.high_water += 1;
            Some(id)
        } else {
            None
        }
    }

    pub(super) fn free(&mut self, id: NodeId) {
        self.freed.push(id);
    }

    pub(super) fn high_water(&self) -> NodeId {
        self.high_water
    }

    pub(super) fn freed_len(&self) -> usize {
        self.freed.len()
    }

    pub(super) fn restore(&mut self, high_water: NodeId, freed: Vec<NodeId>) {
        self.high_water = high_water;
        self.freed = freed;
    }
}

/// Cached root of the graph: the node every search and insert starts from,
/// together with its level. Written only by threads holding the segment-wide
/// mutex; readers snapshot it before descending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) struct EntryPoint {
    pub(super) id: NodeId,
    pub(super) level: usize,
}

/// Point-in-time counters for one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentStats {
    /// Number of live nodes.
    pub live: usize,
    /// Highest slot index ever assigned.
    pub high_water: usize,
    /// Recycled ids currently available.
    pub freed: usize,
    /// Level of the current entry point, if any node is live.
    pub max_level: Option<usize>,
}

/// A bounded, concurrently mutable HNSW graph over one shard of an index.
///
/// Many threads may insert and search at once; removal and entry-point
/// changes serialize on the segment-wide mutex.
///
/// # Locking protocol
///
/// Four synchronization layers, acquired in this order:
///
/// 1. `ids` — the segment-wide mutex. Id allocation, duplicate handling,
///    entry-point rotation and removal all serialize here. Inserts that
///    cannot move the entry point drop it early and proceed in parallel.
/// 2. `topology` — reader/writer lock. Inserts and searches are readers;
///    snapshotting takes it in write mode to freeze the graph.
/// 3. Per-node monitors (each [`Node`]'s own mutex). A thread holds at most
///    the monitor of the node it is inserting plus one established node's.
/// 4. `in_flight` — the in-construction set. Its mutex is a leaf: nothing
///    else is acquired while it is held.
#[derive(Debug)]
pub struct Segment {
    pub(super) params: SegmentParams,
    pub(super) metric: DistanceMetric,
    pub(super) levels: LevelSampler,
    /// Fixed arena. A slot transitions absent -> published -> absent; a
    /// published node is always fully initialized.
    pub(super) slots: Box<[ArcSwapOption<Node>]>,
    pub(super) lookup: IdMap,
    pub(super) ids: Mutex<IdAllocator>,
    pub(super) entry: RwLock<Option<EntryPoint>>,
    pub(super) topology: RwLock<()>,
    pub(super) in_flight: ConstructionSet,
    pub(super) visited: Arc<VisitedPool>,
}

impl Segment {
    /// Creates an empty segment.
    ///
    /// The visited pool is taken as a shared handle so a parent index can
    /// hand the same pool to every segment it owns.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Config`] if the parameters are invalid.
    pub fn new(
        params: SegmentParams,
        metric: DistanceMetric,
        visited: Arc<VisitedPool>,
    ) -> Result<Self> {
        params.validate()?;
        let slots = (0..params.capacity)
            .map(|_| ArcSwapOption::empty())
            .collect::<Vec<_>>()
            .into_boxed_slice();
        tracing::info!(
            capacity = params.capacity,
            m = params.max_connections,
            ef_construction = params.ef_construction,
            base_id = params.base_id,
            remove_enabled = params.remove_enabled,
            "segment created"
        );
        Ok(Self {
            params,
            metric,
            levels: LevelSampler::new(params.level_lambda),
            slots,
            lookup: IdMap::new(params.base_id, params.capacity),
            ids: Mutex::new(IdAllocator::default()),
            entry: RwLock::new(None),
            topology: RwLock::new(()),
            in_flight: ConstructionSet::default(),
            visited,
        })
    }

    /// The node published at `internal`, if the slot is live.
    #[must_use]
    pub fn node(&self, internal: NodeId) -> Option<Arc<Node>> {
        self.slots.get(internal as usize)?.load_full()
    }

    /// The vector stored at `internal`, if the slot is live.
    #[must_use]
    pub fn vector(&self, internal: NodeId) -> Option<Vec<f32>> {
        self.node(internal).map(|n| n.vector().to_vec())
    }

    /// Global id (`internal + base_id`) currently mapped to `external_id`.
    #[must_use]
    pub fn global_id(&self, external_id: u64) -> Option<u64> {
        self.lookup.get(external_id)
    }

    /// Whether `external_id` is live in this segment.
    #[must_use]
    pub fn contains(&self, external_id: u64) -> bool {
        self.global_id(external_id)
            .is_some_and(|global| self.lookup.in_segment(global))
    }

    /// Number of live nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lookup.len()
    }

    /// True if no node is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// This segment's immutable configuration.
    #[must_use]
    pub fn params(&self) -> &SegmentParams {
        &self.params
    }

    /// The configured distance metric.
    #[must_use]
    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Point-in-time counters for observability.
    #[must_use]
    pub fn stats(&self) -> SegmentStats {
        let (high_water, freed) = {
            let ids = self.ids.lock();
            (ids.high_water() as usize, ids.freed_len())
        };
        let max_level = (*self.entry.read()).map(|ep| ep.level);
        SegmentStats {
            live: self.len(),
            high_water,
            freed,
            max_level,
        }
    }
}
