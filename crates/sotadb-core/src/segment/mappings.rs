//! External-id lookup.
//!
//! Maps caller-chosen external ids to index-wide global ids
//! (`internal + base_id`). Reads are lock-free on the search path; writes
//! happen inside the insert and removal protocols.

use super::node::NodeId;
use dashmap::DashMap;

/// External id -> global id map with segment-range helpers.
#[derive(Debug)]
pub(super) struct IdMap {
    map: DashMap<u64, u64>,
    base_id: u64,
    capacity: u64,
}

impl IdMap {
    pub(super) fn new(base_id: u64, capacity: usize) -> Self {
        Self {
            map: DashMap::new(),
            base_id,
            capacity: capacity as u64,
        }
    }

    /// Global id currently mapped to `external_id`, if any.
    pub(super) fn get(&self, external_id: u64) -> Option<u64> {
        self.map.get(&external_id).map(|entry| *entry)
    }

    pub(super) fn insert(&self, external_id: u64, internal: NodeId) {
        self.map.insert(external_id, self.base_id + u64::from(internal));
    }

    pub(super) fn remove(&self, external_id: u64) -> Option<u64> {
        self.map.remove(&external_id).map(|(_, global)| global)
    }

    /// Whether `global` falls inside this segment's id range.
    pub(super) fn in_segment(&self, global: u64) -> bool {
        global >= self.base_id && global < self.base_id + self.capacity
    }

    /// Translates an in-range global id back to an internal id.
    #[allow(clippy::cast_possible_truncation)]
    pub(super) fn to_internal(&self, global: u64) -> NodeId {
        debug_assert!(self.in_segment(global));
        (global - self.base_id) as NodeId
    }

    /// Number of live mappings, which equals the number of live nodes.
    pub(super) fn len(&self) -> usize {
        self.map.len()
    }
}
