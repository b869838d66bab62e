//! Shared bitmap state: the pooled visited sets used by layer searches and
//! the set of nodes currently being wired into the graph.

use super::node::NodeId;
use parking_lot::Mutex;
use roaring::RoaringBitmap;

/// Pool of visited bitmaps for layer searches.
///
/// Every search draws one bitmap and returns it cleared when done, so steady
/// state allocates nothing. The pool is shared: a parent holding many
/// segments passes the same `Arc<VisitedPool>` to all of them.
#[derive(Debug, Default)]
pub struct VisitedPool {
    pool: Mutex<Vec<RoaringBitmap>>,
}

impl VisitedPool {
    /// Creates an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Draws a cleared bitmap, allocating only if the pool is empty.
    pub(super) fn acquire(&self) -> VisitedSet<'_> {
        let bits = self.pool.lock().pop().unwrap_or_default();
        VisitedSet {
            pool: self,
            bits: Some(bits),
        }
    }

    #[cfg(test)]
    pub(super) fn pooled(&self) -> usize {
        self.pool.lock().len()
    }
}

/// A visited bitmap on loan from a [`VisitedPool`].
///
/// Dropping the guard clears the bitmap and returns it to the pool on every
/// exit path, including unwinding.
#[derive(Debug)]
pub(super) struct VisitedSet<'a> {
    pool: &'a VisitedPool,
    bits: Option<RoaringBitmap>,
}

impl VisitedSet<'_> {
    /// Marks `id`, returning true if it was not yet visited.
    pub(super) fn insert(&mut self, id: NodeId) -> bool {
        self.bits.as_mut().is_some_and(|b| b.insert(id))
    }
}

impl Drop for VisitedSet<'_> {
    fn drop(&mut self) {
        if let Some(mut bits) = self.bits.take() {
            bits.clear();
            self.pool.pool.lock().push(bits);
        }
    }
}

/// Internal ids currently being mutually connected by an inserter.
///
/// Other inserters consult this set before linking to a neighbor so nobody
/// wires an edge to a half-built node. Entries are touched exactly twice per
/// insert, so a single mutex around one bitmap is enough. The mutex is a
/// leaf in the lock order: nothing else is acquired while it is held.
#[derive(Debug, Default)]
pub(super) struct ConstructionSet {
    bits: Mutex<RoaringBitmap>,
}

impl ConstructionSet {
    /// Marks `id` as under construction until the guard drops.
    pub(super) fn mark(&self, id: NodeId) -> ConstructionGuard<'_> {
        self.bits.lock().insert(id);
        ConstructionGuard { set: self, id }
    }

    /// Whether `id` is currently being wired.
    pub(super) fn contains(&self, id: NodeId) -> bool {
        self.bits.lock().contains(id)
    }
}

/// Clears the construction bit on drop, on every exit path.
#[derive(Debug)]
pub(super) struct ConstructionGuard<'a> {
    set: &'a ConstructionSet,
    id: NodeId,
}

impl Drop for ConstructionGuard<'_> {
    fn drop(&mut self) {
        self.set.bits.lock().remove(self.id);
    }
}
