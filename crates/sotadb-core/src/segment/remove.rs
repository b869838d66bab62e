//! The removal protocol.
//!
//! Removal holds the segment-wide mutex for its whole duration: it unlinks
//! the node from every in- and out-edge layer by layer, re-picks the entry
//! point when the removed node was it, clears the lookup entry and the arena
//! slot, and recycles the internal id.

use super::core::{EntryPoint, IdAllocator, Segment};
use super::node::NodeId;

impl Segment {
    /// Removes the node at `internal`.
    ///
    /// Returns `false` when in-edge tracking is disabled or no node is live
    /// at `internal`.
    pub fn remove(&self, internal: NodeId) -> bool {
        if !self.params.remove_enabled {
            tracing::debug!(internal, "remove rejected: in-edge tracking disabled");
            return false;
        }
        let mut ids = self.ids.lock();
        self.unlink(internal, &mut ids)
    }

    /// Unlinks and clears one node. Caller holds the segment-wide mutex.
    pub(super) fn unlink(&self, internal: NodeId, ids: &mut IdAllocator) -> bool {
        let Some(node) = self.node(internal) else {
            return false;
        };

        for level in (0..=node.max_level()).rev() {
            let (incoming, outgoing) = {
                let links = node.links();
                (links.incoming(level).to_vec(), links.out(level).to_vec())
            };
            for pred in incoming {
                if let Some(pred_node) = self.node(pred) {
                    pred_node.links().remove_out(level, internal);
                }
            }
            for succ in outgoing {
                if let Some(succ_node) = self.node(succ) {
                    succ_node.links().remove_in(level, internal);
                }
            }
        }

        let was_entry = (*self.entry.read()).is_some_and(|ep| ep.id == internal);
        if was_entry {
            // The node's own out-lists are still intact: the first remaining
            // neighbor on the highest populated layer becomes the new root.
            let mut successor = None;
            for level in (0..=node.max_level()).rev() {
                if let Some(&first) = node.out_neighbors(level).first() {
                    if let Some(first_node) = self.node(first) {
                        successor = Some(EntryPoint {
                            id: first,
                            level: first_node.max_level(),
                        });
                        break;
                    }
                }
            }
            *self.entry.write() = successor;
            tracing::trace!(internal, successor = ?successor, "entry point re-picked");
        }

        self.lookup.remove(node.external_id());
        self.slots[internal as usize].store(None);
        ids.free(internal);
        true
    }
}
