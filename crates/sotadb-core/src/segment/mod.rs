//! A leaf segment: one bounded, concurrently mutable HNSW graph.
//!
//! A segment owns a fixed arena of nodes, a multi-layer proximity graph over
//! them, and the mapping from caller-chosen external ids to internal slots.
//! Many threads insert and search concurrently; a segment-wide mutex
//! serializes only the rare topology-level changes (id allocation,
//! entry-point rotation, removal). The locking protocol is documented on
//! [`Segment`].
//!
//! # Module Organization
//!
//! - `params`: segment configuration and search quality profiles
//! - `core`: the [`Segment`] object, arena and coordinator state
//! - `search`: best-first layer search, greedy zoom, k-NN queries
//! - `insert` / `remove`: the write protocols
//! - `persistence`: four-artifact snapshot and load
//! - `node`, `mappings`, `pool`, `level`: supporting structures

// ============================================================================
// Core modules
// ============================================================================
mod core;
mod insert;
mod level;
mod mappings;
mod node;
mod ordered_float;
mod params;
mod persistence;
mod pool;
mod remove;
mod search;

// ============================================================================
// Tests
// ============================================================================
#[cfg(test)]
mod core_tests;
#[cfg(test)]
mod ordered_float_tests;
#[cfg(test)]
mod persistence_tests;

// ============================================================================
// Public API
// ============================================================================
pub use core::{Segment, SegmentStats};
pub use node::{Node, NodeId};
pub use params::{SearchQuality, SegmentParams};
pub use pool::VisitedPool;
pub use search::SearchResult;
