//! # `SotaDB` Core
//!
//! Concurrent in-memory HNSW segments for approximate nearest-neighbor
//! search.
//!
//! A [`Segment`] is one bounded shard of a vector index: vectors are
//! inserted into and searched from its multi-layer proximity graph by many
//! threads at once, with a fine-grained locking protocol that reserves
//! global serialization for rare topology-level changes. Sharding across
//! segments, result aggregation and storage framing live in the layers
//! above this crate.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sotadb_core::{DistanceMetric, Point, Segment, SegmentParams, VisitedPool};
//!
//! let params = SegmentParams::new(16, 200, 10_000).with_remove_enabled(true);
//! let segment = Segment::new(params, DistanceMetric::Cosine, Arc::new(VisitedPool::new()))?;
//!
//! segment.add(Point::new(42, vec![1.0, 0.0, 0.0]));
//! let hits = segment.search(&[1.0, 0.0, 0.0], 10, 128);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod distance;
pub mod error;
pub mod point;
pub mod segment;

pub use distance::DistanceMetric;
pub use error::{Error, Result};
pub use point::Point;
pub use segment::{
    Node, NodeId, SearchQuality, SearchResult, Segment, SegmentParams, SegmentStats, VisitedPool,
};
