//! External-facing vector payload.

use serde::{Deserialize, Serialize};

/// A vector entry as supplied by the caller: a user-chosen id plus its
/// embedding.
///
/// The id is unique across the whole index; the segment maps it to a dense
/// internal id on insertion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Caller-chosen identifier.
    pub id: u64,
    /// Embedding vector.
    pub vector: Vec<f32>,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub fn new(id: u64, vector: Vec<f32>) -> Self {
        Self { id, vector }
    }

    /// Vector dimensionality.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.vector.len()
    }
}
