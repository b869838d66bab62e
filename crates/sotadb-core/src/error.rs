//! Error types for `SotaDB` segments.
//!
//! This module provides a unified error type for all segment operations.
//! Graph-level rejections (capacity, duplicates) are reported through the
//! boolean return of [`crate::segment::Segment::add`] and
//! [`crate::segment::Segment::remove`]; this type covers configuration and
//! persistence failures.

use thiserror::Error;

/// Result type alias for `SotaDB` operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in `SotaDB` operations.
///
/// Error codes follow the pattern `SOTA-XXX` for easy debugging.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (SOTA-001).
    #[error("[SOTA-001] Configuration error: {0}")]
    Config(String),

    /// IO error (SOTA-002).
    #[error("[SOTA-002] IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error (SOTA-003).
    #[error("[SOTA-003] Serialization error: {0}")]
    Serialization(String),

    /// Snapshot corrupted (SOTA-004).
    ///
    /// Indicates that snapshot artifacts are inconsistent with each other
    /// and the segment must be rebuilt from source data.
    #[error("[SOTA-004] Snapshot corrupted: {0}")]
    Corrupted(String),

    /// Internal error (SOTA-005).
    ///
    /// Indicates an unexpected internal error. Please report if encountered.
    #[error("[SOTA-005] Internal error: {0}")]
    Internal(String),

    /// Segment capacity exhausted (SOTA-006).
    ///
    /// Every slot is live and no freed ids remain; the caller routes the
    /// insert to another segment.
    #[error("[SOTA-006] Segment capacity {capacity} exhausted")]
    CapacityExceeded {
        /// Configured node capacity of the segment.
        capacity: usize,
    },

    /// Dimension mismatch (SOTA-007).
    #[error("[SOTA-007] Vector dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Expected dimension.
        expected: usize,
        /// Actual dimension.
        actual: usize,
    },
}

impl Error {
    /// Returns the error code (e.g., "SOTA-001").
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "SOTA-001",
            Self::Io(_) => "SOTA-002",
            Self::Serialization(_) => "SOTA-003",
            Self::Corrupted(_) => "SOTA-004",
            Self::Internal(_) => "SOTA-005",
            Self::CapacityExceeded { .. } => "SOTA-006",
            Self::DimensionMismatch { .. } => "SOTA-007",
        }
    }

    /// Returns true if this error is recoverable.
    ///
    /// Non-recoverable errors include corruption and internal errors.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Corrupted(_) | Self::Internal(_))
    }
}
