//! Segment parameters and search quality profiles.
//!
//! Parameters are immutable for the lifetime of a segment. They can be built
//! in code, or layered from a `sotadb.toml` file and `SOTA_SEGMENT_*`
//! environment variables.

use crate::error::{Error, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::Path;

fn default_base_id() -> u64 {
    0
}

/// Immutable configuration of a single segment.
///
/// Use [`SegmentParams::auto`] for automatic tuning based on vector
/// dimension, [`SegmentParams::new`] for the common case (`M0 = 2M`,
/// `level_lambda = 1/ln M`), or set the fields explicitly for specific
/// workloads.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SegmentParams {
    /// Target out-degree per node on layers above 0 (M parameter).
    /// Higher = better recall, more memory, slower insert.
    pub max_connections: usize,
    /// Target out-degree on layer 0 (typically `2 * M`).
    pub max_connections_0: usize,
    /// Beam width of the candidate search during insertion.
    /// Higher = better quality graph, slower indexing.
    pub ef_construction: usize,
    /// Decay of the layer assignment distribution (typically `1 / ln M`).
    pub level_lambda: f64,
    /// Fixed node capacity of the segment.
    pub capacity: usize,
    /// Offset added to internal ids to produce index-wide global ids.
    #[serde(default = "default_base_id")]
    pub base_id: u64,
    /// Whether in-edges are tracked, enabling node removal and updates.
    #[serde(default)]
    pub remove_enabled: bool,
}

impl Default for SegmentParams {
    fn default() -> Self {
        Self::auto(768)
    }
}

impl SegmentParams {
    /// Creates parameters tuned for the vector dimension.
    ///
    /// Low-dimensional vectors settle for a sparser graph; embedding-scale
    /// vectors need more links and a wider construction beam to hold recall.
    #[must_use]
    pub fn auto(dimension: usize) -> Self {
        match dimension {
            0..=256 => Self::new(24, 300, 100_000),
            // 257+ dimensions: denser graph for embedding-scale vectors
            _ => Self::new(32, 400, 100_000),
        }
    }

    /// Creates parameters with the conventional derived values:
    /// `max_connections_0 = 2 * m` and `level_lambda = 1 / ln(m)`.
    #[must_use]
    pub fn new(m: usize, ef_construction: usize, capacity: usize) -> Self {
        Self {
            max_connections: m,
            max_connections_0: m * 2,
            ef_construction,
            level_lambda: 1.0 / (m.max(2) as f64).ln(),
            capacity,
            base_id: 0,
            remove_enabled: false,
        }
    }

    /// Sets the global-id offset of this segment.
    #[must_use]
    pub const fn with_base_id(mut self, base_id: u64) -> Self {
        self.base_id = base_id;
        self
    }

    /// Enables in-edge tracking, required by removal and vector updates.
    #[must_use]
    pub const fn with_remove_enabled(mut self, enabled: bool) -> Self {
        self.remove_enabled = enabled;
        self
    }

    /// Loads parameters from a TOML file, with `SOTA_SEGMENT_*` environment
    /// variables taking precedence over file values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the file cannot be parsed or the
    /// resulting parameters fail validation.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let params: Self = Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("SOTA_SEGMENT_"))
            .extract()
            .map_err(|e| Error::Config(e.to_string()))?;
        params.validate()?;
        Ok(params)
    }

    /// Checks that the parameters describe a usable segment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending field.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 {
            return Err(Error::Config("capacity must be positive".into()));
        }
        if self.capacity > u32::MAX as usize {
            return Err(Error::Config(format!(
                "capacity {} exceeds the internal id range",
                self.capacity
            )));
        }
        if self.max_connections == 0 || self.max_connections_0 == 0 {
            return Err(Error::Config("max_connections must be positive".into()));
        }
        if self.ef_construction < self.max_connections {
            return Err(Error::Config(format!(
                "ef_construction {} is below max_connections {}",
                self.ef_construction, self.max_connections
            )));
        }
        if !self.level_lambda.is_finite() || self.level_lambda <= 0.0 {
            return Err(Error::Config("level_lambda must be finite and positive".into()));
        }
        Ok(())
    }

    /// Out-degree cap for the given layer.
    #[must_use]
    pub const fn degree_cap(&self, level: usize) -> usize {
        if level == 0 {
            self.max_connections_0
        } else {
            self.max_connections
        }
    }
}

/// Search quality profile controlling the recall/latency tradeoff.
///
/// Profiles map to a beam width (`ef`) so callers do not have to hand-pick
/// one per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchQuality {
    /// Fast search with `ef = 64`.
    Fast,
    /// Balanced search with `ef = 128`.
    #[default]
    Balanced,
    /// Accurate search with `ef = 256`.
    Accurate,
    /// Custom beam width.
    Custom(usize),
}

impl SearchQuality {
    /// Returns the beam width for this profile, never below `k`.
    #[must_use]
    pub fn ef(&self, k: usize) -> usize {
        match self {
            Self::Fast => 64.max(k * 2),
            Self::Balanced => 128.max(k * 4),
            Self::Accurate => 256.max(k * 8),
            Self::Custom(ef) => (*ef).max(k),
        }
    }
}
