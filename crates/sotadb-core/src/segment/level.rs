//! Layer assignment for new nodes.
//!
//! Layers follow the usual exponential distribution, but the draw is a pure
//! function of the external id rather than of shared RNG state: re-inserting
//! the same id always lands on the same layer, which keeps rebuilds and
//! replicas structurally identical.

/// Hard cap on layer indices. With `lambda = 1/ln(16)` the probability of
/// drawing a level this high is below 1e-18.
pub(super) const MAX_LEVEL: usize = 16;

/// Deterministic per-id layer sampler.
#[derive(Debug, Clone, Copy)]
pub(super) struct LevelSampler {
    lambda: f64,
}

impl LevelSampler {
    pub(super) const fn new(lambda: f64) -> Self {
        Self { lambda }
    }

    /// Draws the layer for `external_id`.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub(super) fn level_for(&self, external_id: u64) -> usize {
        // splitmix64 finalizer; external ids are often sequential and a raw
        // modulo would bias the distribution.
        let mut x = external_id.wrapping_add(0x9E37_79B9_7F4A_7C15);
        x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
        x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
        x ^= x >> 31;

        // Uniform in (0, 1]: the +1 keeps ln() away from zero.
        let uniform = ((x >> 11) + 1) as f64 / (1u64 << 53) as f64;
        let level = (-uniform.ln() * self.lambda).floor() as usize;
        level.min(MAX_LEVEL)
    }
}
