//! Random value capability consumed by sessions.

/// Source of generated nicknames, message texts and timing draws.
pub trait RandomSource: Send + Sync {
    /// Random lowercase string of exactly `len` characters.
    fn string(&self, len: usize) -> String;

    /// Uniform integer in `[min, max]`, both ends inclusive.
    fn int_between(&self, min: u64, max: u64) -> u64;
}
