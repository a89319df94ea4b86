//! Random Replacement Policy.
//!
//! This policy evicts a uniformly drawn way from the set. It does not look at
//! occupancy: a valid line may be evicted while another way is still empty,
//! which gives it a different warm-up behavior from LRU and FIFO.
//!
//! The draws come from a [`RandomSource`]. The default source is a 32-bit
//! Galois LFSR, which keeps runs reproducible.

use std::fmt;

use super::ReplacementPolicy;
use crate::cache::CacheLine;
use crate::config::ReplacementPolicy as PolicyType;

/// Source of uniformly distributed integers for random replacement.
pub trait RandomSource: fmt::Debug + Send + Sync {
    /// Returns the next draw.
    fn next_u32(&mut self) -> u32;
}

/// 32-bit Galois linear feedback shift register.
///
/// Taps `0xd000_0001`, seeded with 1. Never produces zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lfsr {
    reg: u32,
}

impl Lfsr {
    /// Creates a register with the given seed. A zero seed is replaced by 1.
    pub const fn with_seed(seed: u32) -> Self {
        Self {
            reg: if seed == 0 { 1 } else { seed },
        }
    }
}

impl Default for Lfsr {
    fn default() -> Self {
        Self::with_seed(1)
    }
}

impl RandomSource for Lfsr {
    fn next_u32(&mut self) -> u32 {
        self.reg = (self.reg >> 1) ^ ((self.reg & 1).wrapping_neg() & 0xd000_0001);
        self.reg
    }
}

/// Random Policy state.
#[derive(Debug)]
pub struct RandomPolicy {
    /// Number of ways in the cache.
    ways: usize,
    /// Generator for victim draws.
    source: Box<dyn RandomSource>,
}

impl RandomPolicy {
    /// Creates a random policy drawing from the default LFSR.
    ///
    /// # Arguments
    ///
    /// * `ways` - The associativity (number of ways) of the cache.
    pub fn new(ways: usize) -> Self {
        Self::with_source(ways, Box::new(Lfsr::default()))
    }

    /// Creates a random policy drawing from `source`.
    pub fn with_source(ways: usize, source: Box<dyn RandomSource>) -> Self {
        Self { ways, source }
    }
}

impl ReplacementPolicy for RandomPolicy {
    fn kind(&self) -> PolicyType {
        PolicyType::Random
    }

    /// Access patterns do not affect random replacement.
    fn update(&mut self, _set: usize, _way: usize) {}

    /// Maps the next draw onto `[0, ways)`.
    fn get_victim(&mut self, _set: usize, _lines: &[CacheLine]) -> usize {
        self.source.next_u32() as usize % self.ways
    }

    fn install(&mut self, _set: usize, _way: usize) {}
}
