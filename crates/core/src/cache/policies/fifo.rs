//! First-In, First-Out (FIFO) Replacement Policy.
//!
//! This policy evicts the oldest cache line in a set, regardless of how recently
//! it was accessed. Each way records the clock value at which its line was
//! installed; hits leave that stamp alone. Empty ways are always filled first.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `update()`: O(1) (no-op)
//!   - `get_victim()`: O(W) where W is the number of ways
//! - **Space Complexity:** O(S × W) where S is the number of sets
//! - **Best Case:** Streaming accesses where all lines have equal importance
//! - **Worst Case:** Workloads with strong temporal locality (may evict frequently-used lines)

use super::{ReplacementPolicy, stamped_victim};
use crate::cache::CacheLine;
use crate::config::ReplacementPolicy as PolicyType;

/// FIFO Policy state.
#[derive(Debug)]
pub struct FifoPolicy {
    /// Insertion stamp per line, indexed `set * ways + way`.
    stamps: Vec<u64>,
    /// Number of ways in the cache.
    ways: usize,
    /// Accesses processed so far.
    clock: u64,
}

impl FifoPolicy {
    /// Creates a new FIFO policy instance.
    ///
    /// # Arguments
    ///
    /// * `sets` - The number of sets in the cache.
    /// * `ways` - The associativity (number of ways) of the cache.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            stamps: vec![0; sets * ways],
            ways,
            clock: 0,
        }
    }

    /// Returns the current clock value.
    pub const fn clock(&self) -> u64 {
        self.clock
    }

    /// Returns the insertion stamp of a way.
    pub fn stamp(&self, set: usize, way: usize) -> u64 {
        self.stamps[set * self.ways + way]
    }
}

impl ReplacementPolicy for FifoPolicy {
    fn kind(&self) -> PolicyType {
        PolicyType::Fifo
    }

    fn tick(&mut self) {
        self.clock += 1;
    }

    fn update(&mut self, _set: usize, _way: usize) {}

    fn get_victim(&mut self, set: usize, lines: &[CacheLine]) -> usize {
        let base = set * self.ways;
        stamped_victim(lines, &self.stamps[base..base + lines.len()])
    }

    fn install(&mut self, set: usize, way: usize) {
        self.stamps[set * self.ways + way] = self.clock;
    }
}
