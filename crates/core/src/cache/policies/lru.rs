//! Least Recently Used (LRU) Replacement Policy.
//!
//! This policy evicts the cache line that has not been touched for the longest
//! time. Each way carries the clock value of its last touch; a hit or an install
//! restamps it with the current clock. Empty ways are always filled first.
//!
//! # Performance
//!
//! - **Time Complexity:**
//!   - `update()`: O(1)
//!   - `get_victim()`: O(W) where W is the number of ways (associativity)
//! - **Space Complexity:** O(S × W) where S is the number of sets
//! - **Best Case:** Working sets that fit the cache with good temporal locality
//! - **Worst Case:** Scanning patterns larger than cache capacity (thrashing)

use super::{ReplacementPolicy, stamped_victim};
use crate::cache::CacheLine;
use crate::config::ReplacementPolicy as PolicyType;

/// LRU Policy state.
#[derive(Debug)]
pub struct LruPolicy {
    /// Last-touch stamp per line, indexed `set * ways + way`.
    stamps: Vec<u64>,
    /// Number of ways in the cache.
    ways: usize,
    /// Accesses processed so far.
    clock: u64,
}

impl LruPolicy {
    /// Creates a new LRU policy instance.
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

    /// Returns the last-touch stamp of a way.
    pub fn stamp(&self, set: usize, way: usize) -> u64 {
        self.stamps[set * self.ways + way]
    }
}

impl ReplacementPolicy for LruPolicy {
    fn kind(&self) -> PolicyType {
        PolicyType::Lru
    }

    fn tick(&mut self) {
        self.clock += 1;
    }

    /// Restamps the hit way: recency means "last touched", not "last loaded".
    fn update(&mut self, set: usize, way: usize) {
        self.stamps[set * self.ways + way] = self.clock;
    }

    fn get_victim(&mut self, set: usize, lines: &[CacheLine]) -> usize {
        let base = set * self.ways;
        stamped_victim(lines, &self.stamps[base..base + lines.len()])
    }

    fn install(&mut self, set: usize, way: usize) {
        self.stamps[set * self.ways + way] = self.clock;
    }
}
