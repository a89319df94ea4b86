//! Cache Replacement Policies.
//!
//! Implements the algorithms for selecting victim lines in a cache set.
//!
//! # Policies
//!
//! - `Fifo`: First-In, First-Out (insertion stamps).
//! - `Lru`: Least Recently Used (touch stamps).
//! - `Random`: Uniform draw from an external generator.
//!
//! Stamped policies share one `u64` clock per cache, advanced once per access,
//! so stamps are comparable across every set for the whole run.

/// First-In, First-Out replacement policy.
pub mod fifo;

/// Least Recently Used replacement policy.
pub mod lru;

/// Random replacement policy and its generator.
pub mod random;

use std::fmt;

pub use fifo::FifoPolicy;
pub use lru::LruPolicy;
pub use random::{Lfsr, RandomPolicy, RandomSource};

use super::CacheLine;
use crate::config::ReplacementPolicy as PolicyType;

/// Trait for cache replacement policies.
///
/// The cache drives a policy through one access as follows: [`tick`] once,
/// then either [`update`] (hit) or [`get_victim`] followed by [`install`] (miss).
///
/// [`tick`]: ReplacementPolicy::tick
/// [`update`]: ReplacementPolicy::update
/// [`get_victim`]: ReplacementPolicy::get_victim
/// [`install`]: ReplacementPolicy::install
pub trait ReplacementPolicy: fmt::Debug + Send + Sync {
    /// Returns which algorithm this is.
    fn kind(&self) -> PolicyType;

    /// Advances the policy clock. Called once per access, hit or miss.
    fn tick(&mut self) {}

    /// Updates the policy state when a resident line is hit.
    ///
    /// # Arguments
    ///
    /// * `set` - The cache set index.
    /// * `way` - The way index within the set that was accessed.
    fn update(&mut self, set: usize, way: usize);

    /// Selects the way to evict from a set on a miss.
    ///
    /// # Arguments
    ///
    /// * `set` - The cache set index.
    /// * `lines` - The current state of every way in the set.
    ///
    /// # Returns
    ///
    /// The index of the way to evict, always `< lines.len()`.
    fn get_victim(&mut self, set: usize, lines: &[CacheLine]) -> usize;

    /// Records that a new line was installed in `way`.
    fn install(&mut self, set: usize, way: usize);
}

/// Builds the policy object for `kind`.
///
/// `source` feeds the random policy and is dropped for the stamped ones.
pub fn build(
    kind: PolicyType,
    sets: usize,
    ways: usize,
    source: Box<dyn RandomSource>,
) -> Box<dyn ReplacementPolicy> {
    match kind {
        PolicyType::Random => Box::new(RandomPolicy::with_source(ways, source)),
        PolicyType::Lru => Box::new(LruPolicy::new(sets, ways)),
        PolicyType::Fifo => Box::new(FifoPolicy::new(sets, ways)),
    }
}

/// Way selection shared by the stamped policies.
///
/// Returns the first invalid way in scan order; if every way is valid, the way
/// with the smallest stamp (first one on ties).
fn stamped_victim(lines: &[CacheLine], stamps: &[u64]) -> usize {
    if let Some(way) = lines.iter().position(|line| !line.valid) {
        return way;
    }
    (0..lines.len())
        .min_by_key(|&way| stamps[way])
        .unwrap_or(0)
}
