//! Tag storage backends.
//!
//! A cache keeps its line states in a [`TagStore`]. Two backends exist:
//! 1. **`SetAssociativeStore`:** A fixed `sets × ways` array scanned per lookup.
//! 2. **`FullyAssociativeStore`:** One set whose lines are found through a
//!    `tag → way` hash map and grown on demand up to `ways` entries.
//!
//! Both hand victim selection to the cache's replacement policy, so the same
//! policy yields the same hit/miss sequence on either backend.

use std::collections::HashMap;
use std::fmt;

use super::CacheLine;
use super::policies::ReplacementPolicy;

/// Storage for the line states of one cache.
pub trait TagStore: fmt::Debug + Send + Sync {
    /// Returns the way holding `tag` in `set`, if resident.
    fn find(&self, set: usize, tag: u64) -> Option<usize>;

    /// Returns the state of a way.
    fn line(&self, set: usize, way: usize) -> &CacheLine;

    /// Returns the state of a way for in-place update.
    fn line_mut(&mut self, set: usize, way: usize) -> &mut CacheLine;

    /// Chooses the way that will receive a missing line.
    fn victimize(&mut self, set: usize, policy: &mut dyn ReplacementPolicy) -> usize;

    /// Installs `tag` as a valid, clean line in `way` and returns the line it
    /// replaced.
    fn install(&mut self, set: usize, way: usize, tag: u64) -> CacheLine;

    /// Number of valid lines currently held.
    fn resident(&self) -> usize;
}

/// Fixed-array store for set-associative caches.
#[derive(Debug, Clone)]
pub struct SetAssociativeStore {
    lines: Vec<CacheLine>,
    ways: usize,
}

impl SetAssociativeStore {
    /// Creates an empty store of `sets × ways` lines.
    pub fn new(sets: usize, ways: usize) -> Self {
        Self {
            lines: vec![CacheLine::default(); sets * ways],
            ways,
        }
    }

    fn set_lines(&self, set: usize) -> &[CacheLine] {
        let base = set * self.ways;
        &self.lines[base..base + self.ways]
    }
}

impl TagStore for SetAssociativeStore {
    fn find(&self, set: usize, tag: u64) -> Option<usize> {
        self.set_lines(set)
            .iter()
            .position(|line| line.valid && line.tag == tag)
    }

    fn line(&self, set: usize, way: usize) -> &CacheLine {
        &self.lines[set * self.ways + way]
    }

    fn line_mut(&mut self, set: usize, way: usize) -> &mut CacheLine {
        &mut self.lines[set * self.ways + way]
    }

    fn victimize(&mut self, set: usize, policy: &mut dyn ReplacementPolicy) -> usize {
        policy.get_victim(set, self.set_lines(set))
    }

    fn install(&mut self, set: usize, way: usize, tag: u64) -> CacheLine {
        std::mem::replace(self.line_mut(set, way), CacheLine::resident(tag))
    }

    fn resident(&self) -> usize {
        self.lines.iter().filter(|line| line.valid).count()
    }
}

/// Map-backed store for fully-associative caches.
///
/// Lines are appended in fill order until `ways` is reached; from then on every
/// install replaces an existing line in place.
#[derive(Debug, Clone)]
pub struct FullyAssociativeStore {
    index: HashMap<u64, usize>,
    lines: Vec<CacheLine>,
    ways: usize,
}

impl FullyAssociativeStore {
    /// Creates an empty store that holds at most `ways` lines.
    pub fn new(ways: usize) -> Self {
        Self {
            index: HashMap::with_capacity(ways),
            lines: Vec::with_capacity(ways),
            ways,
        }
    }

    const fn is_full(&self) -> bool {
        self.lines.len() >= self.ways
    }
}

impl TagStore for FullyAssociativeStore {
    fn find(&self, _set: usize, tag: u64) -> Option<usize> {
        self.index.get(&tag).copied()
    }

    fn line(&self, _set: usize, way: usize) -> &CacheLine {
        &self.lines[way]
    }

    fn line_mut(&mut self, _set: usize, way: usize) -> &mut CacheLine {
        &mut self.lines[way]
    }

    /// Below capacity the next free way is taken without consulting the policy's
    /// victim choice, so no random draw is spent.
    fn victimize(&mut self, _set: usize, policy: &mut dyn ReplacementPolicy) -> usize {
        if self.is_full() {
            policy.get_victim(0, &self.lines)
        } else {
            self.lines.len()
        }
    }

    fn install(&mut self, _set: usize, way: usize, tag: u64) -> CacheLine {
        let old = if way == self.lines.len() {
            self.lines.push(CacheLine::resident(tag));
            CacheLine::default()
        } else {
            let old = std::mem::replace(&mut self.lines[way], CacheLine::resident(tag));
            if old.valid {
                let _ = self.index.remove(&old.tag);
            }
            old
        };
        let _ = self.index.insert(tag, way);
        old
    }

    fn resident(&self) -> usize {
        self.index.len()
    }
}
