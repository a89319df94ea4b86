//! Set-Associative Cache Simulator.
//!
//! This module implements a configurable cache model for trace-driven memory
//! hierarchy simulation. It tracks tags, valid and dirty state per line, but no
//! data. It provides:
//! 1. **Lookup:** Address decode and tag check against a [`TagStore`] backend.
//! 2. **Replacement:** Victim selection through a boxed [`ReplacementPolicy`].
//! 3. **Chaining:** Dirty victims are written back and missing lines are filled
//!    through an optional next-level [`MissHandler`].
//! 4. **Statistics:** Per-level access, miss and writeback counters.

/// Cache replacement policy implementations (FIFO, LRU, Random).
pub mod policies;

/// Tag storage backends (fixed array, hash map).
pub mod store;

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use self::policies::{Lfsr, RandomSource, ReplacementPolicy};
use self::store::{FullyAssociativeStore, SetAssociativeStore, TagStore};
use crate::common::addr::AddressDecoder;
use crate::common::error::ConfigError;
use crate::config::{CacheConfig, ReplacementPolicy as PolicyType};
use crate::stats::CacheStats;

/// Cache line entry containing tag, validity, and dirty bits.
///
/// The tag is the full line address (`addr >> log2(line_bytes)`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheLine {
    /// Line address of the resident line.
    pub tag: u64,
    /// The way holds a line.
    pub valid: bool,
    /// The line was written since it was installed. Implies `valid`.
    pub dirty: bool,
}

impl CacheLine {
    /// A valid, clean line for `tag`.
    pub const fn resident(tag: u64) -> Self {
        Self {
            tag,
            valid: true,
            dirty: false,
        }
    }
}

/// Receiver of the fill and writeback traffic a cache generates on misses.
///
/// Implemented by [`CacheSim`] itself so levels can be chained.
pub trait MissHandler {
    /// Handles one line-granular reference.
    ///
    /// # Arguments
    ///
    /// * `addr` - Byte address of the reference.
    /// * `bytes` - Size of the reference in bytes.
    /// * `is_write` - `true` for a writeback, `false` for a fill.
    fn access(&mut self, addr: u64, bytes: u64, is_write: bool);
}

/// Shared handle to a next-level miss handler.
///
/// Several upper levels (e.g. `I$` and `D$`) may share one lower level. The
/// chain must be acyclic.
pub type SharedHandler = Rc<RefCell<dyn MissHandler>>;

/// Cache simulator for one level of the memory hierarchy.
///
/// # Examples
///
/// ```
/// use cachesim_core::cache::CacheSim;
///
/// let mut cache = CacheSim::construct("1:2:8:L", "D$").unwrap();
/// for line in [0u64, 1, 0, 2] {
///     cache.access(line * 8, 8, false);
/// }
/// assert_eq!(cache.stats().read_misses, 3);
/// assert_eq!(cache.stats().miss_rate(), Some(75.0));
/// ```
pub struct CacheSim {
    name: String,
    config: CacheConfig,
    decoder: AddressDecoder,
    store: Box<dyn TagStore>,
    policy: Box<dyn ReplacementPolicy>,
    fully_associative: bool,
    miss_handler: Option<SharedHandler>,
    log: bool,
    stats: CacheStats,
}

impl CacheSim {
    /// Creates a cache, picking the tag store from the geometry.
    ///
    /// Single-set caches with more than four ways use the map-backed store.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the geometry is invalid.
    pub fn new(config: CacheConfig, name: impl Into<String>) -> Result<Self, ConfigError> {
        Self::with_random_source(config, name, Box::new(Lfsr::default()))
    }

    /// Parses a `sets:ways:linesize[:policy]` string and builds the cache.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the string is malformed or the geometry is invalid.
    pub fn construct(config: &str, name: impl Into<String>) -> Result<Self, ConfigError> {
        Self::new(config.parse()?, name)
    }

    /// Creates a cache whose random policy draws from `source`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the geometry is invalid.
    pub fn with_random_source(
        config: CacheConfig,
        name: impl Into<String>,
        source: Box<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        let fully_associative = config.is_fully_associative();
        Self::build(config, name.into(), fully_associative, source)
    }

    /// Creates a cache backed by the fixed array store regardless of geometry.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the geometry is invalid.
    pub fn set_associative(config: CacheConfig, name: impl Into<String>) -> Result<Self, ConfigError> {
        Self::build(config, name.into(), false, Box::new(Lfsr::default()))
    }

    /// Creates a single-set cache backed by the map store regardless of `ways`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the geometry is invalid.
    pub fn fully_associative(
        ways: usize,
        line_bytes: usize,
        policy: PolicyType,
        name: impl Into<String>,
    ) -> Result<Self, ConfigError> {
        let config = CacheConfig::new(1, ways, line_bytes, policy)?;
        Self::build(config, name.into(), true, Box::new(Lfsr::default()))
    }

    fn build(
        config: CacheConfig,
        name: String,
        fully_associative: bool,
        source: Box<dyn RandomSource>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        let store: Box<dyn TagStore> = if fully_associative {
            Box::new(FullyAssociativeStore::new(config.ways))
        } else {
            Box::new(SetAssociativeStore::new(config.sets, config.ways))
        };
        tracing::debug!(cache = %name, geometry = %config, fully_associative, "cache built");
        Ok(Self {
            decoder: AddressDecoder::new(config.line_bytes, config.sets),
            policy: policies::build(config.policy, config.sets, config.ways, source),
            store,
            name,
            config,
            fully_associative,
            miss_handler: None,
            log: false,
            stats: CacheStats::default(),
        })
    }

    /// Attaches the next level that receives this cache's fills and writebacks.
    pub fn set_miss_handler(&mut self, handler: SharedHandler) {
        self.miss_handler = Some(handler);
    }

    /// Detaches the next level, making this cache the last in its chain.
    pub fn clear_miss_handler(&mut self) -> Option<SharedHandler> {
        self.miss_handler.take()
    }

    /// Returns `true` if a next level is attached.
    pub const fn has_miss_handler(&self) -> bool {
        self.miss_handler.is_some()
    }

    /// Enables or disables the per-miss diagnostic trace.
    ///
    /// Purely observational: cache state is the same either way.
    pub fn set_log(&mut self, enabled: bool) {
        self.log = enabled;
    }

    /// Returns `true` if the per-miss diagnostic trace is enabled.
    pub const fn logs_misses(&self) -> bool {
        self.log
    }

    /// Name used to label diagnostics and reports.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Geometry and policy this cache was built with.
    pub const fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Returns `true` if the map-backed store is in use.
    pub const fn is_fully_associative(&self) -> bool {
        self.fully_associative
    }

    /// Counters accumulated so far.
    pub const fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Formats the end-of-run report, or `None` if the cache was never accessed.
    pub fn report(&self) -> Option<String> {
        self.stats.report(&self.name)
    }

    /// Checks whether the line containing `addr` is resident.
    ///
    /// Does not count as an access and leaves the policy untouched.
    pub fn contains(&self, addr: u64) -> bool {
        let (set, tag) = self.decoder.decode(addr);
        self.store.find(set, tag).is_some()
    }

    /// Returns the dirty bit of the line containing `addr`, or `None` if absent.
    pub fn is_dirty(&self, addr: u64) -> Option<bool> {
        let (set, tag) = self.decoder.decode(addr);
        self.store
            .find(set, tag)
            .map(|way| self.store.line(set, way).dirty)
    }

    /// Number of valid lines currently held.
    pub fn resident_lines(&self) -> usize {
        self.store.resident()
    }

    /// Simulates one line-granular reference.
    ///
    /// On a hit only the counters, the dirty bit and the policy state change.
    /// On a miss the policy picks a victim; a valid dirty victim is counted as
    /// a writeback and, if a next level exists, written to it; then the new line
    /// is filled from the next level and installed. The writeback always
    /// precedes the fill, and both complete before this call returns.
    ///
    /// # Arguments
    ///
    /// * `addr` - Byte address of the reference.
    /// * `bytes` - Size of the reference, used only for statistics.
    /// * `is_write` - `true` for a store, `false` for a load or fetch.
    pub fn access(&mut self, addr: u64, bytes: u64, is_write: bool) {
        self.policy.tick();
        self.stats.record_access(bytes, is_write);

        let (set, tag) = self.decoder.decode(addr);
        if let Some(way) = self.store.find(set, tag) {
            self.policy.update(set, way);
            if is_write {
                self.store.line_mut(set, way).dirty = true;
            }
            return;
        }

        self.stats.record_miss(is_write);
        if self.log {
            tracing::info!(
                target: "cachesim::miss",
                "{} {} miss {:#x}",
                self.name,
                if is_write { "write" } else { "read" },
                addr
            );
        }

        let way = self.store.victimize(set, &mut *self.policy);
        self.policy.install(set, way);
        let victim = self.store.install(set, way, tag);
        let line_bytes = self.config.line_bytes as u64;

        if victim.valid && victim.dirty {
            let dirty_addr = self.decoder.line_addr(victim.tag);
            self.stats.writebacks = self.stats.writebacks.wrapping_add(1);
            tracing::debug!(cache = %self.name, "writeback {:#x}", dirty_addr);
            if let Some(next) = &self.miss_handler {
                next.borrow_mut().access(dirty_addr, line_bytes, true);
            }
        }

        if let Some(next) = &self.miss_handler {
            next.borrow_mut()
                .access(self.decoder.line_base(addr), line_bytes, false);
        }

        if is_write {
            self.store.line_mut(set, way).dirty = true;
        }
    }
}

impl MissHandler for CacheSim {
    fn access(&mut self, addr: u64, bytes: u64, is_write: bool) {
        Self::access(self, addr, bytes, is_write);
    }
}

impl fmt::Debug for CacheSim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSim")
            .field("name", &self.name)
            .field("config", &self.config)
            .field("fully_associative", &self.fully_associative)
            .field("store", &self.store)
            .field("policy", &self.policy)
            .field("has_miss_handler", &self.miss_handler.is_some())
            .field("log", &self.log)
            .field("stats", &self.stats)
            .finish()
    }
}
