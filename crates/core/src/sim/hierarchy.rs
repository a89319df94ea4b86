//! Cache hierarchy assembly.
//!
//! Builds the classic split-L1 hierarchy from a [`HierarchyConfig`]:
//!
//! ```text
//!   fetch ──► I$ ──┐
//!                  ├──► L2$ ──► (memory, not modeled)
//!   load/store ► D$┘
//! ```
//!
//! Every level is optional. When present, the L2 is the miss handler of both L1s.

use std::cell::RefCell;
use std::rc::Rc;

use super::trace::MemAccess;
use crate::cache::CacheSim;
use crate::common::error::ConfigError;
use crate::config::{CacheConfig, HierarchyConfig};
use crate::stats::StatsReport;
use crate::tracer::{DCacheTracer, ICacheTracer, MemTracer, MemTracerList};

/// Name of the level-1 instruction cache.
pub const ICACHE_NAME: &str = "I$";
/// Name of the level-1 data cache.
pub const DCACHE_NAME: &str = "D$";
/// Name of the unified level-2 cache.
pub const L2_NAME: &str = "L2$";

/// A wired set of cache levels driven through memory tracers.
#[derive(Debug)]
pub struct CacheHierarchy {
    icache: Option<Rc<RefCell<CacheSim>>>,
    dcache: Option<Rc<RefCell<CacheSim>>>,
    l2: Option<Rc<RefCell<CacheSim>>>,
    tracers: MemTracerList,
}

fn level(
    config: Option<CacheConfig>,
    name: &str,
    log: bool,
) -> Result<Option<Rc<RefCell<CacheSim>>>, ConfigError> {
    config
        .map(|config| {
            let mut cache = CacheSim::new(config, name)?;
            cache.set_log(log);
            Ok(Rc::new(RefCell::new(cache)))
        })
        .transpose()
}

impl CacheHierarchy {
    /// Builds and wires every configured level.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigError`] raised by a level; no level is built in that case.
    pub fn new(config: &HierarchyConfig) -> Result<Self, ConfigError> {
        let icache = level(config.icache, ICACHE_NAME, config.log_misses)?;
        let dcache = level(config.dcache, DCACHE_NAME, config.log_misses)?;
        let l2 = level(config.l2, L2_NAME, config.log_misses)?;

        if let Some(l2) = &l2 {
            for l1 in icache.iter().chain(dcache.iter()) {
                let mut upper = l1.borrow_mut();
                upper.set_miss_handler(l2.clone());
                tracing::debug!(upper = upper.name(), lower = L2_NAME, "miss handler attached");
            }
        }

        let mut tracers = MemTracerList::new();
        if let Some(icache) = &icache {
            tracers.hook(Box::new(ICacheTracer::new(icache.clone())));
        }
        if let Some(dcache) = &dcache {
            tracers.hook(Box::new(DCacheTracer::new(dcache.clone())));
        }

        Ok(Self {
            icache,
            dcache,
            l2,
            tracers,
        })
    }

    /// Feeds one reference to the hierarchy.
    ///
    /// References whose kind has no L1 to serve them are dropped.
    pub fn access(&mut self, access: &MemAccess) {
        self.tracers.trace(access.addr, access.bytes, access.kind);
    }

    /// Feeds a sequence of references in order.
    pub fn run<'a>(&mut self, accesses: impl IntoIterator<Item = &'a MemAccess>) {
        for access in accesses {
            self.access(access);
        }
    }

    /// The level-1 instruction cache, if configured.
    pub const fn icache(&self) -> Option<&Rc<RefCell<CacheSim>>> {
        self.icache.as_ref()
    }

    /// The level-1 data cache, if configured.
    pub const fn dcache(&self) -> Option<&Rc<RefCell<CacheSim>>> {
        self.dcache.as_ref()
    }

    /// The level-2 cache, if configured.
    pub const fn l2(&self) -> Option<&Rc<RefCell<CacheSim>>> {
        self.l2.as_ref()
    }

    /// Snapshots of every configured level, in `I$`, `D$`, `L2$` order.
    pub fn reports(&self) -> Vec<StatsReport> {
        [&self.icache, &self.dcache, &self.l2]
            .into_iter()
            .flatten()
            .map(|cache| {
                let cache = cache.borrow();
                StatsReport::new(cache.name(), *cache.stats())
            })
            .collect()
    }

    /// Formats the text report of every level that saw at least one access.
    pub fn report(&self) -> String {
        [&self.icache, &self.dcache, &self.l2]
            .into_iter()
            .flatten()
            .filter_map(|cache| cache.borrow().report())
            .collect()
    }
}
