//! Memory tracers.
//!
//! A processor model reports every memory reference it makes to a list of
//! tracers; each tracer decides whether the reference concerns it. The cache
//! tracers forward instruction fetches to the instruction cache and loads and
//! stores to the data cache.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::cache::CacheSim;

/// Kind of memory reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    /// Instruction fetch.
    Fetch,
    /// Data load.
    Load,
    /// Data store.
    Store,
}

impl AccessType {
    /// Returns `true` for stores.
    pub const fn is_write(self) -> bool {
        matches!(self, Self::Store)
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Fetch => "fetch",
            Self::Load => "load",
            Self::Store => "store",
        })
    }
}

/// Observer of memory references.
pub trait MemTracer {
    /// Returns `true` if references of kind `ty` in `[begin, end)` are of interest.
    fn interested_in_range(&self, begin: u64, end: u64, ty: AccessType) -> bool;

    /// Records one reference.
    fn trace(&mut self, addr: u64, bytes: u64, ty: AccessType);
}

/// Forwards instruction fetches to a cache.
#[derive(Debug, Clone)]
pub struct ICacheTracer {
    cache: Rc<RefCell<CacheSim>>,
}

impl ICacheTracer {
    /// Creates a tracer feeding `cache`.
    pub const fn new(cache: Rc<RefCell<CacheSim>>) -> Self {
        Self { cache }
    }

    /// The cache this tracer feeds.
    pub const fn cache(&self) -> &Rc<RefCell<CacheSim>> {
        &self.cache
    }
}

impl MemTracer for ICacheTracer {
    fn interested_in_range(&self, _begin: u64, _end: u64, ty: AccessType) -> bool {
        ty == AccessType::Fetch
    }

    fn trace(&mut self, addr: u64, bytes: u64, ty: AccessType) {
        if ty == AccessType::Fetch {
            self.cache.borrow_mut().access(addr, bytes, false);
        }
    }
}

/// Forwards loads and stores to a cache.
#[derive(Debug, Clone)]
pub struct DCacheTracer {
    cache: Rc<RefCell<CacheSim>>,
}

impl DCacheTracer {
    /// Creates a tracer feeding `cache`.
    pub const fn new(cache: Rc<RefCell<CacheSim>>) -> Self {
        Self { cache }
    }

    /// The cache this tracer feeds.
    pub const fn cache(&self) -> &Rc<RefCell<CacheSim>> {
        &self.cache
    }
}

impl MemTracer for DCacheTracer {
    fn interested_in_range(&self, _begin: u64, _end: u64, ty: AccessType) -> bool {
        ty != AccessType::Fetch
    }

    fn trace(&mut self, addr: u64, bytes: u64, ty: AccessType) {
        if ty != AccessType::Fetch {
            self.cache.borrow_mut().access(addr, bytes, ty.is_write());
        }
    }
}

/// Ordered collection of tracers; fans each reference out to the interested ones.
#[derive(Default)]
pub struct MemTracerList {
    tracers: Vec<Box<dyn MemTracer>>,
}

impl MemTracerList {
    /// Creates an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a tracer.
    pub fn hook(&mut self, tracer: Box<dyn MemTracer>) {
        self.tracers.push(tracer);
    }

    /// Returns `true` if no tracer is hooked.
    pub fn is_empty(&self) -> bool {
        self.tracers.is_empty()
    }

    /// Number of hooked tracers.
    pub fn len(&self) -> usize {
        self.tracers.len()
    }
}

impl MemTracer for MemTracerList {
    /// `true` if any hooked tracer is interested.
    fn interested_in_range(&self, begin: u64, end: u64, ty: AccessType) -> bool {
        self.tracers
            .iter()
            .any(|t| t.interested_in_range(begin, end, ty))
    }

    fn trace(&mut self, addr: u64, bytes: u64, ty: AccessType) {
        let end = addr.saturating_add(bytes);
        for tracer in &mut self.tracers {
            if tracer.interested_in_range(addr, end, ty) {
                tracer.trace(addr, bytes, ty);
            }
        }
    }
}

impl fmt::Debug for MemTracerList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemTracerList")
            .field("tracers", &self.tracers.len())
            .finish()
    }
}
