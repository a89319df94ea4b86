//! Trace-driven cache hierarchy simulator library.
//!
//! This crate models the behavior of a memory hierarchy without storing data:
//! 1. **Cache:** Set-associative and fully-associative levels with Random, LRU and FIFO replacement.
//! 2. **Chaining:** Dirty-line writebacks and fills forwarded to a next-level miss handler.
//! 3. **Tracers:** Routing of fetches, loads and stores to the instruction and data caches.
//! 4. **Simulation:** Trace parsing, hierarchy assembly, and statistics reporting.

/// Cache model (lines, tag stores, replacement policies, miss handling).
pub mod cache;
/// Common types (address decomposition, errors).
pub mod common;
/// Cache and hierarchy configuration.
pub mod config;
/// Trace parsing and hierarchy assembly.
pub mod sim;
/// Per-level statistics and reports.
pub mod stats;
/// Memory tracers routing references to caches.
pub mod tracer;

/// Main cache type; construct with `CacheSim::construct("sets:ways:line:P", name)`.
pub use crate::cache::{CacheSim, MissHandler};
/// Geometry of one level; parse from a `sets:ways:line[:P]` string.
pub use crate::config::CacheConfig;
/// Wired I$/D$/L2$ hierarchy built from a `HierarchyConfig`.
pub use crate::sim::CacheHierarchy;
