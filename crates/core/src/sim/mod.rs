//! Trace-driven simulation.
//!
//! This module provides:
//! 1. **Trace input:** Parsing of text access traces.
//! 2. **Hierarchy:** Assembly of the I$/D$/L2$ levels and routing of references.

/// Cache hierarchy assembly and reference routing.
pub mod hierarchy;
/// Text trace reader.
pub mod trace;

pub use hierarchy::CacheHierarchy;
pub use trace::MemAccess;
