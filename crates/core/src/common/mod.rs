//! Common types shared across the simulator.
//!
//! This module provides:
//! 1. **Addresses:** Set/tag decomposition for a cache geometry.
//! 2. **Errors:** Configuration and trace error types.

/// Address decomposition into set index and line tag.
pub mod addr;
/// Configuration and trace error types.
pub mod error;

pub use addr::AddressDecoder;
pub use error::{ConfigError, TraceError};
