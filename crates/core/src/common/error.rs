//! Error definitions for the simulator.
//!
//! The cache model itself never fails at runtime: every address, size and
//! direction is accepted. Errors only arise at the edges:
//! 1. **Configuration:** Geometry strings or JSON files describing an impossible cache.
//! 2. **Trace input:** Unreadable files or malformed access lines.

use thiserror::Error;

/// Errors raised while building a cache from its configuration.
///
/// Construction is all-or-nothing: when one of these is returned no cache
/// object exists. Front ends treat every variant as fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The geometry string does not have the `sets:ways:linesize[:policy]` shape,
    /// or one of its numeric fields is not a positive integer.
    #[error("malformed cache configuration `{0}`")]
    Malformed(String),

    /// The set count is zero or not a power of two.
    #[error("invalid set count {0}: must be a non-zero power of two")]
    InvalidSets(usize),

    /// The associativity is zero.
    #[error("invalid way count {0}: must be at least 1")]
    InvalidWays(usize),

    /// The line size is below 8 bytes or not a power of two.
    #[error("invalid line size {0}: must be a power of two of at least 8 bytes")]
    InvalidLineSize(usize),

    /// The total size `sets × ways × line_bytes` does not fit in `usize`.
    #[error("cache geometry {sets}:{ways}:{line_bytes} is too large")]
    TooLarge {
        /// Requested set count.
        sets: usize,
        /// Requested way count.
        ways: usize,
        /// Requested line size in bytes.
        line_bytes: usize,
    },

    /// The policy field is not one of `R`, `L` or `F`.
    #[error("unknown replacement policy `{0}`: expected R, L or F")]
    UnknownPolicy(String),

    /// A JSON hierarchy description could not be decoded.
    #[error("invalid hierarchy description: {0}")]
    Json(#[from] serde_json::Error),

    /// A hierarchy description file could not be read.
    #[error("cannot read hierarchy description: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading a memory access trace.
#[derive(Debug, Error)]
pub enum TraceError {
    /// The trace source could not be read.
    #[error("cannot read trace: {0}")]
    Io(#[from] std::io::Error),

    /// A line of the trace could not be parsed.
    #[error("trace line {line}: {message}")]
    Parse {
        /// One-based line number in the trace source.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },
}
