//! Configuration system for the cache simulator.
//!
//! This module defines the configuration structures used to parameterize the
//! simulator. It provides:
//! 1. **Defaults:** Baseline constants (minimum line size, fully-associative threshold).
//! 2. **Geometry:** `CacheConfig`, parsed from `sets:ways:linesize[:policy]` strings.
//! 3. **Hierarchy:** `HierarchyConfig`, describing the I$/D$/L2$ levels, loadable from JSON.
//!
//! Every constructor path validates the geometry, so a `CacheConfig` obtained from
//! parsing or deserialization always satisfies the power-of-two invariants.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::common::error::ConfigError;

/// Default configuration constants for the simulator.
pub mod defaults {
    /// Smallest legal line size in bytes.
    pub const MIN_LINE_BYTES: usize = 8;

    /// Single-set caches with more ways than this use the map-backed tag store.
    ///
    /// Chosen empirically: below it, scanning the ways is cheaper than hashing.
    pub const FULLY_ASSOCIATIVE_WAYS: usize = 4;

    /// Access size assumed for trace lines that omit one.
    pub const ACCESS_BYTES: u64 = 8;
}

/// Usage guidance printed by front ends when a cache configuration is rejected.
pub const CONFIG_HELP: &str = "\
Cache configurations must be of the form
  sets:ways:blocksize[:policy]
where sets, ways, and blocksize are positive integers, with
sets and blocksize both powers of two and blocksize at least 8.
policy is R (random, the default), L (LRU) or F (FIFO).";

/// Cache replacement policy algorithms.
///
/// Specifies the algorithm used to select which cache line to evict
/// when a new line must be installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "PascalCase")]
pub enum ReplacementPolicy {
    /// Random replacement.
    ///
    /// Evicts a uniformly drawn way, whether or not it currently holds a line.
    #[default]
    #[serde(alias = "R", alias = "RANDOM", alias = "random")]
    Random,
    /// Least Recently Used replacement.
    ///
    /// Fills empty ways first, then evicts the line touched longest ago.
    #[serde(alias = "L", alias = "LRU", alias = "lru")]
    Lru,
    /// First In First Out replacement.
    ///
    /// Fills empty ways first, then evicts the line installed longest ago.
    #[serde(alias = "F", alias = "FIFO", alias = "fifo")]
    Fifo,
}

impl ReplacementPolicy {
    /// Returns the single-letter code used in geometry strings.
    pub const fn code(self) -> char {
        match self {
            Self::Random => 'R',
            Self::Lru => 'L',
            Self::Fifo => 'F',
        }
    }

    /// Returns `true` if the policy keeps per-way timestamps.
    pub const fn is_stamped(self) -> bool {
        matches!(self, Self::Lru | Self::Fifo)
    }
}

impl FromStr for ReplacementPolicy {
    type Err = ConfigError;

    /// Parses a policy code (`R`, `L`, `F`) or name (`random`, `lru`, `fifo`),
    /// ignoring case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "R" | "RANDOM" => Ok(Self::Random),
            "L" | "LRU" => Ok(Self::Lru),
            "F" | "FIFO" => Ok(Self::Fifo),
            _ => Err(ConfigError::UnknownPolicy(s.to_string())),
        }
    }
}

impl fmt::Display for ReplacementPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Random => "Random",
            Self::Lru => "LRU",
            Self::Fifo => "FIFO",
        };
        f.write_str(name)
    }
}

/// Geometry and policy of a single cache level.
///
/// # Examples
///
/// ```
/// use cachesim_core::config::{CacheConfig, ReplacementPolicy};
///
/// let config: CacheConfig = "64:4:64:L".parse().unwrap();
/// assert_eq!(config.sets, 64);
/// assert_eq!(config.ways, 4);
/// assert_eq!(config.line_bytes, 64);
/// assert_eq!(config.policy, ReplacementPolicy::Lru);
/// assert_eq!(config.capacity_bytes(), 16384);
/// ```
///
/// In a JSON hierarchy description a level may be given either as a geometry
/// string or as an object:
///
/// ```
/// use cachesim_core::config::{CacheConfig, ReplacementPolicy};
///
/// let a: CacheConfig = serde_json::from_str(r#""1:8:64:F""#).unwrap();
/// let b: CacheConfig = serde_json::from_str(
///     r#"{ "sets": 1, "ways": 8, "line_bytes": 64, "policy": "Fifo" }"#,
/// ).unwrap();
/// assert_eq!(a, b);
/// assert!(a.is_fully_associative());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "CacheConfigRepr")]
pub struct CacheConfig {
    /// Number of sets (power of two).
    pub sets: usize,
    /// Associativity (lines per set).
    pub ways: usize,
    /// Line size in bytes (power of two, at least 8).
    pub line_bytes: usize,
    /// Replacement policy.
    pub policy: ReplacementPolicy,
}

impl CacheConfig {
    /// Creates and validates a cache configuration.
    ///
    /// # Errors
    ///
    /// Returns the first geometry invariant that does not hold.
    pub fn new(
        sets: usize,
        ways: usize,
        line_bytes: usize,
        policy: ReplacementPolicy,
    ) -> Result<Self, ConfigError> {
        let config = Self {
            sets,
            ways,
            line_bytes,
            policy,
        };
        config.validate()?;
        Ok(config)
    }

    /// Checks the geometry invariants.
    ///
    /// # Errors
    ///
    /// * [`ConfigError::InvalidSets`] if `sets` is zero or not a power of two.
    /// * [`ConfigError::InvalidWays`] if `ways` is zero.
    /// * [`ConfigError::InvalidLineSize`] if `line_bytes` is below 8 or not a power of two.
    /// * [`ConfigError::TooLarge`] if the capacity in bytes overflows `usize`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.sets.is_power_of_two() {
            return Err(ConfigError::InvalidSets(self.sets));
        }
        if self.ways == 0 {
            return Err(ConfigError::InvalidWays(self.ways));
        }
        if self.line_bytes < defaults::MIN_LINE_BYTES || !self.line_bytes.is_power_of_two() {
            return Err(ConfigError::InvalidLineSize(self.line_bytes));
        }
        if self
            .sets
            .checked_mul(self.ways)
            .and_then(|lines| lines.checked_mul(self.line_bytes))
            .is_none()
        {
            return Err(ConfigError::TooLarge {
                sets: self.sets,
                ways: self.ways,
                line_bytes: self.line_bytes,
            });
        }
        Ok(())
    }

    /// Returns `true` if this geometry is served by the map-backed tag store.
    pub const fn is_fully_associative(&self) -> bool {
        self.sets == 1 && self.ways > defaults::FULLY_ASSOCIATIVE_WAYS
    }

    /// Total capacity in bytes.
    pub const fn capacity_bytes(&self) -> usize {
        self.sets * self.ways * self.line_bytes
    }
}

impl FromStr for CacheConfig {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || ConfigError::Malformed(s.to_string());
        let num = |field: &str| field.trim().parse::<usize>().map_err(|_| malformed());

        let fields: Vec<&str> = s.split(':').collect();
        let (sets, ways, line_bytes, policy) = match fields.as_slice() {
            &[sets, ways, line] => (num(sets)?, num(ways)?, num(line)?, ReplacementPolicy::Random),
            &[sets, ways, line, policy] => (num(sets)?, num(ways)?, num(line)?, policy.parse()?),
            _ => return Err(malformed()),
        };
        Self::new(sets, ways, line_bytes, policy)
    }
}

impl fmt::Display for CacheConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}:{}",
            self.sets,
            self.ways,
            self.line_bytes,
            self.policy.code()
        )
    }
}

/// Wire forms accepted for a [`CacheConfig`].
#[derive(Deserialize)]
#[serde(untagged)]
enum CacheConfigRepr {
    Geometry(String),
    Fields {
        sets: usize,
        ways: usize,
        line_bytes: usize,
        #[serde(default)]
        policy: ReplacementPolicy,
    },
}

impl TryFrom<CacheConfigRepr> for CacheConfig {
    type Error = ConfigError;

    fn try_from(repr: CacheConfigRepr) -> Result<Self, Self::Error> {
        match repr {
            CacheConfigRepr::Geometry(s) => s.parse(),
            CacheConfigRepr::Fields {
                sets,
                ways,
                line_bytes,
                policy,
            } => Self::new(sets, ways, line_bytes, policy),
        }
    }
}

/// Cache hierarchy description.
///
/// Mirrors the classic `--ic`/`--dc`/`--l2` front-end options: each level is
/// optional, and when an L2 is present it serves the misses of both L1s.
///
/// ```
/// use cachesim_core::config::HierarchyConfig;
///
/// let json = r#"{
///     "icache": "64:4:64:L",
///     "dcache": { "sets": 64, "ways": 4, "line_bytes": 64, "policy": "Lru" },
///     "l2": "512:8:64:F",
///     "log_misses": true
/// }"#;
/// let config = HierarchyConfig::from_json_str(json).unwrap();
/// assert!(config.log_misses);
/// assert_eq!(config.l2.unwrap().ways, 8);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HierarchyConfig {
    /// Level-1 instruction cache (`I$`).
    #[serde(default)]
    pub icache: Option<CacheConfig>,
    /// Level-1 data cache (`D$`).
    #[serde(default)]
    pub dcache: Option<CacheConfig>,
    /// Unified level-2 cache (`L2$`).
    #[serde(default)]
    pub l2: Option<CacheConfig>,
    /// Emit a diagnostic line for every miss at every level.
    #[serde(default)]
    pub log_misses: bool,
}

impl HierarchyConfig {
    /// Decodes and validates a JSON hierarchy description.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Json`] for malformed JSON or invalid geometry.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads and validates a JSON hierarchy description from a file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, otherwise as
    /// [`HierarchyConfig::from_json_str`].
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    /// Returns `true` if no level is configured.
    pub const fn is_empty(&self) -> bool {
        self.icache.is_none() && self.dcache.is_none() && self.l2.is_none()
    }
}
