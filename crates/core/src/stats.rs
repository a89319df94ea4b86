//! Cache statistics collection and reporting.
//!
//! This module tracks the per-level counters of the cache simulator. It provides:
//! 1. **Traffic:** Read/write access counts and byte totals.
//! 2. **Misses:** Read/write miss counts and the derived miss rate.
//! 3. **Writebacks:** Dirty victims evicted from the level.
//! 4. **Reporting:** The classic per-cache text report and a JSON-friendly snapshot.

use serde::Serialize;

/// Width of the label column in text reports.
const LABEL_WIDTH: usize = 23;

/// Counters owned by one cache level.
///
/// Counters wrap on overflow, like the 64-bit counters of hardware models.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Bytes requested by read accesses.
    pub bytes_read: u64,
    /// Bytes requested by write accesses.
    pub bytes_written: u64,
    /// Number of read accesses.
    pub read_accesses: u64,
    /// Number of write accesses.
    pub write_accesses: u64,
    /// Number of read accesses that missed.
    pub read_misses: u64,
    /// Number of write accesses that missed.
    pub write_misses: u64,
    /// Number of dirty lines evicted.
    pub writebacks: u64,
}

impl CacheStats {
    pub(crate) const fn record_access(&mut self, bytes: u64, is_write: bool) {
        if is_write {
            self.write_accesses = self.write_accesses.wrapping_add(1);
            self.bytes_written = self.bytes_written.wrapping_add(bytes);
        } else {
            self.read_accesses = self.read_accesses.wrapping_add(1);
            self.bytes_read = self.bytes_read.wrapping_add(bytes);
        }
    }

    pub(crate) const fn record_miss(&mut self, is_write: bool) {
        if is_write {
            self.write_misses = self.write_misses.wrapping_add(1);
        } else {
            self.read_misses = self.read_misses.wrapping_add(1);
        }
    }

    /// Total number of accesses.
    pub const fn total_accesses(&self) -> u64 {
        self.read_accesses.wrapping_add(self.write_accesses)
    }

    /// Total number of misses.
    pub const fn total_misses(&self) -> u64 {
        self.read_misses.wrapping_add(self.write_misses)
    }

    /// Total number of hits.
    pub const fn hits(&self) -> u64 {
        self.total_accesses().wrapping_sub(self.total_misses())
    }

    /// Miss rate in percent, or `None` if there were no accesses.
    pub fn miss_rate(&self) -> Option<f64> {
        let total = self.total_accesses();
        if total == 0 {
            return None;
        }
        Some(100.0 * self.total_misses() as f64 / total as f64)
    }

    /// Formats the end-of-run report, one line per counter, each prefixed by `name`.
    ///
    /// Returns `None` if there were no accesses.
    ///
    /// ```
    /// use cachesim_core::stats::CacheStats;
    ///
    /// let stats = CacheStats {
    ///     read_accesses: 3,
    ///     read_misses: 1,
    ///     bytes_read: 24,
    ///     ..CacheStats::default()
    /// };
    /// let report = stats.report("D$").unwrap();
    /// assert!(report.starts_with("D$ Bytes Read:            24\n"));
    /// assert!(report.ends_with("D$ Miss Rate:             33.333%\n"));
    /// assert_eq!(CacheStats::default().report("D$"), None);
    /// ```
    pub fn report(&self, name: &str) -> Option<String> {
        let miss_rate = self.miss_rate()?;
        let rows = [
            ("Bytes Read:", self.bytes_read.to_string()),
            ("Bytes Written:", self.bytes_written.to_string()),
            ("Read Accesses:", self.read_accesses.to_string()),
            ("Write Accesses:", self.write_accesses.to_string()),
            ("Read Misses:", self.read_misses.to_string()),
            ("Write Misses:", self.write_misses.to_string()),
            ("Writebacks:", self.writebacks.to_string()),
            ("Miss Rate:", format!("{miss_rate:.3}%")),
        ];
        Some(
            rows.iter()
                .map(|(label, value)| format!("{name} {label:<LABEL_WIDTH$}{value}\n"))
                .collect(),
        )
    }

    /// Prints the report to stdout. Prints nothing if there were no accesses.
    pub fn print(&self, name: &str) {
        if let Some(report) = self.report(name) {
            print!("{report}");
        }
    }
}

/// Named snapshot of one level's statistics, for machine-readable output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    /// Cache name (`I$`, `D$`, `L2$`, ...).
    pub name: String,
    /// Raw counters.
    #[serde(flatten)]
    pub stats: CacheStats,
    /// Miss rate in percent; `null` if the level was never accessed.
    pub miss_rate: Option<f64>,
}

impl StatsReport {
    /// Captures `stats` under `name`.
    pub fn new(name: impl Into<String>, stats: CacheStats) -> Self {
        Self {
            name: name.into(),
            miss_rate: stats.miss_rate(),
            stats,
        }
    }
}
