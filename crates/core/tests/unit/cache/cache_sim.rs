//! Cache Simulator Tests.
//!
//! Exercises `CacheSim` on its own (no next level): hit/miss accounting, dirty
//! tracking, writeback counting, byte totals and construction errors.

use cachesim_core::cache::CacheSim;
use cachesim_core::common::error::ConfigError;
use cachesim_core::config::{CacheConfig, ReplacementPolicy};
use crate::common::mocks::random::ScriptedSource;
use rstest::rstest;
use std::io;
use std::sync::atomic::Ordering;
use std::sync::{Arc, Mutex};

/// Byte address of line `n` for 8-byte lines.
const fn line(n: u64) -> u64 {
    n * 8
}

// ══════════════════════════════════════════════════════════
// 1. Hit / miss accounting
// ══════════════════════════════════════════════════════════

#[test]
fn first_touch_misses_second_touch_hits() {
    let mut cache = CacheSim::construct("4:2:64:L", "D$").unwrap();

    cache.access(0x1000, 8, false);
    cache.access(0x1008, 8, false); // same 64-byte line

    let stats = cache.stats();
    assert_eq!(stats.read_accesses, 2);
    assert_eq!(stats.read_misses, 1);
    assert_eq!(stats.hits(), 1);
    assert!(cache.contains(0x103f));
    assert!(!cache.contains(0x1040));
}

/// Two-way LRU set: 0,1 fill, 0 hits, 2 evicts 1 (least recent), 1 misses again.
#[test]
fn lru_two_way_pattern() {
    let mut cache = CacheSim::construct("1:2:8:L", "D$").unwrap();
    for n in [0, 1, 0, 2, 1] {
        cache.access(line(n), 8, false);
    }

    assert_eq!(cache.stats().read_misses, 4);
    assert!(cache.contains(line(1)));
    assert!(cache.contains(line(2)));
    assert!(!cache.contains(line(0)));
}

/// Four ways: A B C D, A hits, E misses. LRU evicts B, FIFO evicts A.
#[rstest]
#[case::lru("1:4:8:L", 1)]
#[case::fifo("1:4:8:F", 0)]
fn hit_ordering_decides_victim(#[case] geometry: &str, #[case] evicted: u64) {
    let mut cache = CacheSim::construct(geometry, "D$").unwrap();
    for n in [0, 1, 2, 3, 0, 4] {
        cache.access(line(n), 8, false);
    }

    assert_eq!(cache.stats().read_misses, 5);
    assert!(!cache.contains(line(evicted)));
    for n in (0..5).filter(|&n| n != evicted) {
        assert!(cache.contains(line(n)), "line {n} should be resident");
    }
}

#[test]
fn sets_are_independent() {
    // 2 sets, direct mapped: even lines go to set 0, odd lines to set 1.
    let mut cache = CacheSim::construct("2:1:8:L", "D$").unwrap();
    cache.access(line(0), 8, false);
    cache.access(line(1), 8, false);
    cache.access(line(0), 8, false);
    cache.access(line(1), 8, false);
    assert_eq!(cache.stats().read_misses, 2);

    cache.access(line(2), 8, false); // conflicts with line 0 only
    assert!(!cache.contains(line(0)));
    assert!(cache.contains(line(1)));
}

#[test]
fn probes_do_not_count_as_accesses() {
    let mut cache = CacheSim::construct("1:2:8:L", "D$").unwrap();
    cache.access(line(0), 8, false);

    assert!(cache.contains(line(0)));
    assert_eq!(cache.is_dirty(line(0)), Some(false));
    assert_eq!(cache.is_dirty(line(5)), None);
    assert_eq!(cache.stats().total_accesses(), 1);
    assert_eq!(cache.resident_lines(), 1);
}

// ══════════════════════════════════════════════════════════
// 2. Writes, dirty bits and writebacks
// ══════════════════════════════════════════════════════════

#[test]
fn write_hit_marks_line_dirty() {
    let mut cache = CacheSim::construct("1:2:8:L", "D$").unwrap();
    cache.access(line(0), 8, false);
    assert_eq!(cache.is_dirty(line(0)), Some(false));

    cache.access(line(0), 4, true);
    assert_eq!(cache.is_dirty(line(0)), Some(true));
    assert_eq!(cache.stats().write_misses, 0);
    assert_eq!(cache.stats().bytes_written, 4);
}

#[test]
fn write_miss_allocates_dirty_line() {
    let mut cache = CacheSim::construct("1:2:8:L", "D$").unwrap();
    cache.access(line(3), 8, true);

    assert_eq!(cache.stats().write_misses, 1);
    assert_eq!(cache.is_dirty(line(3)), Some(true));
}

#[test]
fn evicting_dirty_line_counts_writeback_without_next_level() {
    let mut cache = CacheSim::construct("1:1:8:L", "D$").unwrap();
    assert!(!cache.has_miss_handler());

    cache.access(line(0), 8, true);
    cache.access(line(1), 8, false);

    assert_eq!(cache.stats().writebacks, 1);
    assert_eq!(cache.is_dirty(line(1)), Some(false));
}

#[test]
fn evicting_clean_line_is_not_a_writeback() {
    let mut cache = CacheSim::construct("1:1:8:L", "D$").unwrap();
    cache.access(line(0), 8, false);
    cache.access(line(1), 8, false);
    assert_eq!(cache.stats().writebacks, 0);
}

#[test]
fn byte_totals_follow_request_size() {
    let mut cache = CacheSim::construct("4:2:64:R", "D$").unwrap();
    cache.access(0x0, 1, false);
    cache.access(0x0, 2, false);
    cache.access(0x0, 16, true);

    let stats = cache.stats();
    assert_eq!(stats.bytes_read, 3);
    assert_eq!(stats.bytes_written, 16);
    assert_eq!(stats.read_accesses, 2);
    assert_eq!(stats.write_accesses, 1);
}

/// Request sizes are not bounded: byte counters wrap instead of failing.
#[test]
fn byte_totals_wrap_on_huge_requests() {
    let mut cache = CacheSim::construct("4:2:64:L", "D$").unwrap();
    cache.access(0, u64::MAX, true);
    cache.access(0, u64::MAX, true);
    assert_eq!(cache.stats().bytes_written, u64::MAX - 1);

    cache.access(0, u64::MAX, false);
    cache.access(0, 2, false);
    assert_eq!(cache.stats().bytes_read, 1);
    assert_eq!(cache.stats().total_accesses(), 4);
    assert_eq!(cache.stats().total_misses(), 1);
}

/// Lines of `candidates` currently resident.
fn resident_of(cache: &CacheSim, candidates: std::ops::Range<u64>) -> Vec<u64> {
    candidates.filter(|&n| cache.contains(line(n))).collect()
}

/// Once a set is full, every further miss replaces exactly one resident line.
#[rstest]
#[case::lru("1:4:8:L")]
#[case::fifo("1:4:8:F")]
fn full_set_miss_evicts_exactly_one_line(#[case] geometry: &str) {
    let mut cache = CacheSim::construct(geometry, "D$").unwrap();
    for n in 0..4 {
        cache.access(line(n), 8, false);
    }
    assert_eq!(cache.resident_lines(), 4);

    for n in 4..24 {
        let before = resident_of(&cache, 0..n);
        cache.access(line(n), 8, false);
        let after = resident_of(&cache, 0..n);

        assert_eq!(cache.resident_lines(), 4);
        assert!(cache.contains(line(n)));
        assert_eq!(after.len(), before.len() - 1);
        assert!(after.iter().all(|l| before.contains(l)));
    }
}

// ══════════════════════════════════════════════════════════
// 3. Random replacement
// ══════════════════════════════════════════════════════════

/// Random replacement ignores empty ways: a fixed draw keeps hitting the same way.
#[test]
fn random_may_evict_valid_line_while_ways_are_empty() {
    let source = ScriptedSource::new(&[2]);
    let draws = source.counter();
    let config: CacheConfig = "1:4:8:R".parse().unwrap();
    let mut cache = CacheSim::with_random_source(config, "D$", Box::new(source)).unwrap();

    cache.access(line(0), 8, false);
    cache.access(line(1), 8, false);

    assert!(!cache.contains(line(0)));
    assert!(cache.contains(line(1)));
    assert_eq!(cache.resident_lines(), 1);
    assert_eq!(draws.load(Ordering::SeqCst), 2);
}

#[test]
fn random_draw_is_reduced_modulo_ways() {
    let source = ScriptedSource::new(&[5, 6]);
    let config: CacheConfig = "1:4:8:R".parse().unwrap();
    let mut cache = CacheSim::with_random_source(config, "D$", Box::new(source)).unwrap();

    cache.access(line(0), 8, false); // way 1
    cache.access(line(1), 8, false); // way 2
    assert_eq!(cache.resident_lines(), 2);
}

#[test]
fn hits_take_no_random_draw() {
    let source = ScriptedSource::new(&[0, 1, 2, 3]);
    let draws = source.counter();
    let config: CacheConfig = "1:4:8:R".parse().unwrap();
    let mut cache = CacheSim::with_random_source(config, "D$", Box::new(source)).unwrap();

    cache.access(line(0), 8, false);
    cache.access(line(0), 8, false);
    cache.access(line(0), 8, true);
    assert_eq!(draws.load(Ordering::SeqCst), 1);
}

/// After warm-up, random replacement still costs exactly one resident line per miss.
#[test]
fn random_full_set_miss_evicts_exactly_one_line() {
    let source = ScriptedSource::new(&[0, 1, 2, 3, 2, 0, 3, 1]);
    let draws = source.counter();
    let config: CacheConfig = "1:4:8:R".parse().unwrap();
    let mut cache = CacheSim::with_random_source(config, "D$", Box::new(source)).unwrap();

    for n in 0..4 {
        cache.access(line(n), 8, false);
    }
    assert_eq!(cache.resident_lines(), 4);

    for n in 4..20 {
        let before = resident_of(&cache, 0..n);
        cache.access(line(n), 8, false);
        let after = resident_of(&cache, 0..n);

        assert_eq!(cache.resident_lines(), 4);
        assert_eq!(after.len(), before.len() - 1);
        assert!(after.iter().all(|l| before.contains(l)));
    }
    assert_eq!(draws.load(Ordering::SeqCst), 20);
    assert_eq!(cache.stats().read_misses, 20);
}

/// Two caches built from the same geometry replay identically.
#[test]
fn default_generator_is_reproducible() {
    let run = || {
        let mut cache = CacheSim::construct("2:4:8:R", "D$").unwrap();
        for n in 0..200u64 {
            cache.access(line((n * 7) % 23), 8, n % 3 == 0);
        }
        *cache.stats()
    };
    assert_eq!(run(), run());
}

// ══════════════════════════════════════════════════════════
// 4. Construction
// ══════════════════════════════════════════════════════════

#[rstest]
#[case::sets_not_pow2("3:4:64:L")]
#[case::zero_sets("0:4:64:L")]
#[case::zero_ways("64:0:64:L")]
#[case::small_line("64:4:4:L")]
#[case::line_not_pow2("64:4:48:L")]
#[case::bad_policy("64:4:64:X")]
#[case::too_few_fields("64:4")]
#[case::too_many_fields("64:4:64:L:1")]
#[case::not_a_number("six:4:64")]
#[case::line_count_overflows("4611686018427387904:4:8:L")]
#[case::capacity_overflows("1:2:9223372036854775808:L")]
fn bad_geometry_builds_nothing(#[case] geometry: &str) {
    assert!(CacheSim::construct(geometry, "D$").is_err());
}

#[test]
fn construct_reports_specific_error() {
    assert!(matches!(
        CacheSim::construct("64:4:48:L", "D$"),
        Err(ConfigError::InvalidLineSize(48))
    ));
    assert!(matches!(
        CacheSim::construct("64:4:64:Q", "D$"),
        Err(ConfigError::UnknownPolicy(p)) if p == "Q"
    ));
    assert!(matches!(
        CacheSim::construct("4611686018427387904:4:8:L", "D$"),
        Err(ConfigError::TooLarge { ways: 4, line_bytes: 8, .. })
    ));
    assert!(matches!(
        CacheSim::fully_associative(usize::MAX, 64, ReplacementPolicy::Lru, "F$"),
        Err(ConfigError::TooLarge { sets: 1, .. })
    ));
}

#[test]
fn store_is_chosen_from_geometry() {
    let small = CacheSim::construct("1:4:64:L", "a").unwrap();
    let large = CacheSim::construct("1:8:64:L", "b").unwrap();
    let many_sets = CacheSim::construct("2:8:64:L", "c").unwrap();
    assert!(!small.is_fully_associative());
    assert!(large.is_fully_associative());
    assert!(!many_sets.is_fully_associative());

    let forced_array = CacheSim::set_associative("1:8:64:L".parse().unwrap(), "d").unwrap();
    let forced_map = CacheSim::fully_associative(2, 64, ReplacementPolicy::Fifo, "e").unwrap();
    assert!(!forced_array.is_fully_associative());
    assert!(forced_map.is_fully_associative());
    assert_eq!(forced_map.config().to_string(), "1:2:64:F");
}

#[test]
fn report_is_empty_until_first_access() {
    let mut cache = CacheSim::construct("1:2:8:L", "L2$").unwrap();
    assert_eq!(cache.report(), None);

    cache.access(0, 8, false);
    let report = cache.report().unwrap();
    assert!(report.lines().all(|l| l.starts_with("L2$ ")));
    assert!(report.contains("Miss Rate:             100.000%"));
}

#[test]
fn extreme_addresses_are_accepted() {
    let mut cache = CacheSim::construct("4:2:64:L", "D$").unwrap();
    cache.access(0, 8, true);
    cache.access(u64::MAX, 8, true);
    cache.access(u64::MAX - 63, 8, false);

    assert!(cache.contains(u64::MAX));
    assert_eq!(cache.stats().total_misses(), 2);
}

// ══════════════════════════════════════════════════════════
// 5. Miss logging
// ══════════════════════════════════════════════════════════

#[derive(Clone, Default)]
struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn capture_logs(f: impl FnOnce()) -> String {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_target(false)
        .without_time()
        .with_max_level(tracing::Level::INFO)
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    buffer.contents()
}

#[test]
fn miss_log_names_cache_direction_and_address() {
    let logs = capture_logs(|| {
        let mut cache = CacheSim::construct("1:2:8:L", "D$").unwrap();
        cache.set_log(true);
        cache.access(0x40, 8, false);
        cache.access(0x40, 8, false);
        cache.access(0x88, 8, true);
    });

    let lines: Vec<&str> = logs.lines().collect();
    assert_eq!(lines.len(), 2, "one line per miss: {logs}");
    assert!(lines[0].ends_with("D$ read miss 0x40"));
    assert!(lines[1].ends_with("D$ write miss 0x88"));
}

#[test]
fn logging_does_not_change_cache_behavior() {
    let replay = |log: bool| {
        let mut cache = CacheSim::construct("2:2:16:F", "D$").unwrap();
        cache.set_log(log);
        for n in 0..64u64 {
            cache.access((n * 40) % 512, 8, n % 5 == 0);
        }
        *cache.stats()
    };

    let mut quiet = None;
    let logs = capture_logs(|| quiet = Some(replay(false)));
    assert!(logs.is_empty());
    assert_eq!(quiet, Some(replay(true)));
}
