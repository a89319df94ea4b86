//! Cache Replacement Policy Tests.
//!
//! Drives `LruPolicy`, `FifoPolicy` and `RandomPolicy` directly through the
//! `ReplacementPolicy` trait, the same call sequence the cache uses: `tick`,
//! then `update` on a hit or `get_victim` + `install` on a miss.

use cachesim_core::cache::CacheLine;
use cachesim_core::cache::policies::{
    self, FifoPolicy, Lfsr, LruPolicy, RandomPolicy, RandomSource, ReplacementPolicy,
};
use cachesim_core::config::ReplacementPolicy as PolicyType;
use crate::common::mocks::random::ScriptedSource;

fn full_set(ways: usize) -> Vec<CacheLine> {
    (0..ways as u64).map(CacheLine::resident).collect()
}

/// Installs one line per way in order, ticking once per install.
fn fill(policy: &mut dyn ReplacementPolicy, set: usize, ways: usize) {
    for way in 0..ways {
        policy.tick();
        policy.install(set, way);
    }
}

// ══════════════════════════════════════════════════════════
// 1. LRU Policy
// ══════════════════════════════════════════════════════════

#[test]
fn lru_prefers_first_empty_way() {
    let mut policy = LruPolicy::new(1, 4);
    let mut lines = vec![CacheLine::default(); 4];
    lines[0] = CacheLine::resident(7);
    lines[2] = CacheLine::resident(9);

    assert_eq!(policy.get_victim(0, &lines), 1);
}

#[test]
fn lru_evicts_oldest_touch() {
    let mut policy = LruPolicy::new(1, 4);
    fill(&mut policy, 0, 4);
    assert_eq!(policy.get_victim(0, &full_set(4)), 0);

    policy.tick();
    policy.update(0, 0);
    assert_eq!(policy.get_victim(0, &full_set(4)), 1);

    policy.tick();
    policy.update(0, 1);
    assert_eq!(policy.get_victim(0, &full_set(4)), 2);
}

#[test]
fn lru_stamps_follow_clock() {
    let mut policy = LruPolicy::new(2, 2);
    policy.tick();
    policy.install(1, 1);
    policy.tick();
    policy.tick();
    policy.update(1, 1);

    assert_eq!(policy.clock(), 3);
    assert_eq!(policy.stamp(1, 1), 3);
    assert_eq!(policy.stamp(0, 1), 0);
}

#[test]
fn lru_ties_go_to_lowest_way() {
    let mut policy = LruPolicy::new(1, 4);
    // Never ticked: every stamp is zero.
    assert_eq!(policy.get_victim(0, &full_set(4)), 0);
}

#[test]
fn lru_sets_are_tracked_separately() {
    let mut policy = LruPolicy::new(2, 2);
    fill(&mut policy, 0, 2);
    fill(&mut policy, 1, 2);
    policy.tick();
    policy.update(1, 0);

    assert_eq!(policy.get_victim(0, &full_set(2)), 0);
    assert_eq!(policy.get_victim(1, &full_set(2)), 1);
}

// ══════════════════════════════════════════════════════════
// 2. FIFO Policy
// ══════════════════════════════════════════════════════════

#[test]
fn fifo_ignores_hits() {
    let mut policy = FifoPolicy::new(1, 4);
    fill(&mut policy, 0, 4);

    for _ in 0..3 {
        policy.tick();
        policy.update(0, 0);
    }
    assert_eq!(policy.get_victim(0, &full_set(4)), 0);
    assert_eq!(policy.stamp(0, 0), 1);
}

#[test]
fn fifo_cycles_through_ways() {
    let mut policy = FifoPolicy::new(1, 3);
    fill(&mut policy, 0, 3);
    let lines = full_set(3);

    let mut victims = Vec::new();
    for _ in 0..6 {
        policy.tick();
        let way = policy.get_victim(0, &lines);
        policy.install(0, way);
        victims.push(way);
    }
    assert_eq!(victims, vec![0, 1, 2, 0, 1, 2]);
}

#[test]
fn fifo_prefers_first_empty_way() {
    let mut policy = FifoPolicy::new(1, 2);
    let lines = vec![CacheLine::resident(1), CacheLine::default()];
    assert_eq!(policy.get_victim(0, &lines), 1);
}

// ══════════════════════════════════════════════════════════
// 3. Random Policy
// ══════════════════════════════════════════════════════════

#[test]
fn lfsr_sequence_from_seed_one() {
    let mut lfsr = Lfsr::default();
    let draws: Vec<u32> = (0..4).map(|_| lfsr.next_u32()).collect();
    assert_eq!(draws, vec![0xd000_0001, 0xb800_0001, 0x8c00_0001, 0x9600_0001]);
}

#[test]
fn lfsr_zero_seed_is_replaced() {
    assert_eq!(Lfsr::with_seed(0), Lfsr::with_seed(1));
}

#[test]
fn lfsr_never_yields_zero() {
    let mut lfsr = Lfsr::default();
    assert!((0..10_000).all(|_| lfsr.next_u32() != 0));
}

#[test]
fn random_victim_stays_in_range() {
    let mut policy = RandomPolicy::new(3);
    let lines = full_set(3);
    for _ in 0..1000 {
        assert!(policy.get_victim(0, &lines) < 3);
    }
}

#[test]
fn random_uses_injected_source() {
    let mut policy = RandomPolicy::with_source(4, Box::new(ScriptedSource::new(&[7, 4, 1])));
    let empty = vec![CacheLine::default(); 4];
    let victims: Vec<usize> = (0..3).map(|_| policy.get_victim(0, &empty)).collect();
    assert_eq!(victims, vec![3, 0, 1]);
}

// ══════════════════════════════════════════════════════════
// 4. Factory
// ══════════════════════════════════════════════════════════

#[test]
fn build_returns_requested_kind() {
    for kind in [PolicyType::Random, PolicyType::Lru, PolicyType::Fifo] {
        let policy = policies::build(kind, 4, 2, Box::new(Lfsr::default()));
        assert_eq!(policy.kind(), kind);
    }
}
