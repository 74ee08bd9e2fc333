//! Integration tests through the public `Engine` surface:
//! patterns → resonance → factorization → cache → snapshot.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Barrier, Mutex};

use approx::assert_relative_eq;
use fp_core::{
    Budget, Certainty, Engine, EngineConfig, Factorization, FieldConstants, Method, export_json,
    import_json,
};
use num_bigint::{BigInt, BigUint};
use proptest::prelude::*;

fn engine() -> Engine {
    Engine::new(EngineConfig::default()).expect("canonical engine")
}

fn big(n: u64) -> BigUint {
    BigUint::from(n)
}

fn values(r: &Factorization) -> Vec<BigUint> {
    r.values()
}

fn sorted_values(r: &Factorization) -> Vec<BigUint> {
    let mut v = r.values();
    v.sort();
    v
}

#[test]
fn forty_eight_activates_the_frequency_pair() {
    let e = engine();
    let n = BigInt::from(48);
    assert_eq!(e.active_field_indices(&n), vec![4, 5]);
    assert_relative_eq!(e.resonance(&n), 1.0, epsilon = 1e-15);
}

#[test]
fn unity_product_holds() {
    let e = engine();
    let c = e.field_constants();
    assert!((c[4] * c[5] - 1.0).abs() <= 1e-15);
    assert!(FieldConstants::canonical().is_ok());
}

#[test]
fn seventy_seven() {
    let r = engine().factorize(&big(77));
    assert_eq!(values(&r), vec![big(7), big(11)]);
    assert_eq!(r.confidence, 1.0);
    assert_eq!(r.method, Method::TrialDivision);
}

#[test]
fn one_thousand_and_one() {
    let r = engine().factorize(&big(1001));
    assert_eq!(values(&r), vec![big(7), big(11), big(13)]);
    assert_eq!(r.confidence, 1.0);
}

#[test]
fn ten_thousand_and_one() {
    let r = engine().factorize(&big(10_001));
    assert_eq!(values(&r), vec![big(73), big(137)]);
    assert_eq!(r.iterations, 21);
}

#[test]
fn prime_above_the_trial_bound() {
    let r = engine().factorize(&big(100_003));
    assert_eq!(values(&r), vec![big(100_003)]);
    assert!(r.confidence > 0.8);
    assert!(matches!(r.method, Method::Prime | Method::ProbablePrime));
}

#[test]
fn close_factors_found_by_residue_lookup() {
    let r = engine().factorize(&big(10_007 * 10_009));
    assert_eq!(values(&r), vec![big(10_007), big(10_009)]);
    assert_eq!(r.method, Method::ResidueLookup);
    assert!(r.is_exact());
}

#[test]
fn unbalanced_semiprime_split_by_rho() {
    let r = engine().factorize_with_budget(&big(65_537 * 2_147_483_647), Budget::iterations(5_000));
    assert_eq!(sorted_values(&r), vec![big(65_537), big(2_147_483_647)]);
    assert!(r.confidence > 0.8);
    let small = r.factors.iter().find(|f| f.value == big(65_537)).unwrap();
    assert_eq!(small.method, Method::PollardRho);
    assert_eq!(small.certainty, Certainty::Proven);
}

#[test]
fn large_semiprime_under_small_budget_degrades() {
    // (2^31 − 1)(2^61 − 1): 92 bits, no factor below 2^31.
    let p = (BigUint::from(1u32) << 31u32) - 1u32;
    let q = (BigUint::from(1u32) << 61u32) - 1u32;
    let n = &p * &q;
    let r = engine().factorize(&n);
    assert_eq!(r.method, Method::HeuristicIncomplete);
    assert!(r.confidence < 1.0);
    assert_eq!(r.product(), n);
    assert!(r.iterations <= 100);
}

#[test]
fn deadline_bounds_work() {
    let p = (BigUint::from(1u32) << 61u32) - 1u32;
    let n = &p * &p * 3u32 + 2u32;
    let budget = Budget::iterations(u64::MAX).with_deadline(std::time::Duration::from_millis(20));
    let start = std::time::Instant::now();
    let r = engine().factorize_uncached(&n, budget);
    assert!(start.elapsed() < std::time::Duration::from_secs(5));
    assert_eq!(r.product(), n);
}

#[test]
fn cache_returns_identical_result_until_cleared() {
    let e = engine();
    let n = big(999_983 * 3);
    let a = e.factorize(&n);
    let b = e.factorize(&n);
    assert!(Arc::ptr_eq(&a, &b));
    e.clear_cache();
    let c = e.factorize(&n);
    assert!(!Arc::ptr_eq(&a, &c));
    assert_eq!(c.product(), n);
    assert_eq!(a.values(), c.values());
}

#[test]
fn concurrent_requests_share_one_computation() {
    let e = engine();
    let n = big(1_000_003 * 1_000_033);
    let budget = Budget::iterations(1_000);
    let barrier = Barrier::new(16);
    let results = Mutex::new(Vec::new());
    std::thread::scope(|s| {
        for _ in 0..16 {
            s.spawn(|| {
                barrier.wait();
                let r = e.factorize_with_budget(&n, budget);
                results.lock().unwrap().push(r);
            });
        }
    });
    let results = results.into_inner().unwrap();
    assert_eq!(results.len(), 16);
    assert!(results.iter().all(|r| Arc::ptr_eq(r, &results[0])));
    let stats = e.cache_stats();
    assert_eq!(stats.misses, 1);
    assert_eq!(stats.hits + stats.joined, 15);
}

#[test]
fn single_flight_through_the_cache() {
    let cache = fp_core::FactorCache::new();
    let e = engine();
    let n = big(221);
    let calls = AtomicUsize::new(0);
    std::thread::scope(|s| {
        for _ in 0..8 {
            s.spawn(|| {
                cache.compute_or_fetch(&n, |_| true, || {
                    calls.fetch_add(1, Ordering::SeqCst);
                    std::thread::sleep(std::time::Duration::from_millis(20));
                    e.factorize_uncached(&n, Budget::default())
                })
            });
        }
    });
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(cache.get(&n).unwrap().values(), vec![big(13), big(17)]);
}

#[test]
fn snapshot_restores_into_a_fresh_engine() {
    let e = engine();
    let results: Vec<Factorization> = [77u64, 1001, 10_001]
        .iter()
        .map(|&n| (*e.factorize(&big(n))).clone())
        .collect();
    let json = export_json(&results).unwrap();
    let restored = import_json(&json).unwrap();
    assert_eq!(restored, results);

    let fresh = engine();
    assert_eq!(fresh.warm(restored), 3);
    let hit = fresh.factorize(&big(1001));
    assert_eq!(fresh.cache_stats().hits, 1);
    assert_eq!(hit.values(), vec![big(7), big(11), big(13)]);
}

proptest! {
    #[test]
    fn pattern_and_resonance_are_periodic(n in any::<i64>(), k in 0u64..1_000_000) {
        let e = engine();
        let a = BigInt::from(n);
        let b = a.magnitude() + BigUint::from(k) * 256u32;
        let b = BigInt::from(b);
        prop_assert_eq!(e.field_pattern(&a), e.field_pattern(&b));
        prop_assert_eq!(e.resonance(&a).to_bits(), e.resonance(&b).to_bits());
    }

    #[test]
    fn byte_round_trip(b in 0i64..256) {
        let p = fp_core::from_byte(b).unwrap();
        prop_assert_eq!(fp_core::to_byte(&p.bits()).unwrap() as i64, b);
    }

    #[test]
    fn factor_product_always_equals_n(n in 0u64..u64::MAX, budget in 0u64..400) {
        let e = engine();
        let n = big(n);
        let r = e.factorize_uncached(&n, Budget::iterations(budget));
        prop_assert_eq!(r.product(), n);
        prop_assert!(r.iterations <= budget);
        if r.confidence == 1.0 {
            prop_assert!(r.is_exact());
        }
    }
}
