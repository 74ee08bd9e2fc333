//! Miller-Rabin primality pre-filter.
//!
//! Below [`DETERMINISTIC_LIMIT`] the 13 prime bases 2..=41 decide primality
//! exactly; above it, extra bases are drawn from an RNG seeded by n, so the
//! verdict for a given n never changes between runs. The reported confidence
//! is the standard error bound 1 − 4^−k for k rounds passed.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use crate::constants::{DETERMINISTIC_BASES, DETERMINISTIC_LIMIT};

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PrimalityVerdict {
    pub probably_prime: bool,
    pub confidence: f64,
    pub rounds: u32,
    pub evidence: Vec<String>,
}

impl PrimalityVerdict {
    fn composite(rounds: u32, evidence: String) -> Self {
        Self {
            probably_prime: false,
            confidence: 0.0,
            rounds,
            evidence: vec![evidence],
        }
    }
}

/// Highest confidence a passing test may report; 1.0 is reserved for proof.
pub const MAX_PROBABLE_CONFIDENCE: f64 = 1.0 - f64::EPSILON;

/// Error bound after k independent passing rounds, kept below 1.0 for any k.
pub fn round_confidence(rounds: u32) -> f64 {
    let exponent = i32::try_from(rounds).unwrap_or(i32::MAX);
    (1.0 - 0.25f64.powi(exponent)).min(MAX_PROBABLE_CONFIDENCE)
}

/// n − 1 = d · 2^s with d odd.
fn decompose(n_minus_1: &BigUint) -> (BigUint, u64) {
    let s = n_minus_1.trailing_zeros().unwrap_or(0);
    (n_minus_1 >> s, s)
}

fn is_witness(a: &BigUint, n: &BigUint, n_minus_1: &BigUint, d: &BigUint, s: u64) -> bool {
    let mut x = a.modpow(d, n);
    if x.is_one() || x == *n_minus_1 {
        return false;
    }
    for _ in 1..s {
        x = &x * &x % n;
        if x == *n_minus_1 {
            return false;
        }
    }
    true
}

pub fn miller_rabin(n: &BigUint, extra_rounds: u32) -> PrimalityVerdict {
    let two = BigUint::from(2u32);
    if *n < two {
        return PrimalityVerdict::composite(0, format!("{n} is neither prime nor composite"));
    }
    if *n <= BigUint::from(3u32) {
        return PrimalityVerdict {
            probably_prime: true,
            confidence: 1.0,
            rounds: 0,
            evidence: vec![format!("{n} is prime")],
        };
    }
    if n.is_even() {
        return PrimalityVerdict::composite(0, "divisible by 2".into());
    }

    let n_minus_1 = n - 1u32;
    let (d, s) = decompose(&n_minus_1);
    let mut rounds = 0u32;

    for base in DETERMINISTIC_BASES {
        let a = BigUint::from(base);
        if a >= n_minus_1 {
            break;
        }
        if is_witness(&a, n, &n_minus_1, &d, s) {
            return PrimalityVerdict::composite(rounds, format!("base {base} witnesses compositeness"));
        }
        rounds += 1;
    }

    let deterministic = *n < BigUint::from(DETERMINISTIC_LIMIT);
    if !deterministic {
        let seed = n.iter_u64_digits().next().unwrap_or(0);
        let mut rng = SmallRng::seed_from_u64(seed);
        for _ in 0..extra_rounds {
            // n exceeds 2^64 here, so 2 + u64 stays inside [2, n − 2].
            let a = BigUint::from(rng.random::<u64>()) + 2u32;
            if is_witness(&a, n, &n_minus_1, &d, s) {
                return PrimalityVerdict::composite(rounds, format!("seeded base {a} witnesses compositeness"));
            }
            rounds += 1;
        }
    }

    let mut evidence = vec![format!("passed {rounds} Miller-Rabin rounds")];
    if deterministic {
        evidence.push("bases 2..=41 are deterministic below 3.317e24".into());
    }
    PrimalityVerdict {
        probably_prime: true,
        confidence: round_confidence(rounds),
        rounds,
        evidence,
    }
}
