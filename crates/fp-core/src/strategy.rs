use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::budget::BudgetMeter;
use crate::result::Method;

/// An unresolved piece of n together with how far it is known to be free of
/// small prime factors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cofactor {
    pub value: BigUint,
    /// Largest prime known not to divide `value` (every prime ≤ this was tried).
    pub sieved_to: u64,
}

impl Cofactor {
    pub fn new(value: BigUint, sieved_to: u64) -> Self {
        Self { value, sieved_to }
    }

    /// Every composite has a prime factor ≤ √value, so a value below
    /// (sieved_to + 1)² has none left to find.
    pub fn is_proven_prime(&self) -> bool {
        let bound = BigUint::from(self.sieved_to) + 1u32;
        self.value > BigUint::one() && self.value < &bound * &bound
    }
}

/// A verified non-trivial split: `divisor · cofactor == n` with both > 1.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Split {
    pub divisor: BigUint,
    pub cofactor: BigUint,
}

impl Split {
    /// Check `d` by exact division; only a proper divisor produces a split.
    pub fn verify(n: &BigUint, d: BigUint) -> Option<Split> {
        if d <= BigUint::one() || d >= *n {
            return None;
        }
        let (q, r) = n.div_rem(&d);
        r.is_zero().then_some(Split {
            divisor: d,
            cofactor: q,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attempt {
    Split(Split),
    /// The strategy covered its whole search space without finding a divisor.
    Exhausted,
    /// The meter ran out first.
    OutOfBudget,
}

/// One divisor-finding heuristic. Every loop iteration spends from `meter`.
pub trait Strategy: Send + Sync {
    fn method(&self) -> Method;

    fn attempt(&self, cofactor: &Cofactor, meter: &mut BudgetMeter) -> Attempt;

    /// Whether `Attempt::Exhausted` proves the cofactor prime.
    fn proves_primality(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_verify() {
        let n = BigUint::from(77u32);
        let s = Split::verify(&n, BigUint::from(7u32)).unwrap();
        assert_eq!(s.cofactor, BigUint::from(11u32));
        assert!(Split::verify(&n, BigUint::from(5u32)).is_none());
        assert!(Split::verify(&n, BigUint::one()).is_none());
        assert!(Split::verify(&n, n.clone()).is_none());
    }

    #[test]
    fn test_proven_prime_bound() {
        // Sieved through 251: anything below 252² = 63504 with no factor is prime.
        assert!(Cofactor::new(BigUint::from(63_499u32), 251).is_proven_prime());
        assert!(!Cofactor::new(BigUint::from(63_504u32), 251).is_proven_prime());
        assert!(!Cofactor::new(BigUint::one(), 251).is_proven_prime());
    }
}
