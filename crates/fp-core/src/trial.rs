use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::budget::BudgetMeter;

/// Odd primes up to `limit` (Sieve of Eratosthenes). 2 is handled by the
/// caller with a shift.
pub fn odd_primes_up_to(limit: u32) -> Vec<u32> {
    let size = limit as usize + 1;
    let mut is_prime = vec![true; size];
    is_prime[0] = false;
    if size > 1 {
        is_prime[1] = false;
    }
    let mut i = 2usize;
    while i * i < size {
        if is_prime[i] {
            let mut j = i * i;
            while j < size {
                is_prime[j] = false;
                j += i;
            }
        }
        i += 1;
    }
    is_prime
        .iter()
        .enumerate()
        .skip(3)
        .filter(|&(_, &p)| p)
        .map(|(i, _)| i as u32)
        .collect()
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrialOutcome {
    /// Primes divided out, with multiplicity, in the order found.
    pub found: Vec<u32>,
    /// Every prime ≤ this has been divided out of the remainder.
    pub sieved_to: u64,
    pub out_of_budget: bool,
}

/// Trial division over the odd primes up to a fixed bound.
#[derive(Clone, Debug)]
pub struct TrialDivision {
    primes: Vec<u32>,
}

impl TrialDivision {
    pub fn new(bound: u32) -> Self {
        Self {
            primes: odd_primes_up_to(bound),
        }
    }

    pub fn primes(&self) -> &[u32] {
        &self.primes
    }

    /// Divide small primes out of an odd `rest` in place. One iteration per
    /// remainder test. Stops early once p² exceeds what is left, at which
    /// point every prime below p has been ruled out.
    pub fn extract(&self, rest: &mut BigUint, meter: &mut BudgetMeter) -> TrialOutcome {
        let mut outcome = TrialOutcome {
            sieved_to: 2,
            ..Default::default()
        };
        for &p in &self.primes {
            if rest.is_one() {
                break;
            }
            let square = BigUint::from(u64::from(p) * u64::from(p));
            if square > *rest {
                outcome.sieved_to = u64::from(p) - 1;
                break;
            }
            loop {
                if !meter.spend() {
                    outcome.out_of_budget = true;
                    return outcome;
                }
                let (q, r) = rest.div_rem(&BigUint::from(p));
                if !r.is_zero() {
                    break;
                }
                *rest = q;
                outcome.found.push(p);
            }
            outcome.sieved_to = u64::from(p);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::Budget;

    fn run(n: u64, budget: u64) -> (BigUint, TrialOutcome, u64) {
        let td = TrialDivision::new(251);
        let mut rest = BigUint::from(n);
        let mut meter = BudgetMeter::start(&Budget::iterations(budget));
        let outcome = td.extract(&mut rest, &mut meter);
        (rest, outcome, meter.used())
    }

    #[test]
    fn test_sieve() {
        assert_eq!(odd_primes_up_to(30), vec![3, 5, 7, 11, 13, 17, 19, 23, 29]);
        assert_eq!(odd_primes_up_to(251).len(), 53);
        assert!(odd_primes_up_to(2).is_empty());
    }

    #[test]
    fn test_seventy_seven() {
        let (rest, outcome, used) = run(77, 100);
        assert_eq!(outcome.found, vec![7]);
        assert_eq!(rest, BigUint::from(11u32));
        // 3, 5, 7 (hit), 7 again (miss); stops at 11² > 11.
        assert_eq!(used, 4);
        assert_eq!(outcome.sieved_to, 10);
    }

    #[test]
    fn test_repeated_factor() {
        // 5² > 5 stops the sweep before 5 is tried; the leftover is proven prime.
        let (rest, outcome, _) = run(3 * 3 * 3 * 5, 100);
        assert_eq!(outcome.found, vec![3, 3, 3]);
        assert_eq!(rest, BigUint::from(5u32));
        assert_eq!(outcome.sieved_to, 4);
    }

    #[test]
    fn test_out_of_budget_keeps_progress() {
        let (rest, outcome, used) = run(1_000_003 * 1_000_033, 5);
        assert!(outcome.out_of_budget);
        assert_eq!(used, 5);
        // 3, 5, 7, 11, 13 tested; nothing left for 17.
        assert_eq!(outcome.sieved_to, 13);
        assert_eq!(rest, BigUint::from(1_000_003u64 * 1_000_033));
    }

    #[test]
    fn test_full_sweep() {
        let (_, outcome, used) = run(1_000_003 * 1_000_033, 1_000);
        assert_eq!(used, 53);
        assert_eq!(outcome.sieved_to, 251);
        assert!(outcome.found.is_empty());
    }
}
