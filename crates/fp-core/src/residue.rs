//! Residue-pattern lookup: a Fermat walk filtered by the square residues mod 256.
//!
//! c = x² − y² = (x − y)(x + y). Starting at x = ⌈√c⌉, x² − c is only tested
//! for squareness when its residue byte can be the residue of a square; 44 of
//! the 256 residues qualify, so most steps cost one table lookup.

use num_bigint::BigUint;

use crate::budget::BudgetMeter;
use crate::result::Method;
use crate::strategy::{Attempt, Cofactor, Split, Strategy};
use crate::substrate::residue;

const fn square_residues() -> [bool; 256] {
    let mut table = [false; 256];
    let mut x = 0usize;
    while x < 256 {
        table[(x * x) % 256] = true;
        x += 1;
    }
    table
}

pub const SQUARE_RESIDUES: [bool; 256] = square_residues();

fn exact_sqrt(n: &BigUint) -> Option<BigUint> {
    let root = n.sqrt();
    (&root * &root == *n).then_some(root)
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ResidueLookup;

impl Strategy for ResidueLookup {
    fn method(&self) -> Method {
        Method::ResidueLookup
    }

    fn attempt(&self, cofactor: &Cofactor, meter: &mut BudgetMeter) -> Attempt {
        let c = &cofactor.value;
        let mut x = c.sqrt();
        if &x * &x < *c {
            x += 1u32;
        }
        // x = (c + 1) / 2 only yields the trivial split 1 · c.
        let last = (c + 1u32) >> 1u32;
        let mut r = &x * &x - c;
        while x < last {
            if !meter.spend() {
                return Attempt::OutOfBudget;
            }
            if SQUARE_RESIDUES[residue(&r) as usize]
                && let Some(y) = exact_sqrt(&r)
                && let Some(split) = Split::verify(c, &x - &y)
            {
                return Attempt::Split(split);
            }
            // (x + 1)² − c = r + 2x + 1
            r += &x << 1u32;
            r += 1u32;
            x += 1u32;
        }
        Attempt::Exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::budget::Budget;

    fn attempt(n: u64, budget: u64) -> Attempt {
        let mut meter = BudgetMeter::start(&Budget::iterations(budget));
        ResidueLookup.attempt(&Cofactor::new(BigUint::from(n), 251), &mut meter)
    }

    #[test]
    fn test_square_residue_count() {
        assert_eq!(SQUARE_RESIDUES.iter().filter(|&&b| b).count(), 44);
        assert!(SQUARE_RESIDUES[0] && SQUARE_RESIDUES[1] && SQUARE_RESIDUES[4]);
        assert!(!SQUARE_RESIDUES[2] && !SQUARE_RESIDUES[3]);
    }

    #[test]
    fn test_close_factors_split_immediately() {
        match attempt(10_007 * 10_009, 1) {
            Attempt::Split(s) => {
                assert_eq!(s.divisor, BigUint::from(10_007u32));
                assert_eq!(s.cofactor, BigUint::from(10_009u32));
            }
            other => panic!("expected split, got {other:?}"),
        }
    }

    #[test]
    fn test_budget_bounds_walk() {
        // Factors far apart: the walk needs far more than 10 steps.
        assert_eq!(attempt(257 * 1_000_003, 10), Attempt::OutOfBudget);
    }

    #[test]
    fn test_prime_exhausts() {
        // x walks [11, 51) without meeting a square.
        assert_eq!(attempt(101, 1_000), Attempt::Exhausted);
    }
}
