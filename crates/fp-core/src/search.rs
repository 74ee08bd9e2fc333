//! Interference-guided divisor search.
//!
//! Walks candidate divisors downward from ⌊√c⌋ one page window at a time,
//! stopping above the sieved bound. Inside a window the candidates are tried
//! in order of least pattern disruption between d and its partner c/d (known
//! mod 256 as c · d⁻¹), larger d first on ties. The ordering only changes
//! which candidate is reached first; every candidate in range is tried, so an
//! exhausted walk proves c prime.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::Zero;

use crate::budget::BudgetMeter;
use crate::interference::{disruption, inverse_mod_256};
use crate::page::PageIndex;
use crate::result::Method;
use crate::strategy::{Attempt, Cofactor, Split, Strategy};
use crate::substrate::residue;

#[derive(Clone, Copy, Debug, Default)]
pub struct InterferenceSearch {
    pages: PageIndex,
}

impl InterferenceSearch {
    pub fn new(pages: PageIndex) -> Self {
        Self { pages }
    }

    /// Candidates in `[lo, hi]`, in trial order.
    fn window(&self, lo: &BigUint, hi: &BigUint, c_res: u8, sieved_to: u64) -> Vec<BigUint> {
        let mut keyed = Vec::new();
        let mut d = lo.clone();
        while d <= *hi {
            let skip = (sieved_to >= 2 && d.is_even())
                || (sieved_to >= 3 && (&d % 3u32).is_zero());
            if !skip {
                let d_res = residue(&d);
                let partner = inverse_mod_256(d_res)
                    .map(|inv| c_res.wrapping_mul(inv))
                    .unwrap_or(0);
                keyed.push((disruption(d_res, partner), d.clone()));
            }
            d += 1u32;
        }
        keyed.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| b.1.cmp(&a.1)));
        keyed.into_iter().map(|(_, d)| d).collect()
    }
}

impl Strategy for InterferenceSearch {
    fn method(&self) -> Method {
        Method::InterferenceSearch
    }

    fn proves_primality(&self) -> bool {
        true
    }

    fn attempt(&self, cofactor: &Cofactor, meter: &mut BudgetMeter) -> Attempt {
        let c = &cofactor.value;
        let floor = BigUint::from(cofactor.sieved_to) + 1u32;
        let top = c.sqrt();
        if top < floor {
            return Attempt::Exhausted;
        }
        let c_res = residue(c);
        let mut page = self.pages.locate(&top).page;
        loop {
            let (start, end) = self.pages.bounds(&page);
            let lo = (&start).max(&floor);
            let hi = (&end).min(&top);
            for d in self.window(lo, hi, c_res, cofactor.sieved_to) {
                if !meter.spend() {
                    return Attempt::OutOfBudget;
                }
                if let Some(split) = Split::verify(c, d) {
                    return Attempt::Split(split);
                }
            }
            if start <= floor {
                return Attempt::Exhausted;
            }
            page -= 1u32;
        }
    }
}
