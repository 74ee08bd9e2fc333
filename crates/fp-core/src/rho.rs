//! Bounded Pollard rho, Brent's variant with batched gcd.
//!
//! Seeds are deterministic (c = 1, 2, 3, … with x₀ = 2) so a given budget
//! always produces the same result. Each polynomial step costs one iteration.

use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::One;

use crate::budget::BudgetMeter;
use crate::result::Method;
use crate::strategy::{Attempt, Cofactor, Split, Strategy};

/// Differences multiplied together between gcd checks.
const BATCH: u64 = 16;

#[derive(Clone, Copy, Debug, Default)]
pub struct PollardRho;

fn abs_diff(a: &BigUint, b: &BigUint) -> BigUint {
    if a > b { a - b } else { b - a }
}

enum Walk {
    Divisor(BigUint),
    Cycled,
    OutOfBudget,
}

/// One Brent walk of y ↦ y² + c mod n.
fn brent(n: &BigUint, c: &BigUint, meter: &mut BudgetMeter) -> Walk {
    let step = |y: &BigUint| (y * y + c) % n;
    let one = BigUint::one();

    let mut y = BigUint::from(2u32);
    let mut x = y.clone();
    let mut ys = y.clone();
    let mut q = one.clone();
    let mut g = one.clone();
    let mut r: u64 = 1;

    while g.is_one() {
        x = y.clone();
        for _ in 0..r {
            if !meter.spend() {
                return Walk::OutOfBudget;
            }
            y = step(&y);
        }
        let mut k = 0;
        while k < r && g.is_one() {
            ys = y.clone();
            for _ in 0..BATCH.min(r - k) {
                if !meter.spend() {
                    return Walk::OutOfBudget;
                }
                y = step(&y);
                q = q * abs_diff(&x, &y) % n;
            }
            g = q.gcd(n);
            k += BATCH;
        }
        r *= 2;
    }

    if g == *n {
        // The batch overshot; replay it one step at a time.
        loop {
            if !meter.spend() {
                return Walk::OutOfBudget;
            }
            ys = step(&ys);
            g = abs_diff(&x, &ys).gcd(n);
            if !g.is_one() {
                break;
            }
        }
    }

    if g == *n {
        Walk::Cycled
    } else {
        Walk::Divisor(g)
    }
}

impl Strategy for PollardRho {
    fn method(&self) -> Method {
        Method::PollardRho
    }

    fn attempt(&self, cofactor: &Cofactor, meter: &mut BudgetMeter) -> Attempt {
        let n = &cofactor.value;
        if *n <= BigUint::from(3u32) {
            return Attempt::Exhausted;
        }
        for seed in 1u64.. {
            match brent(n, &BigUint::from(seed), meter) {
                Walk::Divisor(d) => {
                    if let Some(split) = Split::verify(n, d) {
                        return Attempt::Split(split);
                    }
                }
                Walk::Cycled => continue,
                Walk::OutOfBudget => return Attempt::OutOfBudget,
            }
        }
        Attempt::OutOfBudget
    }
}
