//! Vanish/emerge analysis of pattern products.
//!
//! For p = a·b, bit i *vanishes* when it is set in both a and b but not in p,
//! and *emerges* when it is clear in both but set in p. The counts are used
//! to order divisor candidates, never to accept or reject one.

use num_bigint::BigInt;
use serde::Serialize;

use crate::constants::FIELD_COUNT;
use crate::substrate::Pattern;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Interference {
    pub left: Pattern,
    pub right: Pattern,
    pub product: Pattern,
    pub vanished: Vec<usize>,
    pub emerged: Vec<usize>,
}

impl Interference {
    pub fn disruption(&self) -> usize {
        self.vanished.len() + self.emerged.len()
    }
}

pub fn interference(a: &BigInt, b: &BigInt) -> Interference {
    of_residues(Pattern::of(a).to_byte(), Pattern::of(b).to_byte())
}

/// Interference of two residues; the product pattern only depends on a·b mod 256.
pub fn of_residues(a: u8, b: u8) -> Interference {
    let p = a.wrapping_mul(b);
    let vanished_mask = a & b & !p;
    let emerged_mask = !a & !b & p;
    let bits = |mask: u8| (0..FIELD_COUNT).filter(|&i| mask >> i & 1 == 1).collect();
    Interference {
        left: Pattern::from_residue(a),
        right: Pattern::from_residue(b),
        product: Pattern::from_residue(p),
        vanished: bits(vanished_mask),
        emerged: bits(emerged_mask),
    }
}

/// Vanished + emerged bit count without allocating.
pub fn disruption(a: u8, b: u8) -> u32 {
    let p = a.wrapping_mul(b);
    ((a & b & !p) | (!a & !b & p)).count_ones()
}

/// Inverse of an odd residue modulo 256 (None for even residues).
pub fn inverse_mod_256(r: u8) -> Option<u8> {
    if r % 2 == 0 {
        return None;
    }
    // Newton iteration doubles correct low bits: r is its own inverse mod 8.
    let mut x = r;
    for _ in 0..2 {
        x = x.wrapping_mul(2u8.wrapping_sub(r.wrapping_mul(x)));
    }
    Some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seven_times_eleven() {
        // 7 = 0b111, 11 = 0b1011, 77 = 0b1001101
        let i = interference(&BigInt::from(7), &BigInt::from(11));
        assert_eq!(i.product.to_byte(), 77);
        assert_eq!(i.vanished, vec![1]);
        assert_eq!(i.emerged, vec![6]);
        assert_eq!(i.disruption(), 2);
    }

    #[test]
    fn test_product_wraps_mod_256() {
        let i = of_residues(16, 16);
        assert_eq!(i.product.to_byte(), 0);
        assert_eq!(i.vanished, vec![4]);
        assert!(i.emerged.is_empty());
    }

    #[test]
    fn test_disruption_matches_lists() {
        for a in (0..=255u8).step_by(7) {
            for b in (0..=255u8).step_by(11) {
                assert_eq!(disruption(a, b) as usize, of_residues(a, b).disruption());
            }
        }
    }

    #[test]
    fn test_inverse_mod_256() {
        for r in (1..=255u8).step_by(2) {
            let inv = inverse_mod_256(r).unwrap();
            assert_eq!(r.wrapping_mul(inv), 1, "r = {r}");
        }
        assert_eq!(inverse_mod_256(10), None);
    }
}
