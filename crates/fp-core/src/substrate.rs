//! Field substrate: integer → 8-bit activation pattern.
//!
//! Bit i of the pattern is bit i of (|n| mod 256), so the pattern has period
//! 256 and the all-false pattern belongs to every multiple of 256.

use std::fmt;

use num_bigint::{BigInt, BigUint};
use serde::{Deserialize, Serialize};

use crate::constants::FIELD_COUNT;
use crate::error::{FieldError, Result};

/// Residue byte of n: n mod 256.
pub fn residue(n: &BigUint) -> u8 {
    n.iter_u64_digits().next().unwrap_or(0) as u8
}

/// Activation pattern of an integer. Stored as its residue byte.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pattern(u8);

impl Pattern {
    /// Pattern of n, normalized by absolute value.
    pub fn of(n: &BigInt) -> Self {
        Self(residue(n.magnitude()))
    }

    pub fn of_unsigned(n: &BigUint) -> Self {
        Self(residue(n))
    }

    pub const fn from_residue(residue: u8) -> Self {
        Self(residue)
    }

    pub fn bits(self) -> [bool; FIELD_COUNT] {
        std::array::from_fn(|i| self.0 >> i & 1 == 1)
    }

    pub fn to_byte(self) -> u8 {
        self.0
    }

    /// Indices of the set bits, ascending.
    pub fn active_indices(self) -> Vec<usize> {
        (0..FIELD_COUNT).filter(|&i| self.0 >> i & 1 == 1).collect()
    }

    pub fn is_active(self, index: usize) -> Result<bool> {
        if index >= FIELD_COUNT {
            return Err(FieldError::FieldIndexOutOfRange(index));
        }
        Ok(self.0 >> index & 1 == 1)
    }

    pub fn count_active(self) -> u32 {
        self.0.count_ones()
    }
}

impl From<u8> for Pattern {
    fn from(byte: u8) -> Self {
        Self(byte)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0b{:08b}", self.0)
    }
}

pub fn pattern(n: &BigInt) -> Pattern {
    Pattern::of(n)
}

pub fn active_indices(n: &BigInt) -> Vec<usize> {
    Pattern::of(n).active_indices()
}

pub fn is_active(n: &BigInt, index: usize) -> Result<bool> {
    Pattern::of(n).is_active(index)
}

/// Pack exactly eight booleans (bit 0 first) into a byte.
pub fn to_byte(bits: &[bool]) -> Result<u8> {
    if bits.len() != FIELD_COUNT {
        return Err(FieldError::PatternLength(bits.len()));
    }
    Ok(bits
        .iter()
        .enumerate()
        .fold(0u8, |acc, (i, &b)| acc | (u8::from(b) << i)))
}

pub fn from_byte(byte: i64) -> Result<Pattern> {
    u8::try_from(byte)
        .map(Pattern)
        .map_err(|_| FieldError::ByteOutOfRange(byte))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(n: i64) -> BigInt {
        BigInt::from(n)
    }

    #[test]
    fn test_zero_is_all_false() {
        let p = pattern(&big(0));
        assert_eq!(p.bits(), [false; 8]);
        assert!(active_indices(&big(0)).is_empty());
    }

    #[test]
    fn test_forty_eight() {
        // 48 = 0b0011_0000
        assert_eq!(active_indices(&big(48)), vec![4, 5]);
        assert_eq!(pattern(&big(48)).to_string(), "0b00110000");
    }

    #[test]
    fn test_negative_uses_absolute_value() {
        assert_eq!(pattern(&big(-77)), pattern(&big(77)));
    }

    #[test]
    fn test_periodicity_large() {
        let n: BigInt = "123456789012345678901234567890".parse().unwrap();
        let shifted = &n + BigInt::from(256) * BigInt::from(1_000_003u64);
        assert_eq!(pattern(&n), pattern(&shifted));
    }

    #[test]
    fn test_byte_round_trip_all() {
        for b in 0..=255i64 {
            let p = from_byte(b).unwrap();
            assert_eq!(to_byte(&p.bits()).unwrap() as i64, b);
        }
    }

    #[test]
    fn test_from_byte_out_of_range() {
        assert_eq!(from_byte(256), Err(FieldError::ByteOutOfRange(256)));
        assert_eq!(from_byte(-1), Err(FieldError::ByteOutOfRange(-1)));
    }

    #[test]
    fn test_to_byte_wrong_length() {
        assert_eq!(to_byte(&[true; 7]), Err(FieldError::PatternLength(7)));
        assert_eq!(to_byte(&[]), Err(FieldError::PatternLength(0)));
    }

    #[test]
    fn test_is_active_bounds() {
        assert!(is_active(&big(1), 0).unwrap());
        assert!(!is_active(&big(1), 7).unwrap());
        assert_eq!(
            is_active(&big(1), 8),
            Err(FieldError::FieldIndexOutOfRange(8))
        );
    }

    #[test]
    fn test_residue_of_multi_limb() {
        let n = (BigUint::from(1u8) << 130) + BigUint::from(0x1_2345u32);
        assert_eq!(residue(&n), 0x45);
        assert_eq!(Pattern::of_unsigned(&n).count_active(), 3);
    }
}
