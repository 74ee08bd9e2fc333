//! The eight field constants.
//!
//! Each constant has a defining expression; the table is rebuilt from those
//! expressions and checked against the published literals once, when the
//! table is constructed. Nothing mutates it afterwards.

use std::f64::consts::TAU;

use serde::Serialize;

use crate::constants::{DRIFT_TOLERANCE, FIELD_COUNT, UNITY_TOLERANCE};
use crate::error::{FieldError, Result};

/// Display names, index-aligned with the constant table.
pub const FIELD_NAMES: [&str; FIELD_COUNT] = [
    "identity",
    "tribonacci",
    "golden",
    "half",
    "inverse_freq",
    "frequency",
    "phase",
    "zeta",
];

/// Published values of the field constants.
pub const CANONICAL_FIELD_VALUES: [f64; FIELD_COUNT] = [
    1.0,
    1.839_286_755_214_161,
    1.618_033_988_749_895,
    0.5,
    0.159_154_943_091_895_35,
    6.283_185_307_179_586,
    0.199_611_974_784_004_15,
    0.014_134_725_141_734_694,
];

/// Index of 1/2π in the table.
pub const INVERSE_FREQ: usize = 4;
/// Index of 2π in the table.
pub const FREQUENCY: usize = 5;

/// Real root of x³ = x² + x + 1.
fn tribonacci() -> f64 {
    let root = 3.0 * 33f64.sqrt();
    (1.0 + (19.0 + root).cbrt() + (19.0 - root).cbrt()) / 3.0
}

/// Values recomputed from their definitions. `phase` and `zeta` are
/// measured quantities with no closed form, so their literal is the definition.
fn derived_values() -> [f64; FIELD_COUNT] {
    [
        1.0,
        tribonacci(),
        (1.0 + 5f64.sqrt()) / 2.0,
        0.5,
        1.0 / TAU,
        TAU,
        CANONICAL_FIELD_VALUES[6],
        CANONICAL_FIELD_VALUES[7],
    ]
}

/// Verified, immutable table of the eight field constants.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FieldConstants {
    values: [f64; FIELD_COUNT],
}

impl FieldConstants {
    /// Build the canonical table, checking every defined constant for drift
    /// against its expression before accepting it.
    pub fn canonical() -> Result<Self> {
        let derived = derived_values();
        for (i, (&published, &computed)) in CANONICAL_FIELD_VALUES
            .iter()
            .zip(derived.iter())
            .enumerate()
        {
            if (published - computed).abs() > DRIFT_TOLERANCE {
                return Err(FieldError::ConsistencyViolation(format!(
                    "constant[{i}] ({}) drifted: published {published}, derived {computed}",
                    FIELD_NAMES[i]
                )));
            }
        }
        Self::new(CANONICAL_FIELD_VALUES)
    }

    /// Accept an arbitrary table if it satisfies the field invariants.
    pub fn new(values: [f64; FIELD_COUNT]) -> Result<Self> {
        let constants = Self { values };
        constants.verify()?;
        Ok(constants)
    }

    /// Check positivity, finiteness, and the unity product of the frequency pair.
    pub fn verify(&self) -> Result<()> {
        for (i, &v) in self.values.iter().enumerate() {
            if !v.is_finite() || v <= 0.0 {
                return Err(FieldError::ConsistencyViolation(format!(
                    "constant[{i}] ({}) must be positive and finite, got {v}",
                    FIELD_NAMES[i]
                )));
            }
        }
        let unity = self.values[INVERSE_FREQ] * self.values[FREQUENCY];
        if (unity - 1.0).abs() > UNITY_TOLERANCE {
            return Err(FieldError::ConsistencyViolation(format!(
                "constant[{INVERSE_FREQ}] x constant[{FREQUENCY}] = {unity}, expected 1"
            )));
        }
        Ok(())
    }

    pub fn values(&self) -> &[f64; FIELD_COUNT] {
        &self.values
    }

    pub fn get(&self, index: usize) -> Result<f64> {
        self.values
            .get(index)
            .copied()
            .ok_or(FieldError::FieldIndexOutOfRange(index))
    }

    /// (name, value) pairs in index order.
    pub fn named(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        FIELD_NAMES.iter().copied().zip(self.values.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_table_verifies() {
        let c = FieldConstants::canonical().unwrap();
        assert_eq!(c.values(), &CANONICAL_FIELD_VALUES);
    }

    #[test]
    fn test_unity_product() {
        let c = FieldConstants::canonical().unwrap();
        let unity = c.get(INVERSE_FREQ).unwrap() * c.get(FREQUENCY).unwrap();
        assert!((unity - 1.0).abs() <= 1e-15, "unity product = {unity}");
    }

    #[test]
    fn test_tribonacci_is_root() {
        let t = tribonacci();
        let residual = t * t * t - (t * t + t + 1.0);
        assert!(residual.abs() < 1e-12, "residual {residual}");
    }

    #[test]
    fn test_broken_unity_rejected() {
        let mut values = CANONICAL_FIELD_VALUES;
        values[FREQUENCY] = 6.0;
        let err = FieldConstants::new(values).unwrap_err();
        assert!(matches!(err, FieldError::ConsistencyViolation(_)));
    }

    #[test]
    fn test_non_positive_rejected() {
        let mut values = CANONICAL_FIELD_VALUES;
        values[2] = 0.0;
        assert!(FieldConstants::new(values).is_err());
        values[2] = f64::NAN;
        assert!(FieldConstants::new(values).is_err());
    }

    #[test]
    fn test_get_out_of_range() {
        let c = FieldConstants::canonical().unwrap();
        assert_eq!(c.get(8), Err(FieldError::FieldIndexOutOfRange(8)));
    }

    #[test]
    fn test_named_pairs() {
        let c = FieldConstants::canonical().unwrap();
        let named: Vec<_> = c.named().collect();
        assert_eq!(named.len(), 8);
        assert_eq!(named[2].0, "golden");
        assert_eq!(named[3].1, 0.5);
    }
}
