use std::sync::Arc;

use num_bigint::BigInt;

use crate::constants::PATTERN_PERIOD;
use crate::field::FieldConstants;
use crate::substrate::Pattern;

/// Resonance of every residue, precomputed from a verified constant table.
///
/// resonance(n) = ∏ constant[i] over the active indices of pattern(n); the
/// empty product is 1.
#[derive(Clone, Debug)]
pub struct Resonance {
    constants: Arc<FieldConstants>,
    table: Box<[f64; PATTERN_PERIOD as usize]>,
}

impl Resonance {
    pub fn new(constants: Arc<FieldConstants>) -> Self {
        let values = constants.values();
        let table = Box::new(std::array::from_fn(|r| {
            Pattern::from_residue(r as u8)
                .active_indices()
                .into_iter()
                .map(|i| values[i])
                .product::<f64>()
        }));
        Self { constants, table }
    }

    pub fn of(&self, n: &BigInt) -> f64 {
        self.of_pattern(Pattern::of(n))
    }

    pub fn of_pattern(&self, pattern: Pattern) -> f64 {
        self.table[pattern.to_byte() as usize]
    }

    pub fn of_residue(&self, residue: u8) -> f64 {
        self.table[residue as usize]
    }

    pub fn constants(&self) -> &FieldConstants {
        &self.constants
    }
}
