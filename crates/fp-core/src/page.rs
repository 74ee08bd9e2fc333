use num_bigint::BigUint;
use num_integer::Integer;
use serde::{Deserialize, Serialize};

use crate::constants::PAGE_SIZE;

/// Position of an integer within the page partition.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PagePosition {
    #[serde(with = "crate::serde_compat::decimal")]
    pub page: BigUint,
    pub offset: u32,
}

/// Partition of the naturals into consecutive fixed-width windows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageIndex {
    size: u32,
}

impl Default for PageIndex {
    fn default() -> Self {
        Self { size: PAGE_SIZE }
    }
}

impl PageIndex {
    pub fn size(&self) -> u32 {
        self.size
    }

    pub fn locate(&self, n: &BigUint) -> PagePosition {
        let (page, offset) = n.div_rem(&BigUint::from(self.size));
        PagePosition {
            page,
            offset: offset.iter_u32_digits().next().unwrap_or(0),
        }
    }

    /// Inclusive window `[page·size, page·size + size − 1]`.
    pub fn bounds(&self, page: &BigUint) -> (BigUint, BigUint) {
        let start = page * self.size;
        let end = &start + (self.size - 1);
        (start, end)
    }
}
