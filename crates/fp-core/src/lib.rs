//! Field-pattern factorization engine.
//!
//! Maps every integer to an 8-bit activation pattern (its value mod 256),
//! reduces the pattern to a scalar resonance over eight fixed field
//! constants, and uses both to steer a budget-bounded, multi-strategy
//! factorization whose factor product always equals the input.
//!
//! Zero I/O: persistence and transport live in other crates.

pub mod budget;
pub mod cache;
pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod field;
pub mod interference;
pub mod orchestrator;
pub mod page;
pub mod primality;
pub mod residue;
pub mod resonance;
pub mod result;
pub mod rho;
pub mod search;
pub mod serde_compat;
pub mod strategy;
pub mod substrate;
pub mod trial;

pub use budget::{Budget, BudgetMeter};
pub use cache::{CacheStats, FactorCache, PageBucket, ResidueStats};
pub use config::{EngineConfig, StrategyWeights};
pub use constants::{ACCEPTANCE_THRESHOLD, DEFAULT_MAX_ITERATIONS, FIELD_COUNT, PAGE_SIZE};
pub use engine::Engine;
pub use error::{ErrorKind, FieldError, Result};
pub use field::{CANONICAL_FIELD_VALUES, FIELD_NAMES, FieldConstants};
pub use interference::Interference;
pub use page::{PageIndex, PagePosition};
pub use primality::PrimalityVerdict;
pub use resonance::Resonance;
pub use result::{Certainty, Factor, Factorization, Method};
pub use serde_compat::{CURRENT_VERSION, export_json, import_json};
pub use strategy::{Attempt, Cofactor, Split, Strategy};
pub use substrate::{Pattern, active_indices, from_byte, is_active, pattern, residue, to_byte};
