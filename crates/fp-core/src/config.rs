use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::budget::Budget;
use crate::constants::{
    ACCEPTANCE_THRESHOLD, DEFAULT_MAX_ITERATIONS, EXTRA_PRIMALITY_ROUNDS, TRIAL_PRIME_BOUND,
};
use crate::error::{FieldError, Result};

/// Relative share of the remaining budget each composite-splitting strategy receives.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StrategyWeights {
    pub residue_lookup: u32,
    pub interference_search: u32,
    pub pollard_rho: u32,
}

impl Default for StrategyWeights {
    fn default() -> Self {
        Self {
            residue_lookup: 1,
            interference_search: 1,
            pollard_rho: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub max_iterations: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deadline_ms: Option<u64>,
    pub acceptance_threshold: f64,
    pub trial_bound: u32,
    pub extra_primality_rounds: u32,
    pub weights: StrategyWeights,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            deadline_ms: None,
            acceptance_threshold: ACCEPTANCE_THRESHOLD,
            trial_bound: TRIAL_PRIME_BOUND,
            extra_primality_rounds: EXTRA_PRIMALITY_ROUNDS,
            weights: StrategyWeights::default(),
        }
    }
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.acceptance_threshold > 0.0 && self.acceptance_threshold < 1.0) {
            return Err(FieldError::InvalidConfig(format!(
                "acceptance_threshold must be in (0, 1), got {}",
                self.acceptance_threshold
            )));
        }
        if self.trial_bound < 3 {
            return Err(FieldError::InvalidConfig(format!(
                "trial_bound must be at least 3, got {}",
                self.trial_bound
            )));
        }
        let w = &self.weights;
        if w.residue_lookup == 0 && w.interference_search == 0 && w.pollard_rho == 0 {
            return Err(FieldError::InvalidConfig(
                "at least one strategy weight must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// Default budget for requests that don't name one.
    pub fn budget(&self) -> Budget {
        Budget {
            max_iterations: self.max_iterations,
            deadline: self.deadline_ms.map(Duration::from_millis),
        }
    }
}
