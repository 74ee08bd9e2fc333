use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_MAX_ITERATIONS;

/// Iteration and wall-clock limits for one factorization request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    pub max_iterations: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<Duration>,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_iterations: DEFAULT_MAX_ITERATIONS,
            deadline: None,
        }
    }
}

impl Budget {
    pub fn iterations(max_iterations: u64) -> Self {
        Self {
            max_iterations,
            deadline: None,
        }
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// True if a result produced under `self` is at least as thorough as one
    /// requested under `other`. No deadline counts as unbounded time.
    pub fn covers(&self, other: &Budget) -> bool {
        let time_ok = match (self.deadline, other.deadline) {
            (None, _) => true,
            (Some(_), None) => false,
            (Some(mine), Some(theirs)) => mine >= theirs,
        };
        self.max_iterations >= other.max_iterations && time_ok
    }
}

/// Live iteration counter with an absolute deadline.
///
/// A slice handed to a strategy via [`BudgetMeter::split`] shares the parent's
/// deadline and is folded back with [`BudgetMeter::merge`].
#[derive(Clone, Debug)]
pub struct BudgetMeter {
    limit: u64,
    used: u64,
    deadline: Option<Instant>,
}

impl BudgetMeter {
    pub fn start(budget: &Budget) -> Self {
        Self {
            limit: budget.max_iterations,
            used: 0,
            deadline: budget.deadline.map(|d| Instant::now() + d),
        }
    }

    pub fn used(&self) -> u64 {
        self.used
    }

    pub fn remaining(&self) -> u64 {
        self.limit - self.used
    }

    pub fn is_exhausted(&self) -> bool {
        self.used >= self.limit || self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// Consume one iteration. Returns false, without consuming, once exhausted.
    pub fn spend(&mut self) -> bool {
        if self.is_exhausted() {
            return false;
        }
        self.used += 1;
        true
    }

    /// Consume up to `k` iterations unconditionally (free work is not modeled).
    pub fn charge(&mut self, k: u64) {
        self.used = self.used.saturating_add(k).min(self.limit);
    }

    /// Carve a child meter of at most `cap` iterations out of what remains.
    pub fn split(&self, cap: u64) -> BudgetMeter {
        BudgetMeter {
            limit: cap.min(self.remaining()),
            used: 0,
            deadline: self.deadline,
        }
    }

    pub fn merge(&mut self, child: BudgetMeter) {
        self.charge(child.used);
    }
}
