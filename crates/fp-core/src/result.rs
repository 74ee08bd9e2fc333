use std::fmt;

use num_bigint::BigUint;
use num_traits::One;
use serde::{Deserialize, Serialize};

use crate::budget::Budget;
use crate::primality::miller_rabin;

/// How a factor (or a whole result) was obtained, ordered by pipeline stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Method {
    Trivial,
    TrialDivision,
    Prime,
    ResidueLookup,
    InterferenceSearch,
    PollardRho,
    ProbablePrime,
    HeuristicIncomplete,
}

impl Method {
    pub fn label(self) -> &'static str {
        match self {
            Method::Trivial => "trivial",
            Method::TrialDivision => "trial-division",
            Method::Prime => "prime",
            Method::ResidueLookup => "residue-lookup",
            Method::InterferenceSearch => "interference-search",
            Method::PollardRho => "pollard-rho",
            Method::ProbablePrime => "probable-prime",
            Method::HeuristicIncomplete => "heuristic-incomplete",
        }
    }

    pub const ALL: [Method; 8] = [
        Method::Trivial,
        Method::TrialDivision,
        Method::Prime,
        Method::ResidueLookup,
        Method::InterferenceSearch,
        Method::PollardRho,
        Method::ProbablePrime,
        Method::HeuristicIncomplete,
    ];

    pub fn from_label(label: &str) -> Option<Method> {
        Method::ALL.into_iter().find(|m| m.label() == label)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum Certainty {
    /// Isolated and shown prime by exact division.
    Proven,
    ProbablePrime { confidence: f64 },
    /// Not known to be prime; possibly composite.
    Unresolved { confidence: f64 },
}

impl Certainty {
    pub fn confidence(&self) -> f64 {
        match *self {
            Certainty::Proven => 1.0,
            Certainty::ProbablePrime { confidence } | Certainty::Unresolved { confidence } => {
                confidence
            }
        }
    }

    pub fn is_proven(&self) -> bool {
        matches!(self, Certainty::Proven)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Factor {
    #[serde(with = "crate::serde_compat::decimal")]
    pub value: BigUint,
    pub method: Method,
    pub certainty: Certainty,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub evidence: Vec<String>,
}

impl Factor {
    pub fn proven(value: BigUint, method: Method) -> Self {
        Self {
            value,
            method,
            certainty: Certainty::Proven,
            evidence: Vec::new(),
        }
    }
}

/// Outcome of one factorization. The product of `factors` is always `n`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Factorization {
    #[serde(with = "crate::serde_compat::decimal")]
    pub n: BigUint,
    pub factors: Vec<Factor>,
    pub method: Method,
    pub iterations: u64,
    pub confidence: f64,
    pub budget: Budget,
}

impl Factorization {
    /// Assemble a result; method and confidence are derived from the factors.
    pub fn from_factors(n: BigUint, factors: Vec<Factor>, iterations: u64, budget: Budget) -> Self {
        let method = factors
            .iter()
            .map(|f| f.method)
            .max()
            .unwrap_or(Method::Trivial);
        let confidence = factors
            .iter()
            .map(|f| f.certainty.confidence())
            .fold(1.0, f64::min);
        Self {
            n,
            factors,
            method,
            iterations,
            confidence,
            budget,
        }
    }

    pub fn values(&self) -> Vec<BigUint> {
        self.factors.iter().map(|f| f.value.clone()).collect()
    }

    pub fn product(&self) -> BigUint {
        self.factors
            .iter()
            .fold(BigUint::one(), |acc, f| acc * &f.value)
    }

    /// Every factor proven by exact division.
    pub fn is_exact(&self) -> bool {
        self.factors.iter().all(|f| f.certainty.is_proven())
    }

    pub fn verify(&self) -> bool {
        !self.factors.is_empty() && self.product() == self.n
    }

    /// Re-check a result that came from outside the engine (a snapshot or
    /// the ledger) before it is trusted. Returns `None` if the product is
    /// wrong, a factor claimed `Proven` fails Miller-Rabin, a factor is 0 or
    /// 1 in a product above 1, or an unproven factor claims confidence 1.0.
    /// Method and confidence are re-derived from the factors.
    pub fn revalidated(self, extra_rounds: u32) -> Option<Self> {
        if !self.verify() {
            return None;
        }
        if self.n <= BigUint::one() {
            if self.factors.len() != 1 {
                return None;
            }
        } else {
            for factor in &self.factors {
                if factor.value <= BigUint::one() {
                    return None;
                }
                let sound = match factor.certainty {
                    Certainty::Proven => miller_rabin(&factor.value, extra_rounds).probably_prime,
                    Certainty::ProbablePrime { confidence } | Certainty::Unresolved { confidence } => {
                        (0.0..1.0).contains(&confidence)
                    }
                };
                if !sound {
                    return None;
                }
            }
        }
        Some(Self::from_factors(
            self.n,
            self.factors,
            self.iterations,
            self.budget,
        ))
    }
}

impl fmt::Display for Factorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let factors: Vec<String> = self.factors.iter().map(|x| x.value.to_string()).collect();
        write!(
            f,
            "{} = {}  [{}, confidence {:.6}, iterations {}]",
            self.n,
            factors.join(" * "),
            self.method,
            self.confidence,
            self.iterations
        )
    }
}
