//! Multi-strategy factorization under a shared budget.
//!
//! Stages run in a fixed order: base cases, free extraction of 2, trial
//! division, then for every unresolved cofactor a Miller-Rabin pre-filter
//! followed by search. Probable primes get the complete interference search
//! with the whole remaining budget; composites get the weighted strategies,
//! each on its own slice. Whatever is still unresolved when the budget runs
//! out is returned as-is, so the factor product always equals n.

use num_bigint::BigUint;
use num_traits::One;
use tracing::{debug, trace};

use crate::budget::{Budget, BudgetMeter};
use crate::config::EngineConfig;
use crate::page::PageIndex;
use crate::primality::{PrimalityVerdict, miller_rabin};
use crate::residue::ResidueLookup;
use crate::result::{Certainty, Factor, Factorization, Method};
use crate::rho::PollardRho;
use crate::search::InterferenceSearch;
use crate::strategy::{Attempt, Cofactor, Split, Strategy};
use crate::substrate::Pattern;
use crate::trial::TrialDivision;

struct Weighted {
    strategy: Box<dyn Strategy>,
    weight: u32,
}

/// A cofactor waiting to be resolved, with the stage that isolated it.
struct Pending {
    cofactor: Cofactor,
    origin: Method,
}

pub struct Orchestrator {
    trial: TrialDivision,
    prover: Box<dyn Strategy>,
    weighted: Vec<Weighted>,
    acceptance_threshold: f64,
    extra_rounds: u32,
}

impl Orchestrator {
    pub fn new(config: &EngineConfig, pages: PageIndex) -> Self {
        let w = &config.weights;
        let weighted = [
            (Box::new(ResidueLookup) as Box<dyn Strategy>, w.residue_lookup),
            (Box::new(InterferenceSearch::new(pages)), w.interference_search),
            (Box::new(PollardRho), w.pollard_rho),
        ]
        .into_iter()
        .filter(|(_, weight)| *weight > 0)
        .map(|(strategy, weight)| Weighted { strategy, weight })
        .collect();
        Self {
            trial: TrialDivision::new(config.trial_bound),
            prover: Box::new(InterferenceSearch::new(pages)),
            weighted,
            acceptance_threshold: config.acceptance_threshold,
            extra_rounds: config.extra_primality_rounds,
        }
    }

    pub fn factorize(&self, n: &BigUint, budget: Budget) -> Factorization {
        if *n <= BigUint::one() {
            return Factorization::from_factors(
                n.clone(),
                vec![Factor::proven(n.clone(), Method::Trivial)],
                0,
                budget,
            );
        }

        let mut meter = BudgetMeter::start(&budget);
        let mut factors = Vec::new();

        let twos = n.trailing_zeros().unwrap_or(0);
        let mut rest = n >> twos;
        for _ in 0..twos {
            factors.push(Factor::proven(BigUint::from(2u32), Method::TrialDivision));
        }

        let trial = self.trial.extract(&mut rest, &mut meter);
        factors.extend(
            trial
                .found
                .iter()
                .map(|&p| Factor::proven(BigUint::from(p), Method::TrialDivision)),
        );
        debug!(
            %n,
            found = factors.len(),
            sieved_to = trial.sieved_to,
            used = meter.used(),
            "trial division done"
        );

        if !rest.is_one() {
            let origin = if factors.is_empty() {
                Method::Prime
            } else {
                Method::TrialDivision
            };
            let mut stack = vec![Pending {
                cofactor: Cofactor::new(rest, trial.sieved_to),
                origin,
            }];
            while let Some(pending) = stack.pop() {
                self.resolve(pending, &mut meter, &mut stack, &mut factors);
            }
        }

        let result = Factorization::from_factors(n.clone(), factors, meter.used(), budget);
        debug!(
            %n,
            method = %result.method,
            confidence = result.confidence,
            iterations = result.iterations,
            "factorization complete"
        );
        result
    }

    /// Settle one cofactor: emit a factor, or push the two halves of a split.
    fn resolve(
        &self,
        pending: Pending,
        meter: &mut BudgetMeter,
        stack: &mut Vec<Pending>,
        factors: &mut Vec<Factor>,
    ) {
        let Pending { cofactor, origin } = pending;
        if cofactor.is_proven_prime() {
            factors.push(Factor {
                value: cofactor.value,
                method: origin,
                certainty: Certainty::Proven,
                evidence: vec![format!("no divisor up to {}", cofactor.sieved_to)],
            });
            return;
        }

        if !meter.spend() {
            debug!(cofactor = %cofactor.value, "budget exhausted before primality test");
            factors.push(unresolved(cofactor.value, 0.0, vec!["budget exhausted".into()]));
            return;
        }
        let verdict = miller_rabin(&cofactor.value, self.extra_rounds);
        trace!(
            cofactor = %cofactor.value,
            probably_prime = verdict.probably_prime,
            confidence = verdict.confidence,
            "primality pre-filter"
        );

        if verdict.probably_prime {
            self.settle_probable_prime(cofactor, origin, verdict, meter, stack, factors);
            return;
        }

        if let Some((method, split)) = self.run_weighted(&cofactor, meter) {
            debug!(
                cofactor = %cofactor.value,
                divisor = %split.divisor,
                %method,
                "split"
            );
            push_split(stack, split, cofactor.sieved_to, method);
            return;
        }

        debug!(cofactor = %cofactor.value, used = meter.used(), "composite left unresolved");
        let mut evidence = verdict.evidence;
        evidence.push(format!("budget exhausted after {} iterations", meter.used()));
        factors.push(unresolved(cofactor.value, verdict.confidence, evidence));
    }

    fn settle_probable_prime(
        &self,
        cofactor: Cofactor,
        origin: Method,
        verdict: PrimalityVerdict,
        meter: &mut BudgetMeter,
        stack: &mut Vec<Pending>,
        factors: &mut Vec<Factor>,
    ) {
        let mut evidence = verdict.evidence;
        evidence.push(format!(
            "pattern {}",
            Pattern::of_unsigned(&cofactor.value)
        ));
        match self.prover.attempt(&cofactor, meter) {
            Attempt::Exhausted => {
                evidence.push(format!("no divisor in ({}, sqrt]", cofactor.sieved_to));
                factors.push(Factor {
                    value: cofactor.value,
                    method: origin.max(Method::Prime),
                    certainty: Certainty::Proven,
                    evidence,
                });
            }
            Attempt::Split(split) => {
                push_split(stack, split, cofactor.sieved_to, self.prover.method());
            }
            Attempt::OutOfBudget if verdict.confidence >= self.acceptance_threshold => {
                factors.push(Factor {
                    value: cofactor.value,
                    method: Method::ProbablePrime,
                    certainty: Certainty::ProbablePrime {
                        confidence: verdict.confidence,
                    },
                    evidence,
                });
            }
            Attempt::OutOfBudget => {
                factors.push(unresolved(cofactor.value, verdict.confidence, evidence));
            }
        }
    }

    /// Run the weighted strategies in order, each on a slice proportional to
    /// its weight among those not yet run; the last takes everything left.
    fn run_weighted(&self, cofactor: &Cofactor, meter: &mut BudgetMeter) -> Option<(Method, Split)> {
        let mut weight_left: u64 = self.weighted.iter().map(|w| u64::from(w.weight)).sum();
        for (i, entry) in self.weighted.iter().enumerate() {
            if meter.is_exhausted() {
                return None;
            }
            let remaining = meter.remaining();
            let slice = if i + 1 == self.weighted.len() {
                remaining
            } else {
                (u128::from(remaining) * u128::from(entry.weight) / u128::from(weight_left)) as u64
            };
            weight_left -= u64::from(entry.weight);
            if slice == 0 {
                continue;
            }
            let mut child = meter.split(slice);
            let attempt = entry.strategy.attempt(cofactor, &mut child);
            trace!(
                method = %entry.strategy.method(),
                slice,
                used = child.used(),
                "strategy attempt"
            );
            meter.merge(child);
            if let Attempt::Split(split) = attempt {
                return Some((entry.strategy.method(), split));
            }
        }
        None
    }
}

/// Push both halves so the divisor is settled first.
fn push_split(stack: &mut Vec<Pending>, split: Split, sieved_to: u64, origin: Method) {
    stack.push(Pending {
        cofactor: Cofactor::new(split.cofactor, sieved_to),
        origin,
    });
    stack.push(Pending {
        cofactor: Cofactor::new(split.divisor, sieved_to),
        origin,
    });
}

fn unresolved(value: BigUint, confidence: f64, evidence: Vec<String>) -> Factor {
    Factor {
        value,
        method: Method::HeuristicIncomplete,
        certainty: Certainty::Unresolved { confidence },
        evidence,
    }
}
