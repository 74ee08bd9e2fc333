use std::sync::Arc;

use num_bigint::{BigInt, BigUint};
use tracing::debug;

use crate::budget::Budget;
use crate::cache::{CacheStats, FactorCache};
use crate::config::EngineConfig;
use crate::constants::FIELD_COUNT;
use crate::error::Result;
use crate::field::FieldConstants;
use crate::interference::{self, Interference};
use crate::orchestrator::Orchestrator;
use crate::page::{PageIndex, PagePosition};
use crate::primality::{PrimalityVerdict, miller_rabin};
use crate::resonance::Resonance;
use crate::result::Factorization;
use crate::substrate::Pattern;

/// Shared entry point: constants, resonance table and page index are fixed at
/// construction; the cache is the only mutable state. Safe to share via `Arc`.
pub struct Engine {
    config: EngineConfig,
    resonance: Resonance,
    pages: PageIndex,
    orchestrator: Orchestrator,
    cache: FactorCache,
}

impl Engine {
    /// Engine over the canonical constants. Fails if the constant table does
    /// not verify or the config is invalid.
    pub fn new(config: EngineConfig) -> Result<Self> {
        Self::with_constants(FieldConstants::canonical()?, config)
    }

    pub fn with_constants(constants: FieldConstants, config: EngineConfig) -> Result<Self> {
        constants.verify()?;
        config.validate()?;
        let pages = PageIndex::default();
        let orchestrator = Orchestrator::new(&config, pages);
        debug!(?config, "engine constructed");
        Ok(Self {
            resonance: Resonance::new(Arc::new(constants)),
            pages,
            orchestrator,
            cache: FactorCache::new(),
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn field_pattern(&self, n: &BigInt) -> Pattern {
        Pattern::of(n)
    }

    pub fn field_constants(&self) -> &[f64; FIELD_COUNT] {
        self.resonance.constants().values()
    }

    pub fn active_field_indices(&self, n: &BigInt) -> Vec<usize> {
        Pattern::of(n).active_indices()
    }

    pub fn resonance(&self, n: &BigInt) -> f64 {
        self.resonance.of(n)
    }

    pub fn page_of(&self, n: &BigUint) -> PagePosition {
        self.pages.locate(n)
    }

    pub fn interference(&self, a: &BigInt, b: &BigInt) -> Interference {
        interference::interference(a, b)
    }

    pub fn primality(&self, n: &BigUint) -> PrimalityVerdict {
        miller_rabin(n, self.config.extra_primality_rounds)
    }

    /// Factorize under the configured default budget.
    pub fn factorize(&self, n: &BigUint) -> Arc<Factorization> {
        self.factorize_with_budget(n, self.config.budget())
    }

    /// Cached factorization. An exact cached result is always reused; an
    /// inexact one only if it was produced under a budget covering `budget`.
    pub fn factorize_with_budget(&self, n: &BigUint, budget: Budget) -> Arc<Factorization> {
        self.cache.compute_or_fetch(
            n,
            |cached| cached.is_exact() || cached.budget.covers(&budget),
            || self.orchestrator.factorize(n, budget),
        )
    }

    /// Bypass the cache entirely.
    pub fn factorize_uncached(&self, n: &BigUint, budget: Budget) -> Factorization {
        self.orchestrator.factorize(n, budget)
    }

    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats(&self.pages)
    }

    /// Preload results, e.g. from a persistent ledger. Each result goes
    /// through [`Factorization::revalidated`]; rejected ones are skipped.
    /// Returns how many were stored.
    pub fn warm<I>(&self, results: I) -> usize
    where
        I: IntoIterator<Item = Factorization>,
    {
        let mut stored = 0;
        let mut rejected = 0;
        for result in results {
            match result.revalidated(self.config.extra_primality_rounds) {
                Some(checked) => {
                    if self.cache.put(Arc::new(checked)) {
                        stored += 1;
                    }
                }
                None => rejected += 1,
            }
        }
        debug!(stored, rejected, "cache warmed");
        stored
    }
}
