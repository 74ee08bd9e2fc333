//! Single-flight memo of factorization results, keyed by the exact integer.
//!
//! A key is either `Ready` with the most recent result or `Pending` while one
//! caller computes it. Other callers for the same key block on the flight's
//! condvar and receive the same `Arc`. A flight whose computation panics is
//! marked abandoned and removed, and its waiters go back around the loop.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use num_bigint::BigUint;
use parking_lot::{Condvar, Mutex};
use serde::Serialize;
use tracing::{debug, trace, warn};

use crate::constants::PATTERN_PERIOD;
use crate::page::PageIndex;
use crate::result::Factorization;
use crate::substrate::residue;

const RESIDUES: usize = PATTERN_PERIOD as usize;

enum Slot {
    Ready(Arc<Factorization>),
    Pending(Arc<Flight>),
}

enum FlightState {
    Running,
    Done(Arc<Factorization>),
    Abandoned,
}

struct Flight {
    state: Mutex<FlightState>,
    done: Condvar,
}

impl Flight {
    fn new() -> Self {
        Self {
            state: Mutex::new(FlightState::Running),
            done: Condvar::new(),
        }
    }

    /// Block until the leader finishes. None if it panicked.
    fn wait(&self) -> Option<Arc<Factorization>> {
        let mut state = self.state.lock();
        loop {
            match &*state {
                FlightState::Running => self.done.wait(&mut state),
                FlightState::Done(result) => return Some(Arc::clone(result)),
                FlightState::Abandoned => return None,
            }
        }
    }

    fn settle(&self, state: FlightState) {
        *self.state.lock() = state;
        self.done.notify_all();
    }
}

enum Role {
    Hit(Arc<Factorization>),
    Wait(Arc<Flight>),
    Lead(Arc<Flight>),
}

/// Held by the leader while `compute` runs; releases the flight on unwind.
struct FlightGuard<'a> {
    cache: &'a FactorCache,
    key: &'a BigUint,
    flight: Arc<Flight>,
    finished: bool,
}

impl FlightGuard<'_> {
    fn finish(mut self, result: Arc<Factorization>) {
        self.finished = true;
        {
            let mut slots = self.cache.slots.lock();
            let replace = match slots.get(self.key) {
                None | Some(Slot::Ready(_)) => true,
                Some(Slot::Pending(f)) => Arc::ptr_eq(f, &self.flight),
            };
            if replace {
                slots.insert(self.key.clone(), Slot::Ready(Arc::clone(&result)));
            }
        }
        self.flight.settle(FlightState::Done(result));
    }
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        warn!(key = %self.key, "factorization panicked; releasing in-flight slot");
        self.flight.settle(FlightState::Abandoned);
        let mut slots = self.cache.slots.lock();
        let ours = matches!(slots.get(self.key), Some(Slot::Pending(f)) if Arc::ptr_eq(f, &self.flight));
        if ours {
            slots.remove(self.key);
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResidueStats {
    pub residue: u8,
    pub computed: u64,
    pub incomplete: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PageBucket {
    #[serde(with = "crate::serde_compat::decimal")]
    pub page: BigUint,
    pub entries: usize,
}

/// Point-in-time view of the cache.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub entries: usize,
    pub in_flight: usize,
    pub hits: u64,
    pub misses: u64,
    pub joined: u64,
    /// Residues with at least one computation, ascending.
    pub residues: Vec<ResidueStats>,
    /// Ready entries per page, ascending by page.
    pub pages: Vec<PageBucket>,
}

pub struct FactorCache {
    slots: Mutex<HashMap<BigUint, Slot>>,
    hits: AtomicU64,
    misses: AtomicU64,
    joined: AtomicU64,
    computed: [AtomicU64; RESIDUES],
    incomplete: [AtomicU64; RESIDUES],
}

impl Default for FactorCache {
    fn default() -> Self {
        Self::new()
    }
}

impl FactorCache {
    pub fn new() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            joined: AtomicU64::new(0),
            computed: [const { AtomicU64::new(0) }; RESIDUES],
            incomplete: [const { AtomicU64::new(0) }; RESIDUES],
        }
    }

    /// Return the cached result for `n` if `accept` takes it, otherwise
    /// compute it. At most one `compute` per key runs at a time; concurrent
    /// callers join it.
    pub fn compute_or_fetch<A, F>(&self, n: &BigUint, accept: A, compute: F) -> Arc<Factorization>
    where
        A: Fn(&Factorization) -> bool,
        F: FnOnce() -> Factorization,
    {
        let flight = loop {
            let role = {
                let mut slots = self.slots.lock();
                match slots.get(n) {
                    Some(Slot::Ready(result)) if accept(result) => Role::Hit(Arc::clone(result)),
                    Some(Slot::Pending(flight)) => Role::Wait(Arc::clone(flight)),
                    _ => {
                        let flight = Arc::new(Flight::new());
                        slots.insert(n.clone(), Slot::Pending(Arc::clone(&flight)));
                        Role::Lead(flight)
                    }
                }
            };
            match role {
                Role::Hit(result) => {
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    trace!(%n, "cache hit");
                    return result;
                }
                Role::Wait(flight) => {
                    trace!(%n, "joining in-flight factorization");
                    if let Some(result) = flight.wait()
                        && accept(&result)
                    {
                        self.joined.fetch_add(1, Ordering::Relaxed);
                        return result;
                    }
                    debug!(%n, "joined flight unusable; retrying");
                }
                Role::Lead(flight) => break flight,
            }
        };

        self.misses.fetch_add(1, Ordering::Relaxed);
        let guard = FlightGuard {
            cache: self,
            key: n,
            flight,
            finished: false,
        };
        let result = Arc::new(compute());
        self.record(&result);
        guard.finish(Arc::clone(&result));
        result
    }

    fn record(&self, result: &Factorization) {
        let r = residue(&result.n) as usize;
        self.computed[r].fetch_add(1, Ordering::Relaxed);
        if !result.is_exact() {
            self.incomplete[r].fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn get(&self, n: &BigUint) -> Option<Arc<Factorization>> {
        match self.slots.lock().get(n) {
            Some(Slot::Ready(result)) => Some(Arc::clone(result)),
            _ => None,
        }
    }

    /// Store a finished result. A key with a computation in flight is left
    /// to that computation; returns whether the entry was written.
    pub fn put(&self, result: Arc<Factorization>) -> bool {
        let mut slots = self.slots.lock();
        if let Some(Slot::Pending(_)) = slots.get(&result.n) {
            return false;
        }
        slots.insert(result.n.clone(), Slot::Ready(result));
        true
    }

    /// Drop every entry. Computations already in flight still complete and
    /// repopulate their key.
    pub fn clear(&self) {
        let mut slots = self.slots.lock();
        debug!(entries = slots.len(), "clearing factorization cache");
        slots.clear();
    }

    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .values()
            .filter(|s| matches!(s, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self, pages: &PageIndex) -> CacheStats {
        let (entries, in_flight, buckets) = {
            let slots = self.slots.lock();
            let mut buckets: BTreeMap<BigUint, usize> = BTreeMap::new();
            let mut in_flight = 0;
            for (key, slot) in slots.iter() {
                match slot {
                    Slot::Ready(_) => *buckets.entry(pages.locate(key).page).or_default() += 1,
                    Slot::Pending(_) => in_flight += 1,
                }
            }
            (slots.len() - in_flight, in_flight, buckets)
        };
        let residues = (0..RESIDUES)
            .filter_map(|r| {
                let computed = self.computed[r].load(Ordering::Relaxed);
                (computed > 0).then(|| ResidueStats {
                    residue: r as u8,
                    computed,
                    incomplete: self.incomplete[r].load(Ordering::Relaxed),
                })
            })
            .collect();
        CacheStats {
            entries,
            in_flight,
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            joined: self.joined.load(Ordering::Relaxed),
            residues,
            pages: buckets
                .into_iter()
                .map(|(page, entries)| PageBucket { page, entries })
                .collect(),
        }
    }
}
