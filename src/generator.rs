//! Workload generator: the producer side of the event handoff
//!
//! Issues `probe_count` probes against the store, each on a key drawn from
//! `[1, probe_count]`. A present key is a [`Event::Hit`]; an absent key is a
//! [`Event::Miss`] and is backfilled with a fresh record so that later draws
//! of the same key hit. Every classification is pushed to the monitor as it
//! is made, and a single [`Event::Shutdown`] follows the last probe.

use std::sync::Arc;

use tracing::{info, trace, warn};

use crate::config::{AppConfig, WorkloadParams};
use crate::keys::RandomKeySelector;
use crate::monitor::{Event, EventMonitor};
use crate::store::{KeyValueStore, Record};

/// The generator's own count of what it produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneratorSummary {
    /// Probes issued
    pub probes: u64,
    /// Probes classified as hits
    pub hits: u64,
    /// Probes classified as misses
    pub misses: u64,
    /// Misses whose backfill write failed
    pub backfill_failures: u64,
}

/// Outcome of a single probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Probe {
    event: Event,
    backfilled: bool,
}

/// Producer that probes random keys and pushes classified events.
#[derive(Debug)]
pub struct WorkloadGenerator<S> {
    store: Arc<S>,
    monitor: Arc<EventMonitor>,
    config: AppConfig,
    params: WorkloadParams,
    selector: RandomKeySelector,
}

impl<S: KeyValueStore> WorkloadGenerator<S> {
    /// Creates a generator whose key draws are seeded from OS entropy.
    pub fn new(store: Arc<S>, monitor: Arc<EventMonitor>, config: &AppConfig) -> Self {
        let params = config.workload();
        let (lower, upper) = params.draw_range();
        Self {
            store,
            monitor,
            config: config.clone(),
            params,
            selector: RandomKeySelector::new(lower, upper),
        }
    }

    /// Replaces the draw sequence with a reproducible one.
    pub fn with_seed(mut self, seed: u64) -> Self {
        let (lower, upper) = self.params.draw_range();
        self.selector = RandomKeySelector::with_seed(lower, upper, seed);
        self
    }

    /// Probes the bucket at `index` and classifies it, backfilling on a miss.
    ///
    /// Nothing is pushed to the monitor.
    pub fn probe(&self, index: u64) -> Event {
        self.classify(index).event
    }

    fn classify(&self, index: u64) -> Probe {
        let key = self.config.bucket_key(index);

        let present = match self.store.contains(&key) {
            Ok(present) => present,
            Err(e) => {
                warn!(key = %key, error = %e, "Lookup failed, counting as a miss");
                false
            }
        };
        if present {
            return Probe {
                event: Event::Hit,
                backfilled: false,
            };
        }

        let backfilled = match self
            .store
            .set_if_absent(&key, Record::with_random_value(index).into())
        {
            Ok(_) => true,
            Err(e) => {
                warn!(key = %key, error = %e, "Backfill failed");
                false
            }
        };
        Probe {
            event: Event::Miss,
            backfilled,
        }
    }

    /// Issues every probe, pushing each classification, then pushes
    /// `Shutdown`.
    pub fn run(mut self) -> GeneratorSummary {
        info!(
            probes = self.params.probe_count,
            seeded_keys = self.params.seeded_keys,
            draw_lower = self.selector.lower(),
            draw_upper = self.selector.upper(),
            "Access generator started"
        );

        let mut summary = GeneratorSummary::default();
        for _ in 0..self.params.probe_count {
            let index = self.selector.next_key();
            let probe = self.classify(index);
            trace!(index, event = %probe.event, "Probed");

            summary.probes += 1;
            match probe.event {
                Event::Hit => summary.hits += 1,
                Event::Miss => {
                    summary.misses += 1;
                    if !probe.backfilled {
                        summary.backfill_failures += 1;
                    }
                }
                Event::Shutdown => unreachable!("classify never yields Shutdown"),
            }
            self.monitor.push(probe.event);
        }
        self.monitor.push(Event::Shutdown);

        info!(
            hits = summary.hits,
            misses = summary.misses,
            backfill_failures = summary.backfill_failures,
            "Access generator is exiting"
        );
        summary
    }
}
