//! Statistics aggregator: the consumer side of the event handoff
//!
//! The aggregator owns the hit/miss [`Tally`] and runs a small state machine:
//!
//! ```text
//!            ┌──────── no Shutdown in batch ────────┐
//!            ▼                                      │
//!       ┌─────────┐  signal   ┌──────────┐          │
//!  ───▶ │ Waiting │ ────────▶ │ Draining │ ─────────┘
//!       └─────────┘           └────┬─────┘
//!                                  │ Shutdown seen
//!                                  ▼
//!                            ┌────────────┐
//!                            │ Terminated │ ──▶ report tally, return
//!                            └────────────┘
//! ```
//!
//! Only an explicit [`Event::Shutdown`] ends the loop. A wake that finds
//! nothing to drain is not a shutdown.

use core::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::monitor::{Event, EventMonitor};
use crate::store::{KeyValueStore, StoredValue};

/// Hit and miss counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Probes that found their key
    pub hits: u64,
    /// Probes that did not
    pub misses: u64,
}

impl Tally {
    /// Hits plus misses.
    pub fn total(&self) -> u64 {
        self.hits + self.misses
    }

    /// Hit rate as a percentage, `0.0` when nothing was counted.
    pub fn hit_rate(&self) -> f64 {
        let total = self.total();
        if total > 0 {
            (self.hits as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }
}

/// Destination for the final tally.
///
/// Sinks run on the aggregator thread once, after it terminates. Any
/// `Fn(&Tally) + Send` closure is a sink.
pub trait TallySink: Send {
    /// Receives the final totals.
    fn report(&self, tally: &Tally);
}

impl<F> TallySink for F
where
    F: Fn(&Tally) + Send,
{
    fn report(&self, tally: &Tally) {
        self(tally)
    }
}

/// Logs the final totals at `info` level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogSink;

impl TallySink for LogSink {
    fn report(&self, tally: &Tally) {
        info!(
            hits = tally.hits,
            misses = tally.misses,
            total = tally.total(),
            hit_rate = %format!("{:.2}%", tally.hit_rate()),
            "Final tally"
        );
    }
}

/// Mirrors the final totals into the accumulator counters of a store.
#[derive(Debug)]
pub struct AccumulatorSink<S> {
    store: Arc<S>,
    hits_key: String,
    misses_key: String,
}

impl<S: KeyValueStore> AccumulatorSink<S> {
    /// Writes to `hits_key` and `misses_key` in `store`.
    pub fn new(store: Arc<S>, hits_key: impl Into<String>, misses_key: impl Into<String>) -> Self {
        Self {
            store,
            hits_key: hits_key.into(),
            misses_key: misses_key.into(),
        }
    }
}

impl<S: KeyValueStore> TallySink for AccumulatorSink<S> {
    fn report(&self, tally: &Tally) {
        for (key, count) in [(&self.hits_key, tally.hits), (&self.misses_key, tally.misses)] {
            if let Err(e) = self.store.set(key, StoredValue::Counter(count)) {
                warn!(key = %key, error = %e, "Failed to update accumulator");
            }
        }
    }
}

/// Aggregator life cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregatorState {
    /// Blocked until the monitor is signaled
    Waiting,
    /// Counting a drained batch
    Draining,
    /// Shutdown observed; no further waits
    Terminated,
}

/// Consumer that drains the monitor and counts hits and misses.
pub struct StatisticsAggregator {
    monitor: Arc<EventMonitor>,
    sinks: Vec<Box<dyn TallySink>>,
    tally: Tally,
    state: AggregatorState,
    shutdown_requested: bool,
    batches: u64,
}

impl StatisticsAggregator {
    /// Creates an aggregator in the `Waiting` state with no sinks.
    pub fn new(monitor: Arc<EventMonitor>) -> Self {
        Self {
            monitor,
            sinks: Vec::new(),
            tally: Tally::default(),
            state: AggregatorState::Waiting,
            shutdown_requested: false,
            batches: 0,
        }
    }

    /// Adds a sink that receives the final tally.
    pub fn with_sink<K: TallySink + 'static>(mut self, sink: K) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Adds already boxed sinks.
    pub fn with_sinks(mut self, sinks: impl IntoIterator<Item = Box<dyn TallySink>>) -> Self {
        self.sinks.extend(sinks);
        self
    }

    /// Current state.
    pub fn state(&self) -> AggregatorState {
        self.state
    }

    /// Counts so far.
    pub fn tally(&self) -> Tally {
        self.tally
    }

    /// Number of drained batches so far.
    pub fn batches(&self) -> u64 {
        self.batches
    }

    /// Runs one `Waiting → Draining → Waiting | Terminated` cycle.
    ///
    /// Blocks until the monitor is signaled. Does nothing once terminated.
    pub fn step(&mut self) -> AggregatorState {
        if self.state == AggregatorState::Terminated {
            return self.state;
        }

        // The guard is a temporary: the lock is released before counting.
        let events = self.monitor.wait_for_signal().drain_all();

        self.state = AggregatorState::Draining;
        self.absorb(&events);

        self.state = if self.shutdown_requested {
            AggregatorState::Terminated
        } else {
            AggregatorState::Waiting
        };
        self.state
    }

    /// Loops until a `Shutdown` event is drained, then reports and returns
    /// the final tally.
    pub fn run(mut self) -> Tally {
        info!("Statistics aggregator started");

        while self.step() != AggregatorState::Terminated {}

        info!(
            hits = self.tally.hits,
            misses = self.tally.misses,
            batches = self.batches,
            "Statistics aggregator is exiting"
        );
        for sink in &self.sinks {
            sink.report(&self.tally);
        }
        self.tally
    }

    fn absorb(&mut self, events: &[Event]) {
        self.batches += 1;
        debug!(batch = self.batches, events = events.len(), "Drained events");

        for event in events {
            match event {
                Event::Hit | Event::Miss if self.shutdown_requested => {
                    warn!(event = %event, "Event queued after shutdown");
                    self.count(*event);
                }
                Event::Hit | Event::Miss => self.count(*event),
                Event::Shutdown if self.shutdown_requested => {
                    warn!("Duplicate shutdown event ignored");
                }
                Event::Shutdown => self.shutdown_requested = true,
            }
        }
    }

    #[inline]
    fn count(&mut self, event: Event) {
        match event {
            Event::Hit => self.tally.hits += 1,
            Event::Miss => self.tally.misses += 1,
            Event::Shutdown => {}
        }
    }
}

impl fmt::Debug for StatisticsAggregator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatisticsAggregator")
            .field("state", &self.state)
            .field("tally", &self.tally)
            .field("batches", &self.batches)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
