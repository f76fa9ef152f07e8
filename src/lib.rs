#![doc = include_str!("../README.md")]
//!
//! ---
//!
//! # Code Reference
//!
//! ## Components
//!
//! | Component | Role | Thread |
//! |-----------|------|--------|
//! | [`RandomKeySelector`] | Uniform key draws in `[lo, hi]` | producer |
//! | [`KeyValueStore`] / [`MemoryStore`] | Keyed records, presence decides hit/miss | any |
//! | [`EventMonitor`] | Mutex + condvar handoff of [`Event`]s | shared |
//! | [`WorkloadGenerator`] | Probes, classifies, backfills, pushes | `access` |
//! | [`StatisticsAggregator`] | Drains, counts, stops on `Shutdown` | `statistics` |
//! | [`DatasetLifecycle`] | Seeds and tears down buckets and accumulators | invoking |
//! | [`Simulation`] | Runs all of the above in order | invoking |
//!
//! ## Run sequence
//!
//! ```text
//!  invoking thread        statistics thread          access thread
//!  ───────────────        ─────────────────          ─────────────
//!  setup_data()
//!  spawn ───────────────▶ wait_for_signal()
//!  spawn ─────────────────────────────────────────▶ probe, push(Hit|Miss)
//!                         drain_all(), count   ◀──── ...
//!                                                    push(Shutdown)
//!  join(access) ◀──────────────────────────────────── exit
//!                         drain_all(), Shutdown
//!  join(statistics) ◀──── report tally, exit
//!  teardown_data()
//! ```
//!
//! ## Driving the monitor by hand
//!
//! ```rust
//! use std::sync::Arc;
//! use std::thread;
//! use hitormiss::{Event, EventMonitor, StatisticsAggregator, Tally};
//!
//! let monitor = Arc::new(EventMonitor::new());
//! let aggregator = StatisticsAggregator::new(Arc::clone(&monitor));
//! let consumer = thread::spawn(move || aggregator.run());
//!
//! monitor.push(Event::Hit);
//! monitor.push_all([Event::Miss, Event::Miss]);
//! monitor.push(Event::Shutdown);
//!
//! assert_eq!(consumer.join().unwrap(), Tally { hits: 1, misses: 2 });
//! ```

/// Hit/miss counting on the consumer thread.
///
/// Provides the aggregator state machine, the tally it owns, and the sinks
/// that receive the final totals.
pub mod aggregator;

/// Application configuration and the derived workload shape.
pub mod config;

/// Error types.
pub mod error;

/// Probe generation on the producer thread.
pub mod generator;

/// Random key selection.
pub mod keys;

/// Dataset seeding and teardown.
pub mod lifecycle;

/// The event queue and monitor shared by producer and consumer.
pub mod monitor;

/// Orchestration of a full run.
pub mod session;

/// Key-value store trait and the in-memory implementation.
pub mod store;

pub use aggregator::{AccumulatorSink, AggregatorState, LogSink, StatisticsAggregator, Tally, TallySink};
pub use config::{AppConfig, WorkloadParams, PROBE_MULTIPLIER};
pub use error::{ConfigError, Error, Result, StoreError};
pub use generator::{GeneratorSummary, WorkloadGenerator};
pub use keys::RandomKeySelector;
pub use lifecycle::{DatasetLifecycle, SetupSummary, TeardownSummary};
pub use monitor::{Event, EventMonitor, SignalGuard};
pub use session::{RunReport, Simulation};
pub use store::{KeyValueStore, MemoryStore, Record, StoredValue};
