//! One complete simulation run
//!
//! [`Simulation::run`] is the invoking thread's side of the protocol:
//!
//! 1. seed the dataset,
//! 2. start the `statistics` thread (consumer), which blocks on the monitor,
//! 3. start the `access` thread (producer) and join it,
//! 4. if the producer died before pushing its `Shutdown`, push it on its behalf,
//! 5. join the consumer and collect the tally,
//! 6. tear the dataset down, whatever happened in between.
//!
//! Step 4 is what keeps the consumer from waiting forever when the producer
//! panics: exactly one `Shutdown` reaches the monitor in every run.

use core::fmt;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use tracing::{error, info, warn};

use crate::aggregator::{StatisticsAggregator, Tally, TallySink};
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::generator::{GeneratorSummary, WorkloadGenerator};
use crate::lifecycle::{DatasetLifecycle, SetupSummary, TeardownSummary};
use crate::monitor::{Event, EventMonitor};
use crate::store::KeyValueStore;

const STATISTICS_THREAD: &str = "statistics";
const ACCESS_THREAD: &str = "access";

/// Everything a completed run produced
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    /// Aggregator's final counts
    pub tally: Tally,
    /// Generator's own counts
    pub generator: GeneratorSummary,
    /// Dataset seeding result
    pub setup: SetupSummary,
    /// Dataset teardown result
    pub teardown: TeardownSummary,
    /// Wall time from setup through teardown
    pub elapsed: Duration,
}

impl RunReport {
    /// Elapsed wall time in whole milliseconds, saturating at `u64::MAX`.
    pub fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.elapsed.as_millis()).unwrap_or(u64::MAX)
    }
}

/// A configured, not yet started, simulation run.
pub struct Simulation<S> {
    store: Arc<S>,
    config: AppConfig,
    seed: Option<u64>,
    sinks: Vec<Box<dyn TallySink>>,
}

impl<S: KeyValueStore + 'static> Simulation<S> {
    /// Validates `config` and prepares a run against `store`.
    pub fn new(store: Arc<S>, config: AppConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            config,
            seed: None,
            sinks: Vec::new(),
        })
    }

    /// Makes the key draws reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Adds a sink for the final tally.
    pub fn with_sink<K: TallySink + 'static>(mut self, sink: K) -> Self {
        self.sinks.push(Box::new(sink));
        self
    }

    /// Runs setup, both workers and teardown.
    ///
    /// A setup failure still triggers teardown, then is returned. Worker
    /// failures are returned after teardown.
    pub fn run(self) -> Result<RunReport> {
        let Simulation {
            store,
            config,
            seed,
            sinks,
        } = self;

        let started = Instant::now();
        let lifecycle = DatasetLifecycle::new(Arc::clone(&store), config.clone());

        let setup = match lifecycle.setup_data() {
            Ok(setup) => setup,
            Err(e) => {
                error!(error = %e, "Dataset setup failed");
                lifecycle.teardown_data();
                return Err(e.into());
            }
        };

        let monitor = Arc::new(EventMonitor::new());
        let workers = run_workers(&store, &config, seed, sinks, &monitor);
        let teardown = lifecycle.teardown_data();
        let (tally, generator) = workers?;

        let report = RunReport {
            tally,
            generator,
            setup,
            teardown,
            elapsed: started.elapsed(),
        };
        info!(
            hits = tally.hits,
            misses = tally.misses,
            elapsed_ms = report.elapsed_ms(),
            "Simulation complete"
        );
        Ok(report)
    }
}

fn run_workers<S: KeyValueStore + 'static>(
    store: &Arc<S>,
    config: &AppConfig,
    seed: Option<u64>,
    sinks: Vec<Box<dyn TallySink>>,
    monitor: &Arc<EventMonitor>,
) -> Result<(Tally, GeneratorSummary)> {
    let aggregator = StatisticsAggregator::new(Arc::clone(monitor)).with_sinks(sinks);
    let statistics = thread::Builder::new()
        .name(STATISTICS_THREAD.to_string())
        .spawn(move || aggregator.run())
        .map_err(|source| Error::Spawn {
            name: STATISTICS_THREAD,
            source,
        })?;

    let mut generator = WorkloadGenerator::new(Arc::clone(store), Arc::clone(monitor), config);
    if let Some(seed) = seed {
        generator = generator.with_seed(seed);
    }
    let access = thread::Builder::new()
        .name(ACCESS_THREAD.to_string())
        .spawn(move || generator.run());

    let produced = match access {
        Ok(handle) => handle
            .join()
            .map_err(|_| Error::WorkerPanicked(ACCESS_THREAD)),
        Err(source) => Err(Error::Spawn {
            name: ACCESS_THREAD,
            source,
        }),
    };
    if let Err(e) = &produced {
        warn!(error = %e, "Producer did not finish; signaling shutdown");
        monitor.push(Event::Shutdown);
    }

    let tally = statistics
        .join()
        .map_err(|_| Error::WorkerPanicked(STATISTICS_THREAD))?;
    Ok((tally, produced?))
}

impl<S: fmt::Debug> fmt::Debug for Simulation<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Simulation")
            .field("store", &self.store)
            .field("config", &self.config)
            .field("seed", &self.seed)
            .field("sinks", &self.sinks.len())
            .finish()
    }
}
