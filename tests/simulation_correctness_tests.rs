//! End-to-end correctness tests for full simulation runs
//!
//! Covers the small worked scenario, classification idempotence, teardown
//! completeness, and the non-fatal failure paths via a store wrapper that
//! injects faults.

use hitormiss::{
    AppConfig, DatasetLifecycle, Error, Event, EventMonitor, KeyValueStore, MemoryStore, Record,
    Simulation, StoreError, StoredValue, Tally, WorkloadGenerator,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

/// Store wrapper that can fail writes, deletes or lookups on demand
#[derive(Debug, Default)]
struct FaultyStore {
    inner: MemoryStore,
    fail_backfill: AtomicBool,
    fail_deletes_for: parking_lot::Mutex<Option<String>>,
    fail_list: AtomicBool,
    unavailable: AtomicBool,
    panic_on_get: AtomicBool,
}

impl FaultyStore {
    fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for FaultyStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        if self.panic_on_get.load(Ordering::SeqCst) {
            panic!("injected lookup panic");
        }
        self.inner.get(key)
    }

    fn set_if_absent(&self, key: &str, value: StoredValue) -> Result<bool, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("connection refused".to_string()));
        }
        if self.fail_backfill.load(Ordering::SeqCst) {
            return Err(StoreError::WriteRejected {
                key: key.to_string(),
                reason: "read-only replica".to_string(),
            });
        }
        self.inner.set_if_absent(key, value)
    }

    fn set(&self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        self.inner.set(key, value)
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        if let Some(prefix) = self.fail_deletes_for.lock().as_deref() {
            if key.starts_with(prefix) {
                return Err(StoreError::DeleteFailed {
                    key: key.to_string(),
                    reason: "locked".to_string(),
                });
            }
        }
        self.inner.delete(key)
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        if self.fail_list.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("scan refused".to_string()));
        }
        self.inner.list_keys()
    }
}

#[test]
fn test_five_bucket_scenario() {
    let store = Arc::new(MemoryStore::new());
    let (tx, rx) = mpsc::channel();
    let report = Simulation::new(Arc::clone(&store), AppConfig::new("bucket:", 5))
        .unwrap()
        .with_seed(2024)
        .with_sink(move |tally: &Tally| {
            let _ = tx.send(*tally);
        })
        .run()
        .unwrap();

    assert_eq!(report.tally.hits + report.tally.misses, 15);
    assert_eq!(report.generator.probes, 15);
    assert_eq!(report.setup.created, 5);
    assert_eq!(rx.recv().unwrap(), report.tally);

    // Every miss backfilled a distinct key beyond the seed, and teardown
    // found all of them.
    assert_eq!(report.teardown.deleted, 5 + report.tally.misses);
    assert_eq!(report.teardown.failed, 0);
    assert!(store.is_empty());
}

#[test]
fn test_first_draw_beyond_seed_misses_then_hits() {
    let store = Arc::new(MemoryStore::new());
    let config = AppConfig::new("bucket:", 5);
    DatasetLifecycle::new(Arc::clone(&store), config.clone())
        .setup_data()
        .unwrap();

    let monitor = Arc::new(EventMonitor::new());
    let generator = WorkloadGenerator::new(Arc::clone(&store), monitor, &config);
    for index in 1..5 {
        assert_eq!(generator.probe(index), Event::Hit);
        assert_eq!(generator.probe(index), Event::Hit);
    }
    for index in 5..=15 {
        assert_eq!(generator.probe(index), Event::Miss);
        assert_eq!(generator.probe(index), Event::Hit);
        assert_eq!(generator.probe(index), Event::Hit);
    }
}

#[test]
fn test_misses_equal_distinct_unseeded_draws() {
    // Each key beyond the seed misses exactly once, so misses can never
    // exceed the number of unseeded keys in the draw range.
    for seed in 0..20 {
        let report = Simulation::new(Arc::new(MemoryStore::new()), AppConfig::new("b", 50))
            .unwrap()
            .with_seed(seed)
            .run()
            .unwrap();
        assert_eq!(report.tally.total(), 150);
        assert!(report.tally.misses <= 150 - 49);
    }
}

#[test]
fn test_teardown_completeness() {
    let store = Arc::new(MemoryStore::new());
    let config = AppConfig::new("hm:", 25);
    store.set("keep:1", StoredValue::Counter(1)).unwrap();

    Simulation::new(Arc::clone(&store), config.clone())
        .unwrap()
        .run()
        .unwrap();

    let remaining = store.list_keys().unwrap();
    assert!(remaining.iter().all(|key| !config.is_bucket_key(key)));
    assert_eq!(store.get(&config.hits_key()).unwrap(), None);
    assert_eq!(store.get(&config.misses_key()).unwrap(), None);
    assert_eq!(remaining, vec!["keep:1".to_string()]);
}

#[test]
fn test_backfill_failure_still_counts_miss() {
    let store = Arc::new(FaultyStore::new());
    let config = AppConfig::new("f:", 4);
    DatasetLifecycle::new(Arc::clone(&store), config.clone())
        .setup_data()
        .unwrap();
    store.fail_backfill.store(true, Ordering::SeqCst);

    let monitor = Arc::new(EventMonitor::new());
    let generator = WorkloadGenerator::new(Arc::clone(&store), Arc::clone(&monitor), &config);
    assert_eq!(generator.probe(10), Event::Miss);
    // Not backfilled, so it misses again
    assert_eq!(generator.probe(10), Event::Miss);

    let summary = generator.with_seed(5).run();
    assert_eq!(summary.probes, 12);
    assert_eq!(summary.backfill_failures, summary.misses);
    let events = monitor.wait_for_signal().drain_all();
    assert_eq!(events.len(), 13);
    assert_eq!(events.last(), Some(&Event::Shutdown));
}

#[test]
fn test_teardown_delete_failures_are_counted() {
    let store = Arc::new(FaultyStore::new());
    let config = AppConfig::new("d:", 10);
    let lifecycle = DatasetLifecycle::new(Arc::clone(&store), config.clone());
    lifecycle.setup_data().unwrap();
    *store.fail_deletes_for.lock() = Some("d:1".to_string());

    let summary = lifecycle.teardown_data();
    // d:1 fails; d:0 and d:2..=9 go
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.deleted, 9);
    assert_eq!(summary.accumulators_deleted, 2);
    assert!(store.inner.contains("d:1").unwrap());
}

#[test]
fn test_teardown_survives_failed_scan() {
    let store = Arc::new(FaultyStore::new());
    let config = AppConfig::new("l:", 3);
    let lifecycle = DatasetLifecycle::new(Arc::clone(&store), config);
    lifecycle.setup_data().unwrap();
    store.fail_list.store(true, Ordering::SeqCst);

    let summary = lifecycle.teardown_data();
    assert_eq!(summary.accumulators_deleted, 2);
    assert_eq!(summary.deleted, 0);
    assert_eq!(store.inner.len(), 3);
}

#[test]
fn test_unavailable_store_fails_before_workers() {
    let store = Arc::new(FaultyStore::new());
    store.unavailable.store(true, Ordering::SeqCst);

    let result = Simulation::new(Arc::clone(&store), AppConfig::new("u:", 3))
        .unwrap()
        .run();
    assert!(matches!(result, Err(Error::Store(StoreError::Unavailable(_)))));
    assert!(store.inner.is_empty());
}

#[test]
fn test_producer_panic_does_not_hang_consumer() {
    let store = Arc::new(FaultyStore::new());
    store.panic_on_get.store(true, Ordering::SeqCst);
    let (tx, rx) = mpsc::channel();

    let result = Simulation::new(Arc::clone(&store), AppConfig::new("p:", 3))
        .unwrap()
        .with_sink(move |tally: &Tally| {
            let _ = tx.send(*tally);
        })
        .run();

    assert!(matches!(result, Err(Error::WorkerPanicked("access"))));
    // The aggregator still terminated and reported an empty tally
    assert_eq!(rx.recv().unwrap(), Tally::default());
    // Teardown still ran
    assert!(store.inner.is_empty());
}

#[test]
fn test_preexisting_buckets_survive_setup() {
    let store = Arc::new(MemoryStore::new());
    store.set("e:2", Record::new(2, "original").into()).unwrap();

    let lifecycle = DatasetLifecycle::new(Arc::clone(&store), AppConfig::new("e:", 4));
    let summary = lifecycle.setup_data().unwrap();
    assert_eq!(summary.created, 3);
    assert_eq!(summary.preexisting, 1);
    assert_eq!(
        store.get("e:2").unwrap(),
        Some(StoredValue::Record(Record::new(2, "original")))
    );
}
