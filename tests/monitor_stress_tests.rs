//! Stress Tests for the Event Monitor
//!
//! These tests run a real producer thread against a real aggregator thread
//! and check that no event is lost, that `Shutdown` always comes last, and
//! that the consumer never outlives its producer.

use hitormiss::{AggregatorState, Event, EventMonitor, StatisticsAggregator, Tally};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

const EVENTS: usize = 100_000;

fn event_for(i: usize) -> Event {
    if i % 3 == 0 {
        Event::Hit
    } else {
        Event::Miss
    }
}

fn expected_tally(n: usize) -> Tally {
    let hits = (0..n).filter(|i| i % 3 == 0).count() as u64;
    Tally {
        hits,
        misses: n as u64 - hits,
    }
}

/// Every push is counted exactly once, however the wakes fall
#[test]
fn stress_no_lost_events() {
    let monitor = Arc::new(EventMonitor::new());
    let consumer = {
        let aggregator = StatisticsAggregator::new(Arc::clone(&monitor));
        thread::spawn(move || aggregator.run())
    };

    let producer = {
        let monitor = Arc::clone(&monitor);
        thread::spawn(move || {
            for i in 0..EVENTS {
                monitor.push(event_for(i));
            }
            monitor.push(Event::Shutdown);
        })
    };

    producer.join().expect("producer panicked");
    let tally = consumer.join().expect("consumer panicked");
    assert_eq!(tally, expected_tally(EVENTS));
    assert_eq!(monitor.pending(), 0);
}

/// Mixed single pushes and bursts still add up
#[test]
fn stress_bursty_producer() {
    let monitor = Arc::new(EventMonitor::new());
    let consumer = {
        let aggregator = StatisticsAggregator::new(Arc::clone(&monitor));
        thread::spawn(move || aggregator.run())
    };

    let mut pushed = 0usize;
    for round in 0..1_000 {
        if round % 2 == 0 {
            let burst: Vec<Event> = (pushed..pushed + round % 17).map(event_for).collect();
            pushed += burst.len();
            monitor.push_all(burst);
        } else {
            monitor.push(event_for(pushed));
            pushed += 1;
        }
        if round % 100 == 0 {
            thread::yield_now();
        }
    }
    monitor.push(Event::Shutdown);

    let tally = consumer.join().expect("consumer panicked");
    assert_eq!(tally, expected_tally(pushed));
}

/// The consumer sees every earlier event no later than the Shutdown batch
#[test]
fn stress_shutdown_is_observed_last() {
    for _ in 0..50 {
        let monitor = Arc::new(EventMonitor::new());
        let consumer = {
            let monitor = Arc::clone(&monitor);
            thread::spawn(move || {
                let mut seen = Vec::new();
                loop {
                    let batch = monitor.wait_for_signal().drain_all();
                    let done = batch.contains(&Event::Shutdown);
                    seen.extend(batch);
                    if done {
                        return seen;
                    }
                }
            })
        };

        for i in 0..1_000 {
            monitor.push(event_for(i));
        }
        monitor.push(Event::Shutdown);

        let seen = consumer.join().expect("consumer panicked");
        assert_eq!(seen.len(), 1_001);
        assert_eq!(seen.last(), Some(&Event::Shutdown));
        assert!(seen[..1_000].iter().all(|e| *e != Event::Shutdown));
        let expected: Vec<Event> = (0..1_000).map(event_for).collect();
        assert_eq!(&seen[..1_000], expected.as_slice());
    }
}

/// Wakes are batched, never lost: each drain holds at least one event,
/// and a missing event is a failure however the drains fall
#[test]
fn stress_slow_consumer_batches() {
    let monitor = Arc::new(EventMonitor::new());
    let consumer = {
        let monitor = Arc::clone(&monitor);
        thread::spawn(move || {
            let mut aggregator = StatisticsAggregator::new(monitor);
            while aggregator.step() != AggregatorState::Terminated {
                thread::sleep(Duration::from_millis(1));
            }
            (aggregator.tally(), aggregator.batches())
        })
    };

    for i in 0..5_000 {
        monitor.push(event_for(i));
    }
    monitor.push(Event::Shutdown);

    let (tally, batches) = consumer.join().expect("consumer panicked");
    assert_eq!(tally, expected_tally(5_000));
    assert!((1..=5_001).contains(&batches));
}

/// A consumer waiting with a timeout does not mistake the timeout for shutdown
#[test]
fn stress_timeout_is_not_shutdown() {
    let monitor = Arc::new(EventMonitor::new());
    let consumer = {
        let monitor = Arc::clone(&monitor);
        thread::spawn(move || {
            let mut timeouts = 0;
            let mut counted = 0;
            loop {
                match monitor.wait_for_signal_timeout(Duration::from_millis(2)) {
                    None => timeouts += 1,
                    Some(mut guard) => {
                        let batch = guard.drain_all();
                        drop(guard);
                        counted += batch.iter().filter(|e| **e != Event::Shutdown).count();
                        if batch.contains(&Event::Shutdown) {
                            return (counted, timeouts);
                        }
                    }
                }
            }
        })
    };

    thread::sleep(Duration::from_millis(20));
    for i in 0..10 {
        monitor.push(event_for(i));
    }
    monitor.push(Event::Shutdown);

    let (counted, timeouts) = consumer.join().expect("consumer panicked");
    assert_eq!(counted, 10);
    assert!(timeouts > 0);
}
