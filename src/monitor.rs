//! Event handoff between the workload generator and the statistics aggregator
//!
//! The producer and the consumer share exactly one [`EventMonitor`]: an
//! unbounded FIFO of [`Event`]s plus a "signal pending" flag, both guarded by
//! a single `parking_lot::Mutex`, and a `Condvar` bound to that same mutex.
//!
//! ```text
//!   producer                      EventMonitor                     consumer
//!                        ┌────────────────────────────┐
//!   push(Hit)  ──lock──▶ │ queue: [Hit, Miss, ...]    │
//!   push(Miss) ──lock──▶ │ signaled: true             │ ──wait──▶ wait_for_signal()
//!   push(Shutdown) ────▶ │        Mutex + Condvar     │           drain_all()
//!                        └────────────────────────────┘
//! ```
//!
//! # Signal discipline
//!
//! - `push` appends, sets the flag and notifies, all inside one critical section.
//! - `wait_for_signal` re-checks the flag after every wake, so a spurious wake
//!   goes straight back to sleep and a notify that happened before the consumer
//!   started waiting is never lost: the flag stays set until a drain clears it.
//! - `drain_all` takes the whole queue and clears the flag under the same lock,
//!   so every pushed event is returned by exactly one drain, in push order.
//!
//! Several pushes between two wakeups come back from a single drain. With a
//! single producer that pushes `Shutdown` last, the consumer therefore sees
//! every earlier event no later than the batch holding `Shutdown`.

use core::fmt;
use std::collections::VecDeque;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex, MutexGuard};

/// A classified probe, or the end-of-stream marker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Event {
    /// The probed key was present
    Hit,
    /// The probed key was absent
    Miss,
    /// No more events will follow
    Shutdown,
}

impl Event {
    /// Short uppercase name, used in logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::Hit => "HIT",
            Event::Miss => "MISS",
            Event::Shutdown => "SHUTDOWN",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Default)]
struct MonitorState {
    queue: VecDeque<Event>,
    signaled: bool,
}

/// Mutex-guarded event queue with a condition-signaled consumer wake.
///
/// Designed for one producer and one consumer; share it with `Arc`.
#[derive(Debug, Default)]
pub struct EventMonitor {
    state: Mutex<MonitorState>,
    signal: Condvar,
}

impl EventMonitor {
    /// Creates an empty, unsignaled monitor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `event`, sets the signal flag and wakes the consumer.
    pub fn push(&self, event: Event) {
        let mut state = self.state.lock();
        state.queue.push_back(event);
        state.signaled = true;
        self.signal.notify_one();
    }

    /// Appends a burst of events under one lock acquisition and one wake.
    ///
    /// An empty burst leaves the monitor untouched.
    pub fn push_all<I>(&self, events: I)
    where
        I: IntoIterator<Item = Event>,
    {
        let mut state = self.state.lock();
        let before = state.queue.len();
        state.queue.extend(events);
        if state.queue.len() > before {
            state.signaled = true;
            self.signal.notify_one();
        }
    }

    /// Blocks until the signal flag is set and returns with the lock held.
    pub fn wait_for_signal(&self) -> SignalGuard<'_> {
        let mut state = self.state.lock();
        while !state.signaled {
            self.signal.wait(&mut state);
        }
        SignalGuard { state }
    }

    /// Like [`wait_for_signal`](Self::wait_for_signal), but gives up after `timeout`.
    ///
    /// Returns `None` if the flag was still clear when the timeout elapsed.
    pub fn wait_for_signal_timeout(&self, timeout: Duration) -> Option<SignalGuard<'_>> {
        let deadline = Instant::now() + timeout;
        let mut state = self.state.lock();
        while !state.signaled {
            if self.signal.wait_until(&mut state, deadline).timed_out() && !state.signaled {
                return None;
            }
        }
        Some(SignalGuard { state })
    }

    /// Number of events pushed but not yet drained.
    pub fn pending(&self) -> usize {
        self.state.lock().queue.len()
    }

    /// Returns `true` if a wake is owed to the consumer.
    pub fn is_signaled(&self) -> bool {
        self.state.lock().signaled
    }
}

/// Proof that the signal flag was observed set; holds the monitor lock.
///
/// The lock is released when the guard is dropped, so drain and let it go
/// before processing the events.
pub struct SignalGuard<'a> {
    state: MutexGuard<'a, MonitorState>,
}

impl SignalGuard<'_> {
    /// Removes every queued event, in push order, and clears the signal flag.
    pub fn drain_all(&mut self) -> Vec<Event> {
        self.state.signaled = false;
        Vec::from(std::mem::take(&mut self.state.queue))
    }

    /// Number of events a drain would return right now.
    pub fn len(&self) -> usize {
        self.state.queue.len()
    }

    /// Returns `true` if a drain would return nothing.
    pub fn is_empty(&self) -> bool {
        self.state.queue.is_empty()
    }
}

impl fmt::Debug for SignalGuard<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignalGuard")
            .field("pending", &self.state.queue.len())
            .finish()
    }
}
