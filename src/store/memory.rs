//! In-process key-value store
//!
//! A thread-safe map using lock striping (segmented storage) with no eviction:
//! a key stays until it is deleted.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────┐
//! │                          MemoryStore                                 │
//! │                                                                      │
//! │  hash(key) % N  ──▶  Segment Selection                               │
//! │                                                                      │
//! │  ┌──────────────┐ ┌──────────────┐     ┌──────────────┐              │
//! │  │  Segment 0   │ │  Segment 1   │ ... │  Segment N-1 │              │
//! │  │   RwLock     │ │   RwLock     │     │   RwLock     │              │
//! │  │   HashMap    │ │   HashMap    │     │   HashMap    │              │
//! │  └──────────────┘ └──────────────┘     └──────────────┘              │
//! └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Lookups do not mutate anything, so each segment sits behind an `RwLock`
//! and concurrent `get`s on one segment do not serialize.

use core::fmt;
use core::hash::BuildHasher;

use parking_lot::RwLock;

#[cfg(feature = "hashbrown")]
use hashbrown::{DefaultHashBuilder, HashMap};

#[cfg(not(feature = "hashbrown"))]
use std::collections::{hash_map::RandomState as DefaultHashBuilder, HashMap};

use super::{KeyValueStore, StoredValue};
use crate::error::StoreError;

/// Default number of segments
const DEFAULT_SEGMENT_COUNT: usize = 16;

/// Thread-safe in-memory [`KeyValueStore`].
///
/// Every operation locks exactly one segment, except [`list_keys`](KeyValueStore::list_keys)
/// and [`len`](MemoryStore::len), which visit the segments one at a time and may
/// therefore return a slightly stale view under concurrent writes.
pub struct MemoryStore {
    segments: Box<[RwLock<HashMap<String, StoredValue>>]>,
    hash_builder: DefaultHashBuilder,
}

impl MemoryStore {
    /// Creates an empty store with the default segment count.
    pub fn new() -> Self {
        Self::with_segments(DEFAULT_SEGMENT_COUNT)
    }

    /// Creates an empty store with `segments` segments (at least one).
    pub fn with_segments(segments: usize) -> Self {
        let segments: Vec<_> = (0..segments.max(1))
            .map(|_| RwLock::new(HashMap::new()))
            .collect();

        Self {
            segments: segments.into_boxed_slice(),
            hash_builder: DefaultHashBuilder::default(),
        }
    }

    #[inline]
    fn segment(&self, key: &str) -> &RwLock<HashMap<String, StoredValue>> {
        let index = (self.hash_builder.hash_one(key) as usize) % self.segments.len();
        &self.segments[index]
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Total number of stored keys.
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.read().len()).sum()
    }

    /// Returns `true` if no key is stored.
    pub fn is_empty(&self) -> bool {
        self.segments.iter().all(|s| s.read().is_empty())
    }

    /// Removes every key.
    pub fn clear(&self) {
        for segment in self.segments.iter() {
            segment.write().clear();
        }
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("segments", &self.segments.len())
            .field("len", &self.len())
            .finish()
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError> {
        Ok(self.segment(key).read().get(key).cloned())
    }

    fn set_if_absent(&self, key: &str, value: StoredValue) -> Result<bool, StoreError> {
        let mut segment = self.segment(key).write();
        if segment.contains_key(key) {
            return Ok(false);
        }
        segment.insert(key.to_owned(), value);
        Ok(true)
    }

    fn set(&self, key: &str, value: StoredValue) -> Result<(), StoreError> {
        self.segment(key).write().insert(key.to_owned(), value);
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.segment(key).write().remove(key).is_some())
    }

    fn list_keys(&self) -> Result<Vec<String>, StoreError> {
        let mut keys = Vec::with_capacity(self.len());
        for segment in self.segments.iter() {
            keys.extend(segment.read().keys().cloned());
        }
        Ok(keys)
    }

    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.segment(key).read().contains_key(key))
    }
}
