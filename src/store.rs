//! Key-value store seam
//!
//! The core talks to its backing store only through [`KeyValueStore`]. A key
//! is either absent or holds exactly one [`StoredValue`]; presence alone
//! decides whether a probe is a hit or a miss.
//!
//! | Operation | Returns |
//! |-----------|---------|
//! | `get` | the value, or `None` when absent |
//! | `set_if_absent` | `true` if the value was created |
//! | `set` | unconditional overwrite |
//! | `delete` | `true` if a value existed and was removed |
//! | `list_keys` | every key currently stored |
//!
//! Implementations must be safe to call from several threads at once.
//! [`MemoryStore`] is the in-process implementation.

use core::fmt;

use uuid::Uuid;

use crate::error::StoreError;

pub mod memory;

pub use self::memory::MemoryStore;

/// A data bucket: the key index it was created for and an opaque value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Record {
    /// Index of the bucket key this record lives under
    pub key: u64,
    /// Opaque payload
    pub value: String,
}

impl Record {
    /// Creates a record with the given value.
    pub fn new(key: u64, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }

    /// Creates a record carrying a freshly generated random value.
    pub fn with_random_value(key: u64) -> Self {
        Self {
            key,
            value: Uuid::new_v4().to_string(),
        }
    }
}

/// What a store key can hold
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StoredValue {
    /// A data bucket
    Record(Record),
    /// An accumulator counter
    Counter(u64),
}

impl From<Record> for StoredValue {
    fn from(record: Record) -> Self {
        StoredValue::Record(record)
    }
}

/// Thread-safe keyed storage used by the generator and dataset lifecycle.
pub trait KeyValueStore: Send + Sync + fmt::Debug {
    /// Looks up `key`.
    fn get(&self, key: &str) -> Result<Option<StoredValue>, StoreError>;

    /// Stores `value` under `key` only if the key is absent.
    fn set_if_absent(&self, key: &str, value: StoredValue) -> Result<bool, StoreError>;

    /// Stores `value` under `key`, replacing any existing value.
    fn set(&self, key: &str, value: StoredValue) -> Result<(), StoreError>;

    /// Removes `key`.
    fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Lists every stored key, in no particular order.
    fn list_keys(&self) -> Result<Vec<String>, StoreError>;

    /// Returns `true` if `key` holds a value.
    fn contains(&self, key: &str) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }
}
