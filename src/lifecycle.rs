//! Seeding and teardown of the bucket key space and accumulator records.

use std::sync::Arc;

use tracing::{error, info, warn};

use crate::config::AppConfig;
use crate::error::StoreError;
use crate::store::{KeyValueStore, Record, StoredValue};

/// What `setup_data` found and created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetupSummary {
    /// Buckets created by this setup
    pub created: u64,
    /// Buckets that already existed and were left untouched
    pub preexisting: u64,
}

/// What `teardown_data` removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TeardownSummary {
    /// Bucket keys deleted
    pub deleted: u64,
    /// Bucket keys that could not be deleted
    pub failed: u64,
    /// Accumulator keys deleted (0 to 2)
    pub accumulators_deleted: u64,
}

/// Creates and removes the data a simulation run works on.
#[derive(Debug)]
pub struct DatasetLifecycle<S> {
    store: Arc<S>,
    config: AppConfig,
}

impl<S: KeyValueStore> DatasetLifecycle<S> {
    /// Creates a lifecycle for `config`'s key space in `store`.
    pub fn new(store: Arc<S>, config: AppConfig) -> Self {
        Self { store, config }
    }

    /// Seeds buckets `0..N` without clobbering existing ones, then resets
    /// both accumulators to zero.
    pub fn setup_data(&self) -> Result<SetupSummary, StoreError> {
        let buckets = self.config.initial_number_of_buckets as u64;
        info!(buckets, "Creating buckets to start with");

        let mut summary = SetupSummary::default();
        for index in 0..buckets {
            let key = self.config.bucket_key(index);
            if self
                .store
                .set_if_absent(&key, Record::with_random_value(index).into())?
            {
                summary.created += 1;
            } else {
                summary.preexisting += 1;
            }
        }
        if summary.preexisting > 0 {
            warn!(
                preexisting = summary.preexisting,
                "Some buckets already existed and were kept"
            );
        }

        self.store
            .set(&self.config.hits_key(), StoredValue::Counter(0))?;
        self.store
            .set(&self.config.misses_key(), StoredValue::Counter(0))?;

        Ok(summary)
    }

    /// Deletes both accumulators and every key matching `^{prefix}\d+$`.
    ///
    /// Best effort: a key that cannot be deleted is logged and counted, and
    /// the remaining deletions still run.
    pub fn teardown_data(&self) -> TeardownSummary {
        let mut summary = TeardownSummary::default();

        for key in [self.config.misses_key(), self.config.hits_key()] {
            if self.delete_key(&key) {
                summary.accumulators_deleted += 1;
            }
        }

        let keys = match self.store.list_keys() {
            Ok(keys) => keys,
            Err(e) => {
                error!(error = %e, "Failed to list keys; no buckets deleted");
                Vec::new()
            }
        };
        for key in keys.iter().filter(|key| self.config.is_bucket_key(key)) {
            if self.delete_key(key) {
                summary.deleted += 1;
            } else {
                summary.failed += 1;
            }
        }

        info!(deleted = summary.deleted, "Buckets deleted OK");
        info!(failed = summary.failed, "Buckets failed to be deleted");
        summary
    }

    fn delete_key(&self, key: &str) -> bool {
        match self.store.delete(key) {
            Ok(true) => true,
            Ok(false) => {
                error!(key, "Failed to delete bucket: key not found");
                false
            }
            Err(e) => {
                error!(key, error = %e, "Failed to delete bucket");
                false
            }
        }
    }
}
