//! Application configuration consumed by the core.
//!
//! `AppConfig` has public fields for simple instantiation and mirrors the
//! `application` section of the JSON configuration file, so field names are
//! serialized in camelCase:
//!
//! ```json
//! {
//!     "bucketKeyPrefix": "hitormiss:bucket:",
//!     "initialNumberOfBuckets": 1000
//! }
//! ```
//!
//! The workload shape is derived from the bucket count rather than configured
//! separately; see [`WorkloadParams`].

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Number of probes issued per seeded bucket.
///
/// Probes draw from `[1, PROBE_MULTIPLIER * N]`, a range three times wider
/// than the seeded key space `[0, N)`. Keys beyond the seeded range miss on
/// their first draw and hit afterwards, which is what produces the mix of
/// hits and misses.
pub const PROBE_MULTIPLIER: u64 = 3;

const ACCUMULATOR_HITS_SUFFIX: &str = "accumulator:hits";
const ACCUMULATOR_MISSES_SUFFIX: &str = "accumulator:misses";

/// Configuration for one simulation run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    /// Prefix shared by every data bucket key (`{prefix}{index}`)
    pub bucket_key_prefix: String,
    /// Number of buckets seeded before the workload starts
    pub initial_number_of_buckets: usize,
    /// Key of the hits accumulator (defaults to `{prefix}accumulator:hits`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accumulator_key_for_hits: Option<String>,
    /// Key of the misses accumulator (defaults to `{prefix}accumulator:misses`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accumulator_key_for_misses: Option<String>,
}

impl AppConfig {
    /// Creates a configuration with default accumulator keys.
    pub fn new(bucket_key_prefix: impl Into<String>, initial_number_of_buckets: usize) -> Self {
        Self {
            bucket_key_prefix: bucket_key_prefix.into(),
            initial_number_of_buckets,
            accumulator_key_for_hits: None,
            accumulator_key_for_misses: None,
        }
    }

    /// Checks the invariants the core relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.bucket_key_prefix.is_empty() {
            return Err(ConfigError::EmptyPrefix);
        }
        if self.initial_number_of_buckets == 0 {
            return Err(ConfigError::ZeroBuckets);
        }

        let hits = self.hits_key();
        let misses = self.misses_key();
        for key in [&hits, &misses] {
            if self.is_bucket_key(key) {
                return Err(ConfigError::AccumulatorKeyCollision { key: key.clone() });
            }
        }
        if hits == misses {
            return Err(ConfigError::DuplicateAccumulatorKey { key: hits });
        }
        Ok(())
    }

    /// Store key for the bucket at `index`.
    pub fn bucket_key(&self, index: u64) -> String {
        format!("{}{}", self.bucket_key_prefix, index)
    }

    /// Returns `true` if `key` matches `^{prefix}\d+$`.
    pub fn is_bucket_key(&self, key: &str) -> bool {
        key.strip_prefix(self.bucket_key_prefix.as_str())
            .is_some_and(|rest| !rest.is_empty() && rest.bytes().all(|b| b.is_ascii_digit()))
    }

    /// Store key of the hits accumulator.
    pub fn hits_key(&self) -> String {
        self.accumulator_key_for_hits
            .clone()
            .unwrap_or_else(|| format!("{}{}", self.bucket_key_prefix, ACCUMULATOR_HITS_SUFFIX))
    }

    /// Store key of the misses accumulator.
    pub fn misses_key(&self) -> String {
        self.accumulator_key_for_misses
            .clone()
            .unwrap_or_else(|| format!("{}{}", self.bucket_key_prefix, ACCUMULATOR_MISSES_SUFFIX))
    }

    /// Workload shape derived from the bucket count.
    pub fn workload(&self) -> WorkloadParams {
        WorkloadParams::for_buckets(self.initial_number_of_buckets as u64)
    }
}

/// Shape of the generated workload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkloadParams {
    /// Keys seeded at setup, `[0, seeded_keys)`
    pub seeded_keys: u64,
    /// Probes issued by the generator; also the inclusive upper draw bound
    pub probe_count: u64,
}

impl WorkloadParams {
    /// Derives the workload for `buckets` seeded keys.
    pub fn for_buckets(buckets: u64) -> Self {
        Self {
            seeded_keys: buckets,
            probe_count: buckets.saturating_mul(PROBE_MULTIPLIER),
        }
    }

    /// Inclusive range keys are drawn from.
    pub fn draw_range(&self) -> (u64, u64) {
        (1, self.probe_count)
    }
}
