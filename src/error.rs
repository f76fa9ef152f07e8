//! Error types for the hit/miss core.
//!
//! Store failures and configuration problems each get their own enum so that
//! callers can tell a precondition failure (store unavailable, bad config)
//! apart from a worker that died mid-run.

use thiserror::Error;

/// Result type alias using the crate [`Error`] type
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by a [`KeyValueStore`](crate::store::KeyValueStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// The store cannot be reached at all
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A write for a single key was rejected
    #[error("write rejected for key '{key}': {reason}")]
    WriteRejected { key: String, reason: String },

    /// A delete for a single key could not be carried out
    #[error("delete failed for key '{key}': {reason}")]
    DeleteFailed { key: String, reason: String },
}

/// Problems found while validating an [`AppConfig`](crate::config::AppConfig).
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// The bucket key prefix is empty
    #[error("bucket key prefix must not be empty")]
    EmptyPrefix,

    /// No buckets were requested
    #[error("initial number of buckets must be greater than zero")]
    ZeroBuckets,

    /// An accumulator key would be picked up by the bucket key scan
    #[error("accumulator key '{key}' collides with the bucket key pattern")]
    AccumulatorKeyCollision { key: String },

    /// Both accumulators were given the same key
    #[error("hits and misses accumulators share the key '{key}'")]
    DuplicateAccumulatorKey { key: String },
}

/// Errors that can end a simulation run
#[derive(Error, Debug)]
pub enum Error {
    /// Store error surfaced before or after the worker threads ran
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// The OS refused to start a worker thread
    #[error("failed to spawn the {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },

    /// A worker thread panicked before finishing its role
    #[error("the {0} thread panicked")]
    WorkerPanicked(&'static str),
}
