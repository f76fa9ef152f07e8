//! Configuration file loading and command line overrides

use hitormiss::AppConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Errors raised while loading the configuration file
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    /// The file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid JSON or misses required fields
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Top-level layout of the JSON configuration file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimConfig {
    /// Settings consumed by the core
    pub application: AppConfig,
}

/// Values given on the command line, applied on top of the file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    /// Replacement bucket key prefix (`--prefix`)
    pub prefix: Option<String>,
    /// Replacement bucket count (`--buckets`)
    pub buckets: Option<usize>,
}

impl SimConfig {
    /// Reads and parses the file at `path`.
    pub fn load(path: &Path) -> Result<Self, SettingsError> {
        let text = fs::read_to_string(path).map_err(|source| SettingsError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| SettingsError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads `path` if present; with no file, both overrides must be given.
    ///
    /// Returns `Ok(None)` when there is no file and the overrides alone are
    /// not a complete configuration.
    pub fn resolve(path: &Path, overrides: &Overrides) -> Result<Option<Self>, SettingsError> {
        let base = if path.exists() {
            Some(Self::load(path)?)
        } else {
            match (&overrides.prefix, overrides.buckets) {
                (Some(prefix), Some(buckets)) => Some(Self {
                    application: AppConfig::new(prefix.clone(), buckets),
                }),
                _ => None,
            }
        };
        Ok(base.map(|config| config.with_overrides(overrides)))
    }

    /// Replaces any field the overrides set.
    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(prefix) = &overrides.prefix {
            self.application.bucket_key_prefix = prefix.clone();
        }
        if let Some(buckets) = overrides.buckets {
            self.application.initial_number_of_buckets = buckets;
        }
        self
    }
}
