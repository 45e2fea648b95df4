//! Service configuration.
//!
//! A deployment is described by one JSON file:
//!
//! ```json
//! { "storage": { "root": "/var/lib/tsstore" }, "catalog": "catalog.json" }
//! ```
//!
//! Relative paths are resolved against the directory of the configuration
//! file, so a config and its catalog can be moved together.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use snafu::{Backtrace, prelude::*};

/// Errors raised while loading configuration or catalog files.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    /// The file could not be read.
    #[snafu(display("Cannot read {path}: {source}"))]
    Read {
        /// File path.
        path: String,
        /// Underlying IO error.
        source: std::io::Error,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The file is not valid JSON for the expected shape.
    #[snafu(display("Cannot parse {path}: {source}"))]
    Parse {
        /// File path.
        path: String,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Result alias for configuration loading.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Where the store keeps its tables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root directory of the store; created on open if missing.
    pub root: PathBuf,
}

/// Configuration for opening a [`crate::service::TimeseriesService`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Storage backend configuration.
    pub storage: StorageConfig,

    /// Series catalog file. Without one, every identifier is unknown.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<PathBuf>,
}

impl ServiceConfig {
    /// Configuration with the given store root and no catalog.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            storage: StorageConfig { root: root.into() },
            catalog: None,
        }
    }

    /// Load a configuration file, resolving relative paths against its
    /// directory.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let path_str = path.display().to_string();
        let text = fs::read_to_string(path).context(ReadSnafu { path: &path_str })?;
        let mut config: ServiceConfig =
            serde_json::from_str(&text).context(ParseSnafu { path: path_str })?;

        let base = path.parent().unwrap_or(Path::new(""));
        config.storage.root = base.join(&config.storage.root);
        config.catalog = config.catalog.map(|c| base.join(c));
        Ok(config)
    }
}
