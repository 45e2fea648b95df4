//! Read-only mapping from external series identifiers to store addresses.
//!
//! The metadata layer that owns this mapping is not part of this crate;
//! [`SeriesResolver`] is the seam it plugs into. [`SeriesCatalog`] is a
//! simple in-memory implementation, loadable from a JSON file:
//!
//! ```json
//! {
//!   "series": {
//!     "sensor-1": { "partition": "site-a", "key": "t1", "unit": "DegreeCelsius" },
//!     "sensor-1-clean": { "partition": "site-a", "key": "t1", "variant": "clean" }
//!   }
//! }
//! ```

use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};

use crate::config::{ConfigResult, ParseSnafu, ReadSnafu};
use crate::store::SeriesKey;
use snafu::prelude::*;

/// Where a series lives, and in which unit its values are stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesLocation {
    /// Partition holding the series table.
    pub partition: String,
    /// Table key within the partition.
    #[serde(flatten)]
    pub key: SeriesKey,
    /// Native unit of the stored values, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Resolves external identifiers to series locations.
pub trait SeriesResolver {
    /// `None` when the identifier is unknown.
    fn resolve_series(&self, identifier: &str) -> Option<SeriesLocation>;
}

/// In-memory catalog keyed by identifier.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesCatalog {
    /// Identifier to location.
    #[serde(default)]
    pub series: BTreeMap<String, SeriesLocation>,
}

impl SeriesCatalog {
    /// An empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an identifier.
    pub fn insert(&mut self, identifier: impl Into<String>, location: SeriesLocation) {
        self.series.insert(identifier.into(), location);
    }

    /// Load a catalog from a JSON file.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let path_str = path.display().to_string();
        let text = fs::read_to_string(path).context(ReadSnafu { path: &path_str })?;
        serde_json::from_str(&text).context(ParseSnafu { path: path_str })
    }
}

impl SeriesResolver for SeriesCatalog {
    fn resolve_series(&self, identifier: &str) -> Option<SeriesLocation> {
        self.series.get(identifier).cloned()
    }
}
