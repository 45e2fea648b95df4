//! Series addressing inside a partition.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Logical variant of a series.
///
/// The cleaned variant is stored next to the raw one under the same name and
/// never touches the raw table.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Variant {
    /// Data as received.
    #[default]
    #[serde(rename = "raw")]
    Raw,
    /// Post-processed data.
    #[serde(rename = "clean")]
    Cleaned,
}

impl Variant {
    /// Tag used in table file names and in serialized catalogs.
    pub fn tag(self) -> &'static str {
        match self {
            Variant::Raw => "raw",
            Variant::Cleaned => "clean",
        }
    }

    /// Inverse of [`Variant::tag`].
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "raw" => Some(Variant::Raw),
            "clean" => Some(Variant::Cleaned),
            _ => None,
        }
    }
}

/// Identifies one table within a partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SeriesKey {
    /// Series name.
    #[serde(rename = "key")]
    pub name: String,
    /// Which variant of the series.
    #[serde(default)]
    pub variant: Variant,
}

impl SeriesKey {
    /// Key of the raw variant.
    pub fn raw(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: Variant::Raw,
        }
    }

    /// Key of the cleaned variant.
    pub fn cleaned(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variant: Variant::Cleaned,
        }
    }
}

impl fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.variant {
            Variant::Raw => f.write_str(&self.name),
            other => write!(f, "{}@{}", self.name, other.tag()),
        }
    }
}
