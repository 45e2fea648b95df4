use serde::{Deserialize, Serialize};

use crate::timeseries::Timeseries;
use crate::wire::format_utc;

/// Summary of the rows of a series within a query range.
///
/// Serializes to `{"count": 0}` when there are no rows.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SeriesStats {
    /// Number of rows.
    pub count: usize,
    /// First timestamp (RFC 3339 UTC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    /// Last timestamp (RFC 3339 UTC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    /// Most recent write timestamp (RFC 3339 UTC).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_ts: Option<String>,
}

/// Compute [`SeriesStats`] for `ts`.
pub fn stats(ts: &Timeseries) -> SeriesStats {
    SeriesStats {
        count: ts.len(),
        start_time: ts.index().iter().min().copied().map(format_utc),
        end_time: ts.index().iter().max().copied().map(format_utc),
        update_ts: ts.write_timestamps().iter().max().copied().map(format_utc),
    }
}
