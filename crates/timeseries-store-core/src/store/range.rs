//! Half-open time ranges over stored nanoseconds.

use chrono::{DateTime, Utc};
use snafu::prelude::*;

use super::error::{StoreResult, TimeConversionOverflowSnafu};

/// `[start, end)` in stored nanoseconds; a missing bound is unbounded.
///
/// Naive series store wall-clock time read as UTC, so UTC bounds compare
/// directly against both naive and aware indexes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TimeRange {
    pub(crate) start: Option<i64>,
    pub(crate) end: Option<i64>,
}

impl TimeRange {
    pub(crate) const ALL: TimeRange = TimeRange {
        start: None,
        end: None,
    };

    pub(crate) fn from_bounds(
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> StoreResult<Self> {
        Ok(Self {
            start: start.map(to_nanos).transpose()?,
            end: end.map(to_nanos).transpose()?,
        })
    }

    pub(crate) fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    pub(crate) fn contains(&self, ts: i64) -> bool {
        self.start.is_none_or(|s| ts >= s) && self.end.is_none_or(|e| ts < e)
    }
}

fn to_nanos(timestamp: DateTime<Utc>) -> StoreResult<i64> {
    timestamp
        .timestamp_nanos_opt()
        .context(TimeConversionOverflowSnafu { timestamp })
}
