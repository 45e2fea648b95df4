//! Wire records and the mapping between them and [`Timeseries`].
//!
//! [`WireRecord`] is what the API adapter receives and returns for raw data;
//! [`AggregatedRecord`] is the shape of resampled and aggregated output. The
//! mapping is total and fixed:
//!
//! | wire field  | series column     |
//! |-------------|-------------------|
//! | `timestamp` | index             |
//! | `value`     | `value`           |
//! | `quality`   | `quality` (`null` ⇔ `NaN`) |
//! | `update_ts` | `write_timestamp` |
//!
//! Output timestamps are always RFC 3339 with an explicit `+00:00` offset,
//! whatever the awareness of the series they come from.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::timeseries::{
    InvalidTimestampSnafu, RawRecord, RawTimestamp, Timeseries, TimeseriesResult,
};

/// One raw observation as exchanged with the API adapter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WireRecord {
    /// ISO-8601 timestamp, with or without offset.
    pub timestamp: String,
    /// Observed value.
    pub value: f64,
    /// Confidence in `[0, 1]`, or `null` when unknown.
    #[serde(default)]
    pub quality: Option<f64>,
    /// When the value was written (ISO-8601); defaults to "now" on write.
    #[serde(default)]
    pub update_ts: Option<String>,
}

/// One resampled or aggregated bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    /// Bucket start, RFC 3339 UTC.
    pub timestamp: String,
    /// Aggregated value.
    pub value: f64,
    /// Mean quality of the bucket, or `null` when unknown.
    pub quality: Option<f64>,
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse an ISO-8601 timestamp.
///
/// Strings carrying an offset (`Z`, `+02:00`) are aware; strings without one
/// (`2017-01-01T00:00:00`, `2017-01-01 00:00:00`, `2017-01-01`) are naive.
pub fn parse_timestamp(input: &str) -> TimeseriesResult<RawTimestamp> {
    let s = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(RawTimestamp::Aware(dt));
    }
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f%:z") {
        return Ok(RawTimestamp::Aware(dt));
    }
    for fmt in NAIVE_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(RawTimestamp::Naive(ndt));
        }
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(RawTimestamp::Naive(date.and_time(NaiveTime::MIN)));
    }

    InvalidTimestampSnafu { input: s }.fail()
}

/// Parse a query bound. Naive bounds are read as UTC.
pub fn parse_bound(input: &str) -> TimeseriesResult<DateTime<Utc>> {
    parse_timestamp(input).map(|ts| ts.to_utc())
}

/// Render nanoseconds since the epoch as RFC 3339 with `+00:00`.
pub fn format_utc(nanos: i64) -> String {
    DateTime::from_timestamp_nanos(nanos).to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

impl WireRecord {
    /// Parse into a [`RawRecord`].
    pub fn to_raw(&self) -> TimeseriesResult<RawRecord> {
        let write_timestamp = match &self.update_ts {
            Some(s) => Some(parse_bound(s)?),
            None => None,
        };
        Ok(RawRecord {
            timestamp: parse_timestamp(&self.timestamp)?,
            value: self.value,
            quality: self.quality,
            write_timestamp,
        })
    }
}

/// Ingest wire records into a validated [`Timeseries`].
///
/// Fails on unparsable timestamps, mixed awareness, and duplicate
/// timestamps; nothing is written anywhere by this function.
pub fn load(records: &[WireRecord]) -> TimeseriesResult<Timeseries> {
    let raw = records
        .iter()
        .map(WireRecord::to_raw)
        .collect::<TimeseriesResult<Vec<_>>>()?;
    Timeseries::from_raw(raw)
}

fn quality_out(q: f64) -> Option<f64> {
    if q.is_nan() { None } else { Some(q) }
}

/// Serialize a series back into wire records, in row order.
pub fn dump(ts: &Timeseries) -> Vec<WireRecord> {
    ts.rows()
        .map(|row| WireRecord {
            timestamp: format_utc(row.timestamp),
            value: row.value,
            quality: quality_out(row.quality),
            update_ts: Some(format_utc(row.write_timestamp)),
        })
        .collect()
}

/// Serialize a resampled or aggregated series.
pub fn dump_aggregated(ts: &Timeseries) -> Vec<AggregatedRecord> {
    ts.rows()
        .map(|row| AggregatedRecord {
            timestamp: format_utc(row.timestamp),
            value: row.value,
            quality: quality_out(row.quality),
        })
        .collect()
}
