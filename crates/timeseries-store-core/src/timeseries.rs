//! Columnar in-memory representation of one series.
//!
//! A [`Timeseries`] holds a time index and three parallel columns (`value`,
//! `quality`, `write_timestamp`). It is built per request, either from raw
//! records at ingestion time or from a store read, and is never persisted as
//! an object: only its columns reach the on-disk table.
//!
//! Timestamps are kept as `i64` nanoseconds since the Unix epoch. How those
//! nanoseconds are interpreted is decided once per series by its
//! [`IndexZone`]:
//!
//! - [`IndexZone::Naive`]: wall-clock time, read as if it were UTC.
//! - [`IndexZone::Aware`]: UTC instants, displayed in the given offset.
//!
//! Quality is `NaN` when unknown. Ingestion never invents a quality; the
//! store substitutes full confidence at read time for legacy rows.

use std::{fmt, sync::Arc};

use chrono::{DateTime, FixedOffset, NaiveDateTime, Offset, Utc};
use snafu::prelude::*;

/// Errors raised while building or combining timeseries.
#[derive(Debug, Snafu, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum TimeseriesError {
    /// The input contained repeated timestamps.
    #[snafu(display("{count} duplicate timestamp(s) in input"))]
    DuplicateTimestamps {
        /// Number of records whose timestamp already appeared earlier.
        count: usize,
    },

    /// Naive and timezone-aware timestamps were mixed in one input.
    #[snafu(display("input mixes timezone-naive and timezone-aware timestamps"))]
    MixedAwareness,

    /// The four columns do not have the same length.
    #[snafu(display(
        "column lengths differ: index={index}, value={value}, quality={quality}, write_timestamp={write_timestamp}"
    ))]
    ColumnLengthMismatch {
        /// Length of the time index.
        index: usize,
        /// Length of the value column.
        value: usize,
        /// Length of the quality column.
        quality: usize,
        /// Length of the write-timestamp column.
        write_timestamp: usize,
    },

    /// A timestamp string could not be parsed.
    #[snafu(display("invalid timestamp '{input}' (expected ISO-8601)"))]
    InvalidTimestamp {
        /// The rejected input.
        input: String,
    },

    /// A timestamp cannot be represented as `i64` nanoseconds.
    #[snafu(display("timestamp '{input}' is out of the supported range"))]
    TimestampOutOfRange {
        /// The rejected timestamp, rendered for diagnostics.
        input: String,
    },

    /// Two different explicit timezones would end up in one table.
    #[snafu(display("cannot combine timestamps in {existing} with timestamps in {incoming}"))]
    ConflictingTimezones {
        /// Zone of the data already present.
        existing: IndexZone,
        /// Zone of the data being added.
        incoming: IndexZone,
    },

    /// A stored timezone label is not a fixed offset this crate understands.
    #[snafu(display("unsupported timezone '{timezone}'"))]
    UnsupportedTimezone {
        /// The timezone label found in the table schema.
        timezone: String,
    },
}

/// Result alias for timeseries construction.
pub type TimeseriesResult<T> = Result<T, TimeseriesError>;

/// Timezone awareness of a series' index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndexZone {
    /// Wall-clock timestamps without a timezone.
    #[default]
    Naive,
    /// UTC instants associated with a fixed offset.
    Aware(FixedOffset),
}

impl IndexZone {
    /// Aware, UTC.
    pub fn utc() -> Self {
        IndexZone::Aware(Utc.fix())
    }

    /// Whether this zone carries a timezone.
    pub fn is_aware(&self) -> bool {
        matches!(self, IndexZone::Aware(_))
    }

    /// Offset to add to stored nanoseconds to obtain local wall-clock time.
    pub fn offset_nanos(&self) -> i64 {
        match self {
            IndexZone::Naive => 0,
            IndexZone::Aware(offset) => i64::from(offset.local_minus_utc()) * NANOS_PER_SECOND,
        }
    }

    /// Timezone label used in the Arrow timestamp type.
    pub fn arrow_timezone(&self) -> Option<Arc<str>> {
        match self {
            IndexZone::Naive => None,
            IndexZone::Aware(offset) if offset.local_minus_utc() == 0 => Some(Arc::from("UTC")),
            IndexZone::Aware(offset) => Some(Arc::from(offset.to_string().as_str())),
        }
    }

    /// Inverse of [`IndexZone::arrow_timezone`].
    pub fn from_arrow_timezone(timezone: Option<&str>) -> TimeseriesResult<Self> {
        match timezone {
            None => Ok(IndexZone::Naive),
            Some("UTC" | "Z" | "Etc/UTC") => Ok(IndexZone::utc()),
            Some(label) => parse_fixed_offset(label).map(IndexZone::Aware).context(
                UnsupportedTimezoneSnafu {
                    timezone: label.to_string(),
                },
            ),
        }
    }
}

/// Parse `+HH:MM`, `-HH:MM` or `+HHMM`.
fn parse_fixed_offset(label: &str) -> Option<FixedOffset> {
    let (sign, rest) = match label.as_bytes().first()? {
        b'+' => (1, &label[1..]),
        b'-' => (-1, &label[1..]),
        _ => return None,
    };
    let (hours, minutes) = match rest.split_once(':') {
        Some(parts) => parts,
        None => (rest.get(..2)?, rest.get(2..)?),
    };
    let hours: i32 = hours.parse().ok()?;
    let minutes: i32 = minutes.parse().ok()?;
    if minutes >= 60 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

impl fmt::Display for IndexZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexZone::Naive => write!(f, "naive time"),
            IndexZone::Aware(offset) if offset.local_minus_utc() == 0 => write!(f, "UTC"),
            IndexZone::Aware(offset) => write!(f, "UTC{offset}"),
        }
    }
}

/// Nanoseconds in one second.
pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// A parsed input timestamp, before it is placed on a series index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RawTimestamp {
    /// Timestamp without timezone.
    Naive(NaiveDateTime),
    /// Timestamp with an explicit offset.
    Aware(DateTime<FixedOffset>),
}

impl RawTimestamp {
    /// Naive, or aware in the timestamp's own offset.
    pub fn zone(&self) -> IndexZone {
        match self {
            RawTimestamp::Naive(_) => IndexZone::Naive,
            RawTimestamp::Aware(dt) => IndexZone::Aware(*dt.offset()),
        }
    }

    /// The instant this timestamp denotes, reading naive values as UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            RawTimestamp::Naive(ndt) => ndt.and_utc(),
            RawTimestamp::Aware(dt) => dt.with_timezone(&Utc),
        }
    }

    fn to_nanos(self) -> TimeseriesResult<i64> {
        self.to_utc()
            .timestamp_nanos_opt()
            .ok_or_else(|| TimeseriesError::TimestampOutOfRange {
                input: match self {
                    RawTimestamp::Naive(ndt) => ndt.to_string(),
                    RawTimestamp::Aware(dt) => dt.to_rfc3339(),
                },
            })
    }
}

/// One input observation.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRecord {
    /// When the observation was made.
    pub timestamp: RawTimestamp,
    /// Observed value.
    pub value: f64,
    /// Confidence in `[0, 1]`; `None` means unknown.
    pub quality: Option<f64>,
    /// When the observation was persisted; `None` means "now".
    pub write_timestamp: Option<DateTime<Utc>>,
}

/// One row of a table as it is persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StoreRow {
    /// Index timestamp in nanoseconds (interpreted per [`IndexZone`]).
    pub timestamp: i64,
    /// Observed value.
    pub value: f64,
    /// Confidence; `NaN` when unknown.
    pub quality: f64,
    /// Write time as UTC nanoseconds.
    pub write_timestamp: i64,
}

/// Columnar series data: a time index plus value, quality and write-timestamp.
#[derive(Debug, Clone, Default)]
pub struct Timeseries {
    zone: IndexZone,
    index: Vec<i64>,
    value: Vec<f64>,
    quality: Vec<f64>,
    write_timestamp: Vec<i64>,
}

impl Timeseries {
    /// A zero-row, naive series.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A zero-row series in the given zone.
    pub fn empty_with_zone(zone: IndexZone) -> Self {
        Self {
            zone,
            ..Self::default()
        }
    }

    /// Build a series from its columns, checking that their lengths agree.
    ///
    /// Rows are taken as given; duplicate detection is an ingestion concern
    /// handled by [`Timeseries::from_raw`].
    pub fn from_columns(
        zone: IndexZone,
        index: Vec<i64>,
        value: Vec<f64>,
        quality: Vec<f64>,
        write_timestamp: Vec<i64>,
    ) -> TimeseriesResult<Self> {
        let n = index.len();
        if value.len() != n || quality.len() != n || write_timestamp.len() != n {
            return ColumnLengthMismatchSnafu {
                index: n,
                value: value.len(),
                quality: quality.len(),
                write_timestamp: write_timestamp.len(),
            }
            .fail();
        }
        Ok(Self {
            zone,
            index,
            value,
            quality,
            write_timestamp,
        })
    }

    /// Build a series from persisted rows, keeping their order.
    pub fn from_rows(zone: IndexZone, rows: impl IntoIterator<Item = StoreRow>) -> Self {
        let mut ts = Self::empty_with_zone(zone);
        for row in rows {
            ts.push_row(row);
        }
        ts
    }

    /// Build a series from raw input records.
    ///
    /// - Every record must agree on awareness. Aware records must also share
    ///   one offset, which becomes the series zone; instants are stored as
    ///   UTC nanoseconds either way.
    /// - A missing quality stays `NaN`; a missing write timestamp becomes the
    ///   current time (sampled once for the whole batch).
    /// - Repeated timestamps are rejected with the number of extra records.
    pub fn from_raw(records: impl IntoIterator<Item = RawRecord>) -> TimeseriesResult<Self> {
        let now = Utc::now();
        let now_nanos = now
            .timestamp_nanos_opt()
            .context(TimestampOutOfRangeSnafu {
                input: now.to_rfc3339(),
            })?;

        let mut zone: Option<IndexZone> = None;
        let mut ts = Self::empty();

        for record in records {
            let record_zone = record.timestamp.zone();
            match zone {
                None => zone = Some(record_zone),
                Some(prev) if prev.is_aware() != record_zone.is_aware() => {
                    return MixedAwarenessSnafu.fail();
                }
                Some(prev) if prev != record_zone => {
                    return ConflictingTimezonesSnafu {
                        existing: prev,
                        incoming: record_zone,
                    }
                    .fail();
                }
                Some(_) => {}
            }

            let write_timestamp = match record.write_timestamp {
                Some(wt) => wt
                    .timestamp_nanos_opt()
                    .context(TimestampOutOfRangeSnafu {
                        input: wt.to_rfc3339(),
                    })?,
                None => now_nanos,
            };

            ts.push_row(StoreRow {
                timestamp: record.timestamp.to_nanos()?,
                value: record.value,
                quality: record.quality.unwrap_or(f64::NAN),
                write_timestamp,
            });
        }

        ts.zone = zone.unwrap_or_default();

        let count = ts.duplicate_count();
        ensure!(count == 0, DuplicateTimestampsSnafu { count });
        Ok(ts)
    }

    fn push_row(&mut self, row: StoreRow) {
        self.index.push(row.timestamp);
        self.value.push(row.value);
        self.quality.push(row.quality);
        self.write_timestamp.push(row.write_timestamp);
    }

    /// Number of rows whose timestamp already appeared earlier in the index.
    pub fn duplicate_count(&self) -> usize {
        let mut sorted = self.index.clone();
        sorted.sort_unstable();
        sorted.windows(2).filter(|w| w[0] == w[1]).count()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the series has no rows.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Awareness of the index.
    pub fn zone(&self) -> IndexZone {
        self.zone
    }

    /// Index timestamps in nanoseconds.
    pub fn index(&self) -> &[i64] {
        &self.index
    }

    /// Value column.
    pub fn values(&self) -> &[f64] {
        &self.value
    }

    /// Quality column (`NaN` = unknown).
    pub fn qualities(&self) -> &[f64] {
        &self.quality
    }

    /// Write-timestamp column, UTC nanoseconds.
    pub fn write_timestamps(&self) -> &[i64] {
        &self.write_timestamp
    }

    /// Index timestamps as UTC instants (naive values read as UTC).
    pub fn timestamps_utc(&self) -> impl Iterator<Item = DateTime<Utc>> + '_ {
        self.index.iter().map(|ns| DateTime::from_timestamp_nanos(*ns))
    }

    /// Iterate rows in their current order.
    pub fn rows(&self) -> impl Iterator<Item = StoreRow> + '_ {
        (0..self.len()).map(|i| StoreRow {
            timestamp: self.index[i],
            value: self.value[i],
            quality: self.quality[i],
            write_timestamp: self.write_timestamp[i],
        })
    }

    /// Re-tag the index with another zone without touching the stored
    /// nanoseconds.
    ///
    /// This is only meaningful for the conversions [`normalize_awareness`]
    /// performs: naive values are read as UTC, aware values already are UTC
    /// instants.
    pub fn with_zone(mut self, zone: IndexZone) -> Self {
        self.zone = zone;
        self
    }

    /// Replace the value column.
    pub fn with_values(mut self, value: Vec<f64>) -> TimeseriesResult<Self> {
        ensure!(
            value.len() == self.len(),
            ColumnLengthMismatchSnafu {
                index: self.len(),
                value: value.len(),
                quality: self.quality.len(),
                write_timestamp: self.write_timestamp.len(),
            }
        );
        self.value = value;
        Ok(self)
    }

    /// Replace every `NaN` quality by `fill`; returns how many were replaced.
    pub fn fill_missing_quality(&mut self, fill: f64) -> usize {
        let mut replaced = 0;
        for q in self.quality.iter_mut().filter(|q| q.is_nan()) {
            *q = fill;
            replaced += 1;
        }
        replaced
    }

    /// Sort rows by timestamp (stable).
    pub fn sort_by_index(&mut self) {
        if self.is_sorted() {
            return;
        }
        let mut rows: Vec<StoreRow> = self.rows().collect();
        rows.sort_by_key(|r| r.timestamp);
        *self = Self::from_rows(self.zone, rows);
    }

    /// Whether the index is strictly increasing.
    pub fn is_sorted(&self) -> bool {
        self.index.windows(2).all(|w| w[0] < w[1])
    }
}

/// Decide the zone a table ends up in when `incoming` data meets `existing`
/// data.
///
/// - Same zone: unchanged.
/// - Naive meets aware: aware UTC.
/// - Two different explicit offsets: [`TimeseriesError::ConflictingTimezones`].
pub fn common_zone(existing: IndexZone, incoming: IndexZone) -> TimeseriesResult<IndexZone> {
    match (existing, incoming) {
        (a, b) if a == b => Ok(a),
        (IndexZone::Naive, IndexZone::Aware(_)) | (IndexZone::Aware(_), IndexZone::Naive) => {
            Ok(IndexZone::utc())
        }
        (existing, incoming) => ConflictingTimezonesSnafu { existing, incoming }.fail(),
    }
}

/// Bring two series onto one index zone (see [`common_zone`]).
///
/// Naive rows are read as UTC and aware rows keep their instant, so this only
/// re-tags the series. A series that is consistently naive stays naive.
pub fn normalize_awareness(
    existing: Timeseries,
    incoming: Timeseries,
) -> TimeseriesResult<(Timeseries, Timeseries)> {
    let zone = common_zone(existing.zone(), incoming.zone())?;
    Ok((existing.with_zone(zone), incoming.with_zone(zone)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn naive(y: i32, m: u32, d: u32, h: u32) -> RawTimestamp {
        let ndt = NaiveDate::from_ymd_opt(y, m, d)
            .and_then(|date| date.and_hms_opt(h, 0, 0))
            .expect("valid naive datetime");
        RawTimestamp::Naive(ndt)
    }

    fn record(ts: RawTimestamp, value: f64) -> RawRecord {
        RawRecord {
            timestamp: ts,
            value,
            quality: None,
            write_timestamp: None,
        }
    }

    #[test]
    fn from_raw_keeps_missing_quality_as_nan() -> TimeseriesResult<()> {
        let ts = Timeseries::from_raw(vec![
            record(naive(2020, 1, 1, 0), 1.0),
            RawRecord {
                quality: Some(0.5),
                ..record(naive(2020, 1, 1, 1), 2.0)
            },
        ])?;

        assert_eq!(ts.len(), 2);
        assert_eq!(ts.zone(), IndexZone::Naive);
        assert!(ts.qualities()[0].is_nan());
        assert_eq!(ts.qualities()[1], 0.5);
        Ok(())
    }

    #[test]
    fn from_raw_defaults_write_timestamp_to_now() -> TimeseriesResult<()> {
        let before = Utc::now().timestamp_nanos_opt().expect("in range");
        let explicit = Utc.with_ymd_and_hms(2019, 6, 1, 0, 0, 0).unwrap();
        let ts = Timeseries::from_raw(vec![
            record(naive(2020, 1, 1, 0), 1.0),
            RawRecord {
                write_timestamp: Some(explicit),
                ..record(naive(2020, 1, 1, 1), 2.0)
            },
        ])?;
        let after = Utc::now().timestamp_nanos_opt().expect("in range");

        let wt = ts.write_timestamps();
        assert!(wt[0] >= before && wt[0] <= after);
        assert_eq!(wt[1], explicit.timestamp_nanos_opt().expect("in range"));
        Ok(())
    }

    #[test]
    fn from_raw_counts_duplicates() {
        let err = Timeseries::from_raw(vec![
            record(naive(2020, 1, 1, 0), 1.0),
            record(naive(2020, 1, 1, 0), 2.0),
        ])
        .expect_err("duplicates must be rejected");
        assert_eq!(err, TimeseriesError::DuplicateTimestamps { count: 1 });

        let err = Timeseries::from_raw(vec![
            record(naive(2020, 1, 1, 0), 1.0),
            record(naive(2020, 1, 1, 1), 2.0),
            record(naive(2020, 1, 1, 0), 3.0),
            record(naive(2020, 1, 1, 0), 4.0),
            record(naive(2020, 1, 1, 1), 5.0),
        ])
        .expect_err("duplicates must be rejected");
        assert_eq!(err, TimeseriesError::DuplicateTimestamps { count: 3 });
    }

    #[test]
    fn from_raw_rejects_mixed_awareness() {
        let aware = RawTimestamp::Aware(
            FixedOffset::east_opt(3600)
                .expect("valid offset")
                .with_ymd_and_hms(2020, 1, 1, 2, 0, 0)
                .unwrap(),
        );
        let err = Timeseries::from_raw(vec![
            record(naive(2020, 1, 1, 0), 1.0),
            record(aware, 2.0),
        ])
        .expect_err("mixed awareness");
        assert_eq!(err, TimeseriesError::MixedAwareness);
    }

    #[test]
    fn from_raw_keeps_the_explicit_offset() -> TimeseriesResult<()> {
        let plus_one = FixedOffset::east_opt(3600).expect("valid offset");
        let ts = Timeseries::from_raw(vec![record(
            RawTimestamp::Aware(plus_one.with_ymd_and_hms(2020, 1, 1, 1, 0, 0).unwrap()),
            1.0,
        )])?;

        assert_eq!(ts.zone(), IndexZone::Aware(plus_one));
        let first = ts.timestamps_utc().next().expect("one row");
        assert_eq!(first, Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0).unwrap());
        Ok(())
    }

    #[test]
    fn from_raw_rejects_two_offsets_in_one_batch() {
        let at = |hours: i32, h: u32| {
            RawTimestamp::Aware(
                FixedOffset::east_opt(hours * 3600)
                    .expect("valid offset")
                    .with_ymd_and_hms(2020, 1, 1, h, 0, 0)
                    .unwrap(),
            )
        };
        let err = Timeseries::from_raw(vec![record(at(1, 1), 1.0), record(at(3, 5), 2.0)])
            .expect_err("two offsets");
        assert!(matches!(err, TimeseriesError::ConflictingTimezones { .. }));

        // `Z` and `+00:00` are the same zone.
        let utc = Timeseries::from_raw(vec![record(at(0, 1), 1.0), record(at(0, 2), 2.0)])
            .expect("one zone");
        assert_eq!(utc.zone(), IndexZone::utc());
    }

    #[test]
    fn from_columns_checks_lengths() {
        let err = Timeseries::from_columns(IndexZone::Naive, vec![1, 2], vec![1.0], vec![], vec![])
            .expect_err("length mismatch");
        assert!(matches!(err, TimeseriesError::ColumnLengthMismatch { index: 2, .. }));
    }

    #[test]
    fn empty_has_all_columns_and_no_rows() {
        let ts = Timeseries::empty();
        assert!(ts.is_empty());
        assert!(ts.values().is_empty());
        assert!(ts.qualities().is_empty());
        assert!(ts.write_timestamps().is_empty());
    }

    #[test]
    fn common_zone_rules() {
        let utc = IndexZone::utc();
        let plus_two = IndexZone::Aware(FixedOffset::east_opt(7200).expect("valid offset"));

        assert_eq!(common_zone(IndexZone::Naive, IndexZone::Naive), Ok(IndexZone::Naive));
        assert_eq!(common_zone(IndexZone::Naive, utc), Ok(utc));
        assert_eq!(common_zone(plus_two, IndexZone::Naive), Ok(utc));
        assert_eq!(common_zone(plus_two, plus_two), Ok(plus_two));
        assert!(matches!(
            common_zone(utc, plus_two),
            Err(TimeseriesError::ConflictingTimezones { .. })
        ));
    }

    #[test]
    fn normalize_awareness_retags_without_moving_instants() -> TimeseriesResult<()> {
        let existing = Timeseries::from_rows(
            IndexZone::Naive,
            [StoreRow {
                timestamp: 0,
                value: 1.0,
                quality: 1.0,
                write_timestamp: 0,
            }],
        );
        let incoming = Timeseries::from_rows(
            IndexZone::utc(),
            [StoreRow {
                timestamp: 3_600 * NANOS_PER_SECOND,
                value: 2.0,
                quality: 1.0,
                write_timestamp: 0,
            }],
        );

        let (a, b) = normalize_awareness(existing, incoming)?;
        assert_eq!(a.zone(), IndexZone::utc());
        assert_eq!(b.zone(), IndexZone::utc());
        assert_eq!(a.index(), &[0]);
        assert_eq!(b.index(), &[3_600 * NANOS_PER_SECOND]);
        Ok(())
    }

    #[test]
    fn arrow_timezone_labels_round_trip() -> TimeseriesResult<()> {
        let zones = [
            IndexZone::Naive,
            IndexZone::utc(),
            IndexZone::Aware(FixedOffset::east_opt(-5 * 3600).expect("valid offset")),
        ];
        for zone in zones {
            let label = zone.arrow_timezone();
            assert_eq!(IndexZone::from_arrow_timezone(label.as_deref())?, zone);
        }
        assert!(IndexZone::from_arrow_timezone(Some("Europe/Paris")).is_err());
        Ok(())
    }

    #[test]
    fn fill_missing_quality_is_idempotent() {
        let mut ts = Timeseries::from_columns(
            IndexZone::Naive,
            vec![1, 2, 3],
            vec![1.0, 2.0, 3.0],
            vec![f64::NAN, 0.5, f64::NAN],
            vec![0, 0, 0],
        )
        .expect("equal lengths");

        assert_eq!(ts.fill_missing_quality(1.0), 2);
        assert_eq!(ts.qualities(), &[1.0, 0.5, 1.0]);
        assert_eq!(ts.fill_missing_quality(1.0), 0);
    }

    #[test]
    fn sort_by_index_orders_rows() {
        let mut ts = Timeseries::from_columns(
            IndexZone::Naive,
            vec![3, 1, 2],
            vec![30.0, 10.0, 20.0],
            vec![1.0, 1.0, 1.0],
            vec![0, 0, 0],
        )
        .expect("equal lengths");
        assert!(!ts.is_sorted());

        ts.sort_by_index();
        assert!(ts.is_sorted());
        assert_eq!(ts.index(), &[1, 2, 3]);
        assert_eq!(ts.values(), &[10.0, 20.0, 30.0]);
    }
}
