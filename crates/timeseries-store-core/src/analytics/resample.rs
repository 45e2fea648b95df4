use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use snafu::prelude::*;

use super::{Aggregation, AnalyticsResult, BucketOutOfRangeSnafu};
use crate::time_bucket::{BucketGrid, TimeBucket};
use crate::timeseries::{StoreRow, Timeseries};

/// Reduce every non-empty bucket of `ts` on `grid` to one row keyed by the
/// bucket start.
///
/// Values go through `aggregation`, quality is always averaged, and the
/// write timestamp is the latest one seen in the bucket.
pub(super) fn bucketize(
    ts: &Timeseries,
    grid: &BucketGrid,
    aggregation: Aggregation,
) -> AnalyticsResult<BTreeMap<i64, StoreRow>> {
    let mut groups: BTreeMap<i64, Vec<StoreRow>> = BTreeMap::new();
    for row in ts.rows() {
        let start = grid
            .bucket_start(row.timestamp)
            .context(BucketOutOfRangeSnafu)?;
        groups.entry(start).or_default().push(row);
    }

    Ok(groups
        .into_iter()
        .map(|(start, rows)| {
            let reduced = StoreRow {
                timestamp: start,
                value: aggregation.reduce(rows.iter().map(|r| r.value)),
                quality: Aggregation::Mean.reduce(rows.iter().map(|r| r.quality)),
                write_timestamp: rows.iter().map(|r| r.write_timestamp).max().unwrap_or_default(),
            };
            (start, reduced)
        })
        .collect())
}

/// Resample `ts` into buckets of width `bucket`.
///
/// Buckets are left-closed and anchored at `origin` when given (typically
/// the query start), otherwise at local midnight (or the first of the month)
/// of the earliest row. Only buckets holding at least one row are returned:
/// there is no upsampling and no gap filling.
pub fn resample(
    ts: &Timeseries,
    bucket: TimeBucket,
    aggregation: Aggregation,
    origin: Option<DateTime<Utc>>,
) -> AnalyticsResult<Timeseries> {
    let Some(&first) = ts.index().iter().min() else {
        return Ok(Timeseries::empty_with_zone(ts.zone()));
    };
    let grid = BucketGrid::new(bucket, ts.zone(), origin, first).context(BucketOutOfRangeSnafu)?;
    let buckets = bucketize(ts, &grid, aggregation)?;
    Ok(Timeseries::from_rows(ts.zone(), buckets.into_values()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analytics::AnalyticsError;
    use crate::timeseries::{IndexZone, NANOS_PER_SECOND};
    use chrono::TimeZone;

    const MINUTE: i64 = 60 * NANOS_PER_SECOND;

    fn minutes(points: &[(i64, f64, f64)]) -> Timeseries {
        Timeseries::from_rows(
            IndexZone::Naive,
            points.iter().map(|&(m, value, quality)| StoreRow {
                timestamp: m * MINUTE,
                value,
                quality,
                write_timestamp: m,
            }),
        )
    }

    #[test]
    fn resample_does_not_fill_gaps() {
        // Minutes 0..10, then a 40-minute gap, then minutes 50..60.
        let points: Vec<_> = (0..10)
            .chain(50..60)
            .map(|m| (m, m as f64, 1.0))
            .collect();
        let ts = minutes(&points);

        let out = resample(&ts, TimeBucket::Minutes(1), Aggregation::Mean, None).unwrap();
        assert_eq!(out.len(), 20);
        assert!(out.index().iter().all(|t| !(10 * MINUTE..50 * MINUTE).contains(t)));
    }

    #[test]
    fn resample_averages_quality_whatever_the_aggregation() {
        let ts = minutes(&[(0, 1.0, 1.0), (20, 2.0, 0.5), (70, 5.0, 0.25)]);
        let out = resample(&ts, TimeBucket::Hours(1), Aggregation::Sum, None).unwrap();

        assert_eq!(out.index(), &[0, 60 * MINUTE]);
        assert_eq!(out.values(), &[3.0, 5.0]);
        assert_eq!(out.qualities(), &[0.75, 0.25]);
        assert_eq!(out.write_timestamps(), &[20, 70]);

        let out = resample(&ts, TimeBucket::Hours(1), Aggregation::Max, None).unwrap();
        assert_eq!(out.values(), &[2.0, 5.0]);
    }

    #[test]
    fn resample_anchors_at_origin() {
        let ts = minutes(&[(5, 1.0, 1.0), (14, 2.0, 1.0), (15, 3.0, 1.0)]);
        let origin = Utc.timestamp_opt(5 * 60, 0).unwrap();
        let out = resample(&ts, TimeBucket::Minutes(10), Aggregation::Sum, Some(origin)).unwrap();
        assert_eq!(out.index(), &[5 * MINUTE, 15 * MINUTE]);
        assert_eq!(out.values(), &[3.0, 3.0]);
    }

    #[test]
    fn resample_month_buckets() {
        let day = 24 * 60;
        // 1970-01-10, 1970-01-31, 1970-02-01, 1970-03-15
        let ts = minutes(&[
            (9 * day, 1.0, 1.0),
            (30 * day, 2.0, 1.0),
            (31 * day, 4.0, 1.0),
            (73 * day, 8.0, 1.0),
        ]);
        let out = resample(&ts, TimeBucket::Months(1), Aggregation::Sum, None).unwrap();
        assert_eq!(out.index(), &[0, 31 * day * MINUTE, 59 * day * MINUTE]);
        assert_eq!(out.values(), &[3.0, 4.0, 8.0]);
    }

    #[test]
    fn resample_rejects_buckets_wider_than_the_timestamp_range() {
        let ts = minutes(&[(0, 1.0, 1.0), (1, 2.0, 1.0), (2, 3.0, 1.0)]);
        let err = resample(&ts, TimeBucket::Days(200_000), Aggregation::Sum, None).unwrap_err();
        assert!(matches!(err, AnalyticsError::BucketOutOfRange));
    }

    #[test]
    fn resample_empty_keeps_zone() {
        let ts = Timeseries::empty_with_zone(IndexZone::utc());
        let out = resample(&ts, TimeBucket::Days(1), Aggregation::Mean, None).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.zone(), IndexZone::utc());
    }
}
