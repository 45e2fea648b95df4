use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use snafu::prelude::*;

use super::resample::bucketize;
use super::{
    Aggregation, AlignmentSnafu, AnalyticsResult, BucketOutOfRangeSnafu, EmptySeriesListSnafu,
};
use crate::time_bucket::{BucketGrid, TimeBucket};
use crate::timeseries::{IndexZone, StoreRow, Timeseries, common_zone};

/// Combine several series bucket by bucket.
///
/// Each series is first resampled with `resampling` on one shared grid
/// (anchored at `origin`, or at the earliest row of any series). Then, for
/// every bucket present in at least one series:
///
/// - `value` is `operation` over the series that have the bucket. A missing
///   series contributes nothing, which for `sum` is the same as adding 0 and
///   for `mean` leaves it out of the count.
/// - `quality` is the sum of the present per-series qualities divided by the
///   number of input series, so partial coverage lowers the result.
///
/// The same series may appear several times; each occurrence counts.
pub fn aggregate(
    series: &[Timeseries],
    bucket: TimeBucket,
    resampling: Aggregation,
    operation: Aggregation,
    origin: Option<DateTime<Utc>>,
) -> AnalyticsResult<Timeseries> {
    ensure!(!series.is_empty(), EmptySeriesListSnafu);

    let zone = series
        .iter()
        .filter(|ts| !ts.is_empty())
        .try_fold(None, |acc: Option<IndexZone>, ts| match acc {
            None => Ok(Some(ts.zone())),
            Some(zone) => common_zone(zone, ts.zone()).map(Some),
        })
        .context(AlignmentSnafu)?;
    let Some(zone) = zone else {
        return Ok(Timeseries::empty_with_zone(series[0].zone()));
    };

    let first = series
        .iter()
        .filter_map(|ts| ts.index().iter().min().copied())
        .min()
        .unwrap_or_default();
    let grid = BucketGrid::new(bucket, zone, origin, first).context(BucketOutOfRangeSnafu)?;

    let resampled = series
        .iter()
        .map(|ts| bucketize(ts, &grid, resampling))
        .collect::<AnalyticsResult<Vec<_>>>()?;

    let mut by_bucket: BTreeMap<i64, Vec<StoreRow>> = BTreeMap::new();
    for buckets in resampled {
        for (start, row) in buckets {
            by_bucket.entry(start).or_default().push(row);
        }
    }

    let n_series = series.len() as f64;
    let rows = by_bucket.into_iter().map(|(start, rows)| {
        let quality_sum: f64 = rows.iter().map(|r| r.quality).filter(|q| !q.is_nan()).sum();
        StoreRow {
            timestamp: start,
            value: operation.reduce(rows.iter().map(|r| r.value)),
            quality: quality_sum / n_series,
            write_timestamp: rows.iter().map(|r| r.write_timestamp).max().unwrap_or_default(),
        }
    });
    Ok(Timeseries::from_rows(zone, rows))
}
