//! Row-level merge rules applied under the store lock.

use std::collections::BTreeMap;

use super::range::TimeRange;
use crate::timeseries::{StoreRow, Timeseries, TimeseriesResult, normalize_awareness};

/// Merge `incoming` into `existing`; incoming rows win on equal timestamps.
///
/// Both sides are brought onto one zone first (see [`normalize_awareness`]).
/// The result is sorted and free of duplicate timestamps.
pub(crate) fn upsert(existing: Timeseries, incoming: Timeseries) -> TimeseriesResult<Timeseries> {
    let (existing, incoming) = normalize_awareness(existing, incoming)?;
    let zone = existing.zone();

    let mut rows: BTreeMap<i64, StoreRow> = existing.rows().map(|r| (r.timestamp, r)).collect();
    for row in incoming.rows() {
        rows.insert(row.timestamp, row);
    }
    Ok(Timeseries::from_rows(zone, rows.into_values()))
}

/// Drop rows inside `range`; returns the remaining rows and how many were dropped.
pub(crate) fn remove_range(existing: &Timeseries, range: TimeRange) -> (Timeseries, usize) {
    let kept = Timeseries::from_rows(
        existing.zone(),
        existing.rows().filter(|r| !range.contains(r.timestamp)),
    );
    let removed = existing.len() - kept.len();
    (kept, removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeseries::{IndexZone, TimeseriesError};
    use chrono::FixedOffset;

    fn series(zone: IndexZone, rows: &[(i64, f64)]) -> Timeseries {
        Timeseries::from_rows(
            zone,
            rows.iter().map(|&(timestamp, value)| StoreRow {
                timestamp,
                value,
                quality: 1.0,
                write_timestamp: 0,
            }),
        )
    }

    #[test]
    fn upsert_replaces_colliding_rows_and_keeps_the_rest() -> TimeseriesResult<()> {
        let existing = series(IndexZone::Naive, &[(1, 1.0), (2, 2.0), (3, 3.0)]);
        let incoming = series(IndexZone::Naive, &[(4, 40.0), (2, 20.0), (0, 0.5)]);

        let merged = upsert(existing, incoming)?;
        assert_eq!(merged.index(), &[0, 1, 2, 3, 4]);
        assert_eq!(merged.values(), &[0.5, 1.0, 20.0, 3.0, 40.0]);
        assert_eq!(merged.zone(), IndexZone::Naive);
        Ok(())
    }

    #[test]
    fn upsert_is_idempotent() -> TimeseriesResult<()> {
        let rows = [(3, 3.0), (1, 1.0)];
        let once = upsert(Timeseries::empty(), series(IndexZone::Naive, &rows))?;
        let twice = upsert(once.clone(), series(IndexZone::Naive, &rows))?;
        assert_eq!(once.index(), twice.index());
        assert_eq!(once.values(), twice.values());
        Ok(())
    }

    #[test]
    fn upsert_promotes_naive_table_to_utc() -> TimeseriesResult<()> {
        let merged = upsert(
            series(IndexZone::Naive, &[(1, 1.0)]),
            series(IndexZone::utc(), &[(2, 2.0)]),
        )?;
        assert_eq!(merged.zone(), IndexZone::utc());
        assert_eq!(merged.index(), &[1, 2]);
        Ok(())
    }

    #[test]
    fn upsert_rejects_conflicting_offsets() {
        let plus_one = IndexZone::Aware(FixedOffset::east_opt(3600).expect("valid offset"));
        let err = upsert(
            series(IndexZone::utc(), &[(1, 1.0)]),
            series(plus_one, &[(2, 2.0)]),
        )
        .expect_err("conflicting offsets");
        assert!(matches!(err, TimeseriesError::ConflictingTimezones { .. }));
    }

    #[test]
    fn remove_range_reports_removed_rows() {
        let ts = series(IndexZone::Naive, &[(1, 1.0), (2, 2.0), (3, 3.0)]);
        let (kept, removed) = remove_range(
            &ts,
            TimeRange {
                start: Some(2),
                end: None,
            },
        );
        assert_eq!(removed, 2);
        assert_eq!(kept.index(), &[1]);

        let (kept, removed) = remove_range(
            &ts,
            TimeRange {
                start: Some(10),
                end: Some(20),
            },
        );
        assert_eq!(removed, 0);
        assert_eq!(kept.len(), 3);
    }
}
