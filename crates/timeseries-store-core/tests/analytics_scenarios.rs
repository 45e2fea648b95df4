//! Resampling, cross-series aggregation and unit conversion through the
//! identifier-level service.

use chrono::{DateTime, Utc};
use tempfile::TempDir;
use timeseries_store_core::{
    Aggregation, ErrorKind, SeriesCatalog, SeriesKey, SeriesLocation, SeriesStore, StoreLocation,
    TimeBucket, TimeseriesService, WireRecord, analytics, units, wire,
};

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn catalog() -> SeriesCatalog {
    let mut catalog = SeriesCatalog::new();
    for (id, unit) in [("a", None), ("b", None), ("empty", None), ("temp", Some("DegreeCelsius"))] {
        catalog.insert(
            id,
            SeriesLocation {
                partition: "plant".to_string(),
                key: SeriesKey::raw(id),
                unit: unit.map(str::to_string),
            },
        );
    }
    catalog
}

fn service(tmp: &TempDir) -> Result<TimeseriesService<SeriesCatalog>, Box<dyn std::error::Error>> {
    let store = SeriesStore::open(StoreLocation::local(tmp.path()))?;
    Ok(TimeseriesService::new(store, catalog()))
}

fn record(timestamp: String, value: f64, quality: Option<f64>) -> WireRecord {
    WireRecord {
        timestamp,
        value,
        quality,
        update_ts: None,
    }
}

fn minutes(minutes: impl IntoIterator<Item = u32>) -> Vec<WireRecord> {
    minutes
        .into_iter()
        .map(|m| {
            record(
                format!("2020-01-01T{:02}:{:02}:00", m / 60, m % 60),
                f64::from(m),
                Some(1.0),
            )
        })
        .collect()
}

fn hourly(values: &[f64]) -> Vec<WireRecord> {
    values
        .iter()
        .enumerate()
        .map(|(h, v)| record(format!("2020-01-01T{h:02}:00:00"), *v, Some(1.0)))
        .collect()
}

fn values<T>(rows: &[T], value: impl Fn(&T) -> f64) -> Vec<f64> {
    rows.iter().map(value).collect()
}

fn bound(s: &str) -> Result<Option<DateTime<Utc>>, Box<dyn std::error::Error>> {
    Ok(Some(wire::parse_bound(s)?))
}

#[test]
fn resampling_never_fills_gaps() -> TestResult {
    let tmp = TempDir::new()?;
    let svc = service(&tmp)?;
    svc.set("a", &minutes((0..10).chain(50..60)), None)?;

    let out = svc.resample("a", "1min", "mean", None, None, None)?;
    assert_eq!(out.len(), 20);
    assert_eq!(out[9].timestamp, "2020-01-01T00:09:00+00:00");
    assert_eq!(out[10].timestamp, "2020-01-01T00:50:00+00:00");

    let coarse = svc.resample("a", "15min", "sum", None, None, None)?;
    assert_eq!(
        coarse.iter().map(|r| r.timestamp.as_str()).collect::<Vec<_>>(),
        ["2020-01-01T00:00:00+00:00", "2020-01-01T00:45:00+00:00"]
    );
    assert_eq!(values(&coarse, |r| r.value), [45.0, 545.0]);
    Ok(())
}

#[test]
fn quality_is_averaged_whatever_the_value_aggregation() -> TestResult {
    let tmp = TempDir::new()?;
    let svc = service(&tmp)?;
    svc.set(
        "a",
        &[
            record("2020-01-01T00:00:00".into(), 1.0, Some(1.0)),
            record("2020-01-01T00:20:00".into(), 5.0, Some(0.5)),
            record("2020-01-01T00:40:00".into(), 3.0, Some(0.0)),
        ],
        None,
    )?;

    for (agg, expected) in [("sum", 9.0), ("mean", 3.0), ("max", 5.0), ("min", 1.0)] {
        let out = svc.resample("a", "1h", agg, None, None, None)?;
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].value, expected, "{agg}");
        assert_eq!(out[0].quality, Some(0.5), "{agg}");
    }
    Ok(())
}

#[test]
fn buckets_start_at_the_query_start() -> TestResult {
    let tmp = TempDir::new()?;
    let svc = service(&tmp)?;
    svc.set("a", &minutes([0, 20, 40, 60, 80]), None)?;

    let out = svc.resample("a", "1h", "sum", bound("2020-01-01T00:30:00")?, None, None)?;
    assert_eq!(values(&out, |r| r.value), [40.0 + 60.0 + 80.0]);
    assert_eq!(out[0].timestamp, "2020-01-01T00:30:00+00:00");
    Ok(())
}

#[test]
fn month_buckets_follow_the_calendar() -> TestResult {
    let tmp = TempDir::new()?;
    let svc = service(&tmp)?;
    let days = ["2020-01-15", "2020-01-31", "2020-02-01", "2020-02-29", "2020-03-01"];
    let records: Vec<_> = days
        .iter()
        .map(|d| record(d.to_string(), 1.0, None))
        .collect();
    svc.set("a", &records, None)?;

    let out = svc.resample("a", "1mo", "sum", None, None, None)?;
    assert_eq!(
        out.iter().map(|r| r.timestamp.as_str()).collect::<Vec<_>>(),
        [
            "2020-01-01T00:00:00+00:00",
            "2020-02-01T00:00:00+00:00",
            "2020-03-01T00:00:00+00:00"
        ]
    );
    assert_eq!(values(&out, |r| r.value), [2.0, 2.0, 1.0]);
    // Unknown quality is reported as legacy quality on read.
    assert_eq!(out[0].quality, Some(1.0));
    Ok(())
}

#[test]
fn aggregate_sum_and_mean_of_two_series() -> TestResult {
    let tmp = TempDir::new()?;
    let svc = service(&tmp)?;
    svc.set("a", &hourly(&[1.0, 1.0, 1.0, 1.0]), None)?;
    svc.set("b", &hourly(&[0.0, 0.0, 0.0, 0.0]), None)?;

    let sum = svc.aggregate(&["a", "b"], "1h", "mean", "sum", None, None)?;
    assert_eq!(values(&sum, |r| r.value), [1.0; 4]);

    let mean = svc.aggregate(&["a", "b"], "1h", "mean", "mean", None, None)?;
    assert_eq!(values(&mean, |r| r.value), [0.5; 4]);
    assert!(mean.iter().all(|r| r.quality == Some(1.0)));
    Ok(())
}

#[test]
fn aggregate_counts_coverage_and_duplicates() -> TestResult {
    let tmp = TempDir::new()?;
    let svc = service(&tmp)?;
    svc.set("a", &hourly(&[2.0, 2.0]), None)?;

    // A known series with no data lowers quality but not the values.
    let out = svc.aggregate(&["a", "empty"], "1h", "mean", "sum", None, None)?;
    assert_eq!(values(&out, |r| r.value), [2.0, 2.0]);
    assert_eq!(out[0].quality, Some(0.5));

    let doubled = svc.aggregate(&["a", "a"], "1h", "mean", "sum", None, None)?;
    assert_eq!(values(&doubled, |r| r.value), [4.0, 4.0]);

    let nothing = svc.aggregate(&["empty"], "1h", "mean", "sum", None, None)?;
    assert!(nothing.is_empty());
    Ok(())
}

#[test]
fn rejected_payloads_are_not_partially_applied() -> TestResult {
    let tmp = TempDir::new()?;
    let svc = service(&tmp)?;
    svc.set("a", &hourly(&[1.0]), None)?;

    let mut dup = hourly(&[5.0, 6.0]);
    dup.push(record("2020-01-01T01:00:00".into(), 7.0, None));
    let err = svc.set("a", &dup, None).expect_err("duplicate timestamps");
    assert_eq!(err.kind(), ErrorKind::Validation);
    assert_eq!(err.reason(), "duplicate_timestamps");

    let mixed = vec![
        record("2020-01-01T05:00:00".into(), 1.0, None),
        record("2020-01-01T06:00:00Z".into(), 1.0, None),
    ];
    assert_eq!(
        svc.set("a", &mixed, None).expect_err("mixed").reason(),
        "mixed_awareness"
    );

    let stored = svc.get("a", None, None, None)?;
    assert_eq!(values(&stored, |r| r.value), [1.0]);
    Ok(())
}

#[test]
fn a_second_explicit_offset_is_a_configuration_error() -> TestResult {
    let tmp = TempDir::new()?;
    let svc = service(&tmp)?;
    svc.set("a", &[record("2020-01-01T01:00:00+01:00".into(), 1.0, None)], None)?;

    let err = svc
        .set("a", &[record("2020-01-01T05:00:00+03:00".into(), 2.0, None)], None)
        .expect_err("second offset");
    assert_eq!(err.kind(), ErrorKind::Configuration);
    assert_eq!(err.reason(), "conflicting_timezones");

    let mixed = [
        record("2020-01-01T02:00:00+01:00".into(), 3.0, None),
        record("2020-01-01T06:00:00+03:00".into(), 4.0, None),
    ];
    assert_eq!(
        svc.set("a", &mixed, None).expect_err("mixed offsets").reason(),
        "conflicting_timezones"
    );

    let stored = svc.get("a", None, None, None)?;
    assert_eq!(values(&stored, |r| r.value), [1.0]);
    assert_eq!(stored[0].timestamp, "2020-01-01T00:00:00+00:00");
    Ok(())
}

#[test]
fn unit_conversion_commutes_with_mean() -> TestResult {
    let readings: Vec<_> = [12.5, 13.0, 19.25, -4.0, 0.0, 21.5]
        .iter()
        .enumerate()
        .map(|(i, v)| {
            record(
                format!("2020-01-01T00:{:02}:00", i * 10),
                *v,
                Some(1.0),
            )
        })
        .collect();
    let celsius = wire::load(&readings)?;
    let bucket: TimeBucket = "30min".parse()?;

    let converted_first = celsius
        .clone()
        .with_values(units::convert(celsius.values(), "DegreeCelsius", "DegreeFahrenheit")?)?;
    let a = analytics::resample(&converted_first, bucket, Aggregation::Mean, None)?;

    let resampled_first = analytics::resample(&celsius, bucket, Aggregation::Mean, None)?;
    let b = units::convert(resampled_first.values(), "DegreeCelsius", "DegreeFahrenheit")?;

    assert_eq!(a.len(), b.len());
    for (x, y) in a.values().iter().zip(&b) {
        assert!((x - y).abs() < 1e-9, "{x} vs {y}");
    }
    Ok(())
}

#[test]
fn resample_converts_after_aggregating() -> TestResult {
    let tmp = TempDir::new()?;
    let svc = service(&tmp)?;
    svc.set("temp", &hourly(&[0.0, 100.0]), None)?;

    let out = svc.resample("temp", "1d", "mean", None, None, Some("DegreeFahrenheit"))?;
    assert_eq!(out.len(), 1);
    assert!((out[0].value - 122.0).abs() < 1e-9);
    Ok(())
}
