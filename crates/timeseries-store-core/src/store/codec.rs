//! Parquet encoding of series tables.
//!
//! A table file holds a single Arrow schema:
//!
//! | column            | type                              | nullable |
//! |-------------------|-----------------------------------|----------|
//! | `timestamp`       | `Timestamp(Nanosecond, zone)`     | no       |
//! | `value`           | `Float64`                         | no       |
//! | `quality`         | `Float64`                         | yes      |
//! | `write_timestamp` | `Timestamp(Nanosecond, "UTC")`    | no       |
//!
//! The timezone of the `timestamp` column records the series' awareness
//! (`None` for naive). Unknown quality is written as null; tables written
//! before quality tracking may lack the column or hold `NaN`, and both decode
//! to `NaN`.

use std::sync::Arc;

use arrow::array::{
    Array, ArrayRef, BooleanArray, Float64Array, RecordBatch, RecordBatchReader, Scalar,
    TimestampNanosecondArray,
};
use arrow::compute::filter_record_batch;
use arrow::compute::kernels::{boolean as boolean_kernels, cmp as cmp_kernels};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use bytes::Bytes;
use log::warn;
use parquet::arrow::{ArrowWriter, arrow_reader::ParquetRecordBatchReaderBuilder};
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use snafu::prelude::*;

use super::error::{
    ArrowSnafu, AwarenessSnafu, CorruptTableSnafu, ParquetReadSnafu, ParquetWriteSnafu,
    StoreError, StoreResult,
};
use super::range::TimeRange;
use crate::timeseries::{IndexZone, Timeseries};

pub(crate) const TIMESTAMP_COLUMN: &str = "timestamp";
pub(crate) const VALUE_COLUMN: &str = "value";
pub(crate) const QUALITY_COLUMN: &str = "quality";
pub(crate) const WRITE_TIMESTAMP_COLUMN: &str = "write_timestamp";

const WRITE_TIMESTAMP_TZ: &str = "UTC";

/// Arrow schema of a table in the given zone.
pub(crate) fn table_schema(zone: IndexZone) -> SchemaRef {
    Arc::new(Schema::new(vec![
        Field::new(
            TIMESTAMP_COLUMN,
            DataType::Timestamp(TimeUnit::Nanosecond, zone.arrow_timezone()),
            false,
        ),
        Field::new(VALUE_COLUMN, DataType::Float64, false),
        Field::new(QUALITY_COLUMN, DataType::Float64, true),
        Field::new(
            WRITE_TIMESTAMP_COLUMN,
            DataType::Timestamp(TimeUnit::Nanosecond, Some(Arc::from(WRITE_TIMESTAMP_TZ))),
            false,
        ),
    ]))
}

/// Encode a whole table into an in-memory Parquet file.
pub(crate) fn encode(ts: &Timeseries, path: &str) -> StoreResult<Vec<u8>> {
    let schema = table_schema(ts.zone());

    let timestamp = TimestampNanosecondArray::from(ts.index().to_vec())
        .with_timezone_opt(ts.zone().arrow_timezone());
    let value = Float64Array::from(ts.values().to_vec());
    let quality = Float64Array::from(
        ts.qualities()
            .iter()
            .map(|q| (!q.is_nan()).then_some(*q))
            .collect::<Vec<_>>(),
    );
    let write_timestamp = TimestampNanosecondArray::from(ts.write_timestamps().to_vec())
        .with_timezone(WRITE_TIMESTAMP_TZ);

    let columns: Vec<ArrayRef> = vec![
        Arc::new(timestamp),
        Arc::new(value),
        Arc::new(quality),
        Arc::new(write_timestamp),
    ];
    let batch = RecordBatch::try_new(schema.clone(), columns).context(ArrowSnafu { path })?;

    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer =
        ArrowWriter::try_new(Vec::new(), schema, Some(props)).context(ParquetWriteSnafu { path })?;
    writer.write(&batch).context(ParquetWriteSnafu { path })?;
    writer.into_inner().context(ParquetWriteSnafu { path })
}

/// Decode a table file, keeping only rows inside `range`.
///
/// Rows come back in file order; tables are written sorted, and a file that
/// is not is re-sorted here.
pub(crate) fn decode(bytes: Vec<u8>, path: &str, range: TimeRange) -> StoreResult<Timeseries> {
    let builder = ParquetRecordBatchReaderBuilder::try_new(Bytes::from(bytes))
        .context(ParquetReadSnafu { path })?;
    let reader = builder.build().context(ParquetReadSnafu { path })?;

    let schema = reader.schema();
    let ts_idx = column_index(&schema, TIMESTAMP_COLUMN, path)?;
    let value_idx = column_index(&schema, VALUE_COLUMN, path)?;
    let write_idx = column_index(&schema, WRITE_TIMESTAMP_COLUMN, path)?;
    let quality_idx = schema.index_of(QUALITY_COLUMN).ok();

    let zone = match schema.field(ts_idx).data_type() {
        DataType::Timestamp(TimeUnit::Nanosecond, tz) => {
            IndexZone::from_arrow_timezone(tz.as_deref()).context(AwarenessSnafu { path })?
        }
        other => {
            return CorruptTableSnafu {
                path,
                message: format!("column {TIMESTAMP_COLUMN} has type {other:?}"),
            }
            .fail();
        }
    };

    let mut index = Vec::new();
    let mut value = Vec::new();
    let mut quality = Vec::new();
    let mut write_timestamp = Vec::new();

    for batch in reader {
        let batch = batch.context(ArrowSnafu { path })?;
        let batch = if range.is_unbounded() {
            batch
        } else {
            filter_range(&batch, ts_idx, range, path)?
        };
        if batch.num_rows() == 0 {
            continue;
        }

        let ts_arr = timestamps(&batch, ts_idx, TIMESTAMP_COLUMN, path)?;
        index.extend(ts_arr.values().iter().copied());

        value.extend(floats(&batch, value_idx, VALUE_COLUMN, path)?.iter().map(nan_if_null));

        match quality_idx {
            Some(idx) => {
                quality.extend(floats(&batch, idx, QUALITY_COLUMN, path)?.iter().map(nan_if_null));
            }
            None => quality.extend(std::iter::repeat_n(f64::NAN, batch.num_rows())),
        }

        let wt_arr = timestamps(&batch, write_idx, WRITE_TIMESTAMP_COLUMN, path)?;
        write_timestamp.extend(wt_arr.values().iter().copied());
    }

    let mut ts = Timeseries::from_columns(zone, index, value, quality, write_timestamp)
        .context(AwarenessSnafu { path })?;
    if !ts.is_sorted() {
        warn!("table {path} is not sorted by timestamp; sorting on read");
        ts.sort_by_index();
    }
    Ok(ts)
}

fn nan_if_null(v: Option<f64>) -> f64 {
    v.unwrap_or(f64::NAN)
}

fn column_index(schema: &Schema, column: &str, path: &str) -> StoreResult<usize> {
    schema.index_of(column).map_err(|_| StoreError::CorruptTable {
        path: path.to_string(),
        message: format!("missing column {column}"),
    })
}

/// A timestamp column that must not hold nulls.
fn timestamps<'a>(
    batch: &'a RecordBatch,
    idx: usize,
    column: &str,
    path: &str,
) -> StoreResult<&'a TimestampNanosecondArray> {
    let arr = batch
        .column(idx)
        .as_any()
        .downcast_ref::<TimestampNanosecondArray>()
        .ok_or_else(|| StoreError::CorruptTable {
            path: path.to_string(),
            message: format!("column {column} is not a nanosecond timestamp"),
        })?;
    ensure!(
        arr.null_count() == 0,
        CorruptTableSnafu {
            path,
            message: format!("column {column} contains nulls"),
        }
    );
    Ok(arr)
}

fn floats<'a>(
    batch: &'a RecordBatch,
    idx: usize,
    column: &str,
    path: &str,
) -> StoreResult<&'a Float64Array> {
    batch
        .column(idx)
        .as_any()
        .downcast_ref::<Float64Array>()
        .ok_or_else(|| StoreError::CorruptTable {
            path: path.to_string(),
            message: format!("column {column} is not Float64"),
        })
}

/// Keep rows with `start <= timestamp < end`.
///
/// Bounds are compared through 1-element scalars carrying the column's own
/// timezone, since the comparison kernels require identical data types on
/// both sides.
fn filter_range(
    batch: &RecordBatch,
    ts_idx: usize,
    range: TimeRange,
    path: &str,
) -> StoreResult<RecordBatch> {
    let ts_arr = timestamps(batch, ts_idx, TIMESTAMP_COLUMN, path)?;
    let tz_opt = match ts_arr.data_type() {
        DataType::Timestamp(_, tz_opt) => tz_opt.clone(),
        _ => None,
    };
    let bound = |v: i64| {
        Scalar::new(TimestampNanosecondArray::from(vec![v]).with_timezone_opt(tz_opt.clone()))
    };

    let mut mask: Option<BooleanArray> = None;
    if let Some(start) = range.start {
        mask = Some(cmp_kernels::gt_eq(ts_arr, &bound(start)).context(ArrowSnafu { path })?);
    }
    if let Some(end) = range.end {
        let lt_mask = cmp_kernels::lt(ts_arr, &bound(end)).context(ArrowSnafu { path })?;
        mask = Some(match mask {
            Some(ge_mask) => {
                boolean_kernels::and(&ge_mask, &lt_mask).context(ArrowSnafu { path })?
            }
            None => lt_mask,
        });
    }

    match mask {
        Some(mask) => filter_record_batch(batch, &mask).context(ArrowSnafu { path }),
        None => Ok(batch.clone()),
    }
}
