//! Error types and SNAFU context selectors for the series store.
//!
//! Every variant that concerns a specific table carries its path so messages
//! point at the file on disk.

use arrow::error::ArrowError;
use chrono::{DateTime, Utc};
use parquet::errors::ParquetError;
use snafu::prelude::*;

use crate::{storage::StorageError, timeseries::TimeseriesError};

/// Errors from [`crate::store::SeriesStore`] operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StoreError {
    /// The store root cannot be used (missing permissions, not a directory).
    #[snafu(display("Invalid store location {location}: {source}"))]
    InvalidLocation {
        /// The configured store root.
        location: String,
        /// Underlying storage error.
        source: StorageError,
    },

    /// Storage error while accessing a table file.
    #[snafu(display("Storage error while accessing table data: {source}"))]
    Storage {
        /// Underlying storage error while reading or writing table data.
        source: StorageError,
    },

    /// A partition or series name was empty.
    #[snafu(display("Partition and series names must not be empty"))]
    EmptyAddress,

    /// Parquet decoding failed.
    #[snafu(display("Parquet read error in {path}: {source}"))]
    ParquetRead {
        /// Table path.
        path: String,
        /// Underlying Parquet error.
        source: ParquetError,
    },

    /// Parquet encoding failed.
    #[snafu(display("Parquet write error for {path}: {source}"))]
    ParquetWrite {
        /// Table path.
        path: String,
        /// Underlying Parquet error.
        source: ParquetError,
    },

    /// Arrow compute or conversion error while building or filtering batches.
    #[snafu(display("Arrow error for {path}: {source}"))]
    Arrow {
        /// Table path.
        path: String,
        /// Underlying Arrow error.
        source: ArrowError,
    },

    /// A table file does not have the expected columns or types.
    #[snafu(display("Corrupt table {path}: {message}"))]
    CorruptTable {
        /// Table path.
        path: String,
        /// What is wrong with it.
        message: String,
    },

    /// The incoming rows cannot be combined with the stored ones.
    #[snafu(display("Cannot merge into {path}: {source}"))]
    Awareness {
        /// Table path.
        path: String,
        /// The awareness or timezone conflict.
        source: TimeseriesError,
    },

    /// A query bound cannot be represented as `i64` nanoseconds.
    #[snafu(display("Timestamp conversion overflow (value: {timestamp})"))]
    TimeConversionOverflow {
        /// The offending bound.
        timestamp: DateTime<Utc>,
    },
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
