//! Identifier-level operations, as called by an API adapter.
//!
//! [`TimeseriesService`] resolves external identifiers through a
//! [`SeriesResolver`], reads and writes through a [`SeriesStore`], and runs
//! the analytics functions on what it reads. All request validation
//! (identifiers, units, frequencies, aggregation names, record payloads)
//! happens before the store is touched, so a rejected request never changes
//! stored data.
//!
//! Errors are classified with [`ServiceError::kind`] and carry a stable
//! machine-readable [`ServiceError::reason`] for adapters to map onto their
//! own status codes.

use std::fmt;

use chrono::{DateTime, Utc};
use log::debug;
use snafu::prelude::*;

use crate::{
    analytics::{self, Aggregation, AnalyticsError, SeriesStats},
    catalog::{SeriesCatalog, SeriesLocation, SeriesResolver},
    config::{ConfigError, ServiceConfig},
    storage::StoreLocation,
    store::{SeriesStore, StoreError},
    time_bucket::{ParseTimeBucketError, TimeBucket},
    timeseries::{Timeseries, TimeseriesError},
    units::{self, UnitError},
    wire::{self, AggregatedRecord, WireRecord},
};

/// Broad error classes an adapter maps to response codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or unsupported request; nothing was changed.
    Validation,
    /// The identifier does not name a series.
    NotFound,
    /// Storage setup or catalog is unusable.
    Configuration,
    /// Disk failure while accessing the store.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Configuration => "configuration",
            ErrorKind::Io => "io",
        })
    }
}

/// Errors returned by [`TimeseriesService`].
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ServiceError {
    /// A single-series operation named an unknown identifier.
    #[snafu(display("unknown series '{identifier}'"))]
    SeriesNotFound {
        /// The identifier.
        identifier: String,
    },

    /// An identifier in an aggregation request does not resolve.
    #[snafu(display("cannot aggregate unknown series '{identifier}'"))]
    UnresolvedIdentifier {
        /// The identifier.
        identifier: String,
    },

    /// An aggregation request named no series.
    #[snafu(display("aggregation needs at least one series identifier"))]
    EmptyIdentifierList,

    /// A unit was requested for a series whose native unit is unknown.
    #[snafu(display("series '{identifier}' has no unit; cannot convert to '{unit}'"))]
    SeriesWithoutUnit {
        /// The identifier.
        identifier: String,
        /// The requested unit.
        unit: String,
    },

    /// The record payload is invalid.
    #[snafu(display("invalid records: {source}"))]
    InvalidRecords {
        /// What is wrong with the records.
        source: TimeseriesError,
    },

    /// The frequency spec cannot be parsed.
    #[snafu(display("invalid frequency: {source}"))]
    InvalidFrequency {
        /// Parse failure.
        source: ParseTimeBucketError,
    },

    /// Unit resolution or conversion failed.
    #[snafu(display("{source}"))]
    Unit {
        /// Underlying unit error.
        source: UnitError,
    },

    /// Resampling or aggregation failed.
    #[snafu(display("{source}"))]
    Analytics {
        /// Underlying analytics error.
        source: AnalyticsError,
    },

    /// The store failed.
    #[snafu(display("{source}"))]
    Store {
        /// Underlying store error.
        source: StoreError,
    },

    /// The configuration or catalog could not be loaded.
    #[snafu(display("{source}"))]
    Config {
        /// Underlying configuration error.
        source: ConfigError,
    },
}

/// Result alias for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

impl ServiceError {
    /// Error class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ServiceError::SeriesNotFound { .. } => ErrorKind::NotFound,
            ServiceError::UnresolvedIdentifier { .. }
            | ServiceError::EmptyIdentifierList
            | ServiceError::SeriesWithoutUnit { .. }
            | ServiceError::InvalidRecords { .. }
            | ServiceError::InvalidFrequency { .. }
            | ServiceError::Unit { .. } => ErrorKind::Validation,
            ServiceError::Analytics { source } => match source {
                AnalyticsError::Alignment { .. } => ErrorKind::Configuration,
                _ => ErrorKind::Validation,
            },
            ServiceError::Store { source } => match source {
                StoreError::InvalidLocation { .. }
                | StoreError::EmptyAddress
                | StoreError::Awareness { .. } => ErrorKind::Configuration,
                StoreError::TimeConversionOverflow { .. } => ErrorKind::Validation,
                StoreError::Storage { .. }
                | StoreError::ParquetRead { .. }
                | StoreError::ParquetWrite { .. }
                | StoreError::Arrow { .. }
                | StoreError::CorruptTable { .. } => ErrorKind::Io,
            },
            ServiceError::Config { .. } => ErrorKind::Configuration,
        }
    }

    /// Stable machine-readable reason, e.g. `"duplicate_timestamps"`.
    pub fn reason(&self) -> &'static str {
        match self {
            ServiceError::SeriesNotFound { .. } => "series_not_found",
            ServiceError::UnresolvedIdentifier { .. } => "unresolved_identifier",
            ServiceError::EmptyIdentifierList => "empty_identifier_list",
            ServiceError::SeriesWithoutUnit { .. } => "series_without_unit",
            ServiceError::InvalidRecords { source } => timeseries_reason(source),
            ServiceError::InvalidFrequency { .. } => "invalid_frequency",
            ServiceError::Unit { source } => match source {
                UnitError::UnknownUnit { .. } => "unknown_unit",
                UnitError::IncompatibleUnits { .. } => "incompatible_units",
            },
            ServiceError::Analytics { source } => match source {
                AnalyticsError::UnsupportedAggregation { .. } => "unsupported_aggregation",
                AnalyticsError::EmptySeriesList => "empty_identifier_list",
                AnalyticsError::BucketOutOfRange => "timestamp_out_of_range",
                AnalyticsError::Alignment { source } => timeseries_reason(source),
            },
            ServiceError::Store { source } => match source {
                StoreError::InvalidLocation { .. } => "invalid_store_location",
                StoreError::EmptyAddress => "invalid_series_address",
                StoreError::Awareness { source, .. } => timeseries_reason(source),
                StoreError::TimeConversionOverflow { .. } => "timestamp_out_of_range",
                StoreError::CorruptTable { .. }
                | StoreError::ParquetRead { .. }
                | StoreError::Arrow { .. } => "corrupt_table",
                StoreError::Storage { .. } | StoreError::ParquetWrite { .. } => "storage_failure",
            },
            ServiceError::Config { .. } => "invalid_configuration",
        }
    }
}

fn timeseries_reason(err: &TimeseriesError) -> &'static str {
    match err {
        TimeseriesError::DuplicateTimestamps { .. } => "duplicate_timestamps",
        TimeseriesError::MixedAwareness => "mixed_awareness",
        TimeseriesError::ColumnLengthMismatch { .. } => "column_length_mismatch",
        TimeseriesError::InvalidTimestamp { .. } => "invalid_timestamp",
        TimeseriesError::TimestampOutOfRange { .. } => "timestamp_out_of_range",
        TimeseriesError::ConflictingTimezones { .. } => "conflicting_timezones",
        TimeseriesError::UnsupportedTimezone { .. } => "unsupported_timezone",
    }
}

/// The query surface of the engine, one call per API operation.
#[derive(Debug)]
pub struct TimeseriesService<R> {
    store: SeriesStore,
    resolver: R,
}

impl TimeseriesService<SeriesCatalog> {
    /// Open the store and load the catalog named by `config`.
    pub fn from_config(config: &ServiceConfig) -> ServiceResult<Self> {
        let resolver = match &config.catalog {
            Some(path) => SeriesCatalog::from_path(path).context(ConfigSnafu)?,
            None => SeriesCatalog::new(),
        };
        let store =
            SeriesStore::open(StoreLocation::local(&config.storage.root)).context(StoreSnafu)?;
        Ok(Self::new(store, resolver))
    }
}

impl<R: SeriesResolver> TimeseriesService<R> {
    /// Combine a store and a resolver.
    pub fn new(store: SeriesStore, resolver: R) -> Self {
        Self { store, resolver }
    }

    /// The underlying store.
    pub fn store(&self) -> &SeriesStore {
        &self.store
    }

    /// The identifier resolver.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }

    fn locate(&self, identifier: &str) -> ServiceResult<SeriesLocation> {
        self.resolver
            .resolve_series(identifier)
            .context(SeriesNotFoundSnafu { identifier })
    }

    fn native_unit<'a>(
        identifier: &str,
        location: &'a SeriesLocation,
        requested: &str,
    ) -> ServiceResult<&'a str> {
        let native = location.unit.as_deref().context(SeriesWithoutUnitSnafu {
            identifier,
            unit: requested,
        })?;
        units::check_compatible(native, requested).context(UnitSnafu)?;
        Ok(native)
    }

    fn read(
        &self,
        location: &SeriesLocation,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ServiceResult<Timeseries> {
        self.store
            .get(&location.partition, &location.key, start, end)
            .context(StoreSnafu)
    }

    /// Raw rows of `identifier` in `[start, end)`, optionally converted to `unit`.
    pub fn get(
        &self,
        identifier: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        unit: Option<&str>,
    ) -> ServiceResult<Vec<WireRecord>> {
        let location = self.locate(identifier)?;
        let native = unit
            .map(|u| Self::native_unit(identifier, &location, u))
            .transpose()?;

        let mut ts = self.read(&location, start, end)?;
        if let (Some(from), Some(to)) = (native, unit) {
            ts = convert_series(ts, from, to)?;
        }
        Ok(wire::dump(&ts))
    }

    /// Upsert `records` into `identifier`. Values given in `unit` are
    /// converted to the series' native unit before storage.
    pub fn set(
        &self,
        identifier: &str,
        records: &[WireRecord],
        unit: Option<&str>,
    ) -> ServiceResult<()> {
        let location = self.locate(identifier)?;
        let native = unit
            .map(|u| Self::native_unit(identifier, &location, u))
            .transpose()?;

        let mut ts = wire::load(records).context(InvalidRecordsSnafu)?;
        if let (Some(to), Some(from)) = (native, unit) {
            ts = convert_series(ts, from, to)?;
        }

        debug!("set {identifier}: {} record(s)", ts.len());
        self.store
            .set(&location.partition, &location.key, &ts)
            .context(StoreSnafu)
    }

    /// Remove rows of `identifier` in `[start, end)`; returns how many.
    pub fn delete(
        &self,
        identifier: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ServiceResult<usize> {
        let location = self.locate(identifier)?;
        self.store
            .delete(&location.partition, &location.key, start, end)
            .context(StoreSnafu)
    }

    /// Resample `identifier` at `freq`; buckets are anchored at `start`.
    ///
    /// The unit conversion, if any, is applied after aggregation.
    pub fn resample(
        &self,
        identifier: &str,
        freq: &str,
        aggregation: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
        unit: Option<&str>,
    ) -> ServiceResult<Vec<AggregatedRecord>> {
        let location = self.locate(identifier)?;
        let bucket = TimeBucket::parse(freq).context(InvalidFrequencySnafu)?;
        let aggregation: Aggregation = aggregation.parse().context(AnalyticsSnafu)?;
        let native = unit
            .map(|u| Self::native_unit(identifier, &location, u))
            .transpose()?;

        let ts = self.read(&location, start, end)?;
        let mut out = analytics::resample(&ts, bucket, aggregation, start).context(AnalyticsSnafu)?;
        if let (Some(from), Some(to)) = (native, unit) {
            out = convert_series(out, from, to)?;
        }
        Ok(wire::dump_aggregated(&out))
    }

    /// Resample each series in `identifiers` and combine them with `operation`.
    ///
    /// Every identifier must resolve; an unknown one fails the whole call.
    /// Repeated identifiers are counted once per occurrence.
    pub fn aggregate<S: AsRef<str>>(
        &self,
        identifiers: &[S],
        freq: &str,
        resampling: &str,
        operation: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ServiceResult<Vec<AggregatedRecord>> {
        ensure!(!identifiers.is_empty(), EmptyIdentifierListSnafu);
        let locations = identifiers
            .iter()
            .map(|id| {
                let identifier = id.as_ref();
                self.resolver
                    .resolve_series(identifier)
                    .context(UnresolvedIdentifierSnafu { identifier })
            })
            .collect::<ServiceResult<Vec<_>>>()?;
        let bucket = TimeBucket::parse(freq).context(InvalidFrequencySnafu)?;
        let resampling: Aggregation = resampling.parse().context(AnalyticsSnafu)?;
        let operation: Aggregation = operation.parse().context(AnalyticsSnafu)?;

        let series = locations
            .iter()
            .map(|location| self.read(location, start, end))
            .collect::<ServiceResult<Vec<_>>>()?;

        let out = analytics::aggregate(&series, bucket, resampling, operation, start)
            .context(AnalyticsSnafu)?;
        Ok(wire::dump_aggregated(&out))
    }

    /// Count and time bounds of `identifier` in `[start, end)`.
    pub fn stats(
        &self,
        identifier: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> ServiceResult<SeriesStats> {
        let location = self.locate(identifier)?;
        let ts = self.read(&location, start, end)?;
        Ok(analytics::stats(&ts))
    }
}

fn convert_series(ts: Timeseries, from: &str, to: &str) -> ServiceResult<Timeseries> {
    let values = units::convert(ts.values(), from, to).context(UnitSnafu)?;
    ts.with_values(values).context(InvalidRecordsSnafu)
}
