//! Core engine for a durable, per-series time-series store.
//!
//! This crate provides the pieces the surrounding API layer calls into:
//!
//! - A columnar in-memory [`Timeseries`] (time index plus value, quality and
//!   write-timestamp columns) with ingestion validation (`timeseries` module)
//!   and the wire mapping used at the API boundary (`wire` module).
//! - A closed registry of domain units with dimension-checked, columnar
//!   conversion (`units` module).
//! - A Parquet-backed [`SeriesStore`] keyed by `(partition, series key)` that
//!   supports half-open range reads, upsert-merge writes and range deletes
//!   under a single per-instance exclusive lock (`store` module).
//! - Resampling, cross-series aggregation and summary statistics over the
//!   store's output (`analytics` module).
//! - The identifier-level [`TimeseriesService`] that resolves external
//!   series identifiers through a [`SeriesResolver`] and classifies every
//!   failure for the adapter (`service` and `catalog` modules).
//!
//! Higher-level adapters (HTTP handlers, the `tsstore` CLI) are expected to
//! depend on this crate and never touch the on-disk representation directly.
#![deny(missing_docs)]
pub mod analytics;
pub mod catalog;
pub mod config;
pub mod service;
pub mod storage;
pub mod store;
pub mod time_bucket;
pub mod timeseries;
pub mod units;
pub mod wire;

pub use analytics::{Aggregation, AnalyticsError, SeriesStats};
pub use catalog::{SeriesCatalog, SeriesLocation, SeriesResolver};
pub use config::{ConfigError, ServiceConfig, StorageConfig};
pub use service::{ErrorKind, ServiceError, TimeseriesService};
pub use storage::{StorageError, StoreLocation};
pub use store::{SeriesKey, SeriesStore, StoreError, Variant};
pub use time_bucket::{ParseTimeBucketError, TimeBucket};
pub use timeseries::{IndexZone, RawRecord, RawTimestamp, StoreRow, Timeseries, TimeseriesError};
pub use units::{DomainUnit, PhysicalUnit, UnitError};
pub use wire::{AggregatedRecord, WireRecord};
