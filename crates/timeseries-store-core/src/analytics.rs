//! Query-side computations over [`crate::timeseries::Timeseries`] values.
//!
//! Everything here is a pure function of its inputs: the service reads rows
//! from the store, hands them to these functions, and serializes the result.
//!
//! - [`resample`]: bucket one series at a coarser frequency.
//! - [`aggregate`]: resample several series on a shared grid and combine
//!   them bucket by bucket.
//! - [`stats`]: count plus first, last and latest write time.

mod aggregate;
mod resample;
mod stats;

use std::{fmt, str::FromStr};

use snafu::prelude::*;

pub use aggregate::aggregate;
pub use resample::resample;
pub use stats::{SeriesStats, stats};

use crate::timeseries::TimeseriesError;

/// Errors raised by analytics operations.
#[derive(Debug, Snafu, PartialEq)]
#[snafu(visibility(pub(crate)))]
pub enum AnalyticsError {
    /// The aggregation name is not one of the supported functions.
    #[snafu(display("unsupported aggregation '{name}' (expected sum|mean|min|max)"))]
    UnsupportedAggregation {
        /// The rejected name.
        name: String,
    },

    /// Cross-series aggregation was asked to combine nothing.
    #[snafu(display("cannot aggregate an empty list of series"))]
    EmptySeriesList,

    /// A bucket boundary cannot be represented as `i64` nanoseconds.
    #[snafu(display("bucket boundary out of the supported timestamp range"))]
    BucketOutOfRange,

    /// The series cannot be placed on one index zone.
    #[snafu(display("cannot align series: {source}"))]
    Alignment {
        /// The awareness or timezone conflict.
        source: TimeseriesError,
    },
}

/// Result alias for analytics operations.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Reduction applied to the values of a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Sum of values.
    Sum,
    /// Arithmetic mean.
    Mean,
    /// Smallest value.
    Min,
    /// Largest value.
    Max,
}

impl Aggregation {
    /// Canonical lowercase name.
    pub fn name(self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Mean => "mean",
            Aggregation::Min => "min",
            Aggregation::Max => "max",
        }
    }

    /// Reduce `values`, ignoring `NaN`. Returns `NaN` when nothing is left.
    pub fn reduce(self, values: impl IntoIterator<Item = f64>) -> f64 {
        let mut count = 0usize;
        let mut acc = match self {
            Aggregation::Sum | Aggregation::Mean => 0.0,
            Aggregation::Min => f64::INFINITY,
            Aggregation::Max => f64::NEG_INFINITY,
        };
        for v in values.into_iter().filter(|v| !v.is_nan()) {
            count += 1;
            acc = match self {
                Aggregation::Sum | Aggregation::Mean => acc + v,
                Aggregation::Min => acc.min(v),
                Aggregation::Max => acc.max(v),
            };
        }
        match (self, count) {
            (_, 0) => f64::NAN,
            (Aggregation::Mean, n) => acc / n as f64,
            _ => acc,
        }
    }
}

impl fmt::Display for Aggregation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Aggregation {
    type Err = AnalyticsError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "sum" => Ok(Aggregation::Sum),
            "mean" | "avg" | "average" => Ok(Aggregation::Mean),
            "min" => Ok(Aggregation::Min),
            "max" => Ok(Aggregation::Max),
            _ => UnsupportedAggregationSnafu { name: input }.fail(),
        }
    }
}
