//! Resampling frequencies and the bucket grid they induce.
//!
//! A [`TimeBucket`] is parsed from a short spec such as `15min`, `1h`, `1d`
//! or `1mo`. Minute, hour and day buckets have a fixed width; month buckets
//! follow the calendar, so their width varies between 28 and 31 days.
//!
//! Bucketing happens in the series' local wall-clock time (stored
//! nanoseconds plus the zone offset) so that a day bucket of a `+02:00`
//! series starts at local midnight. Buckets are left-closed:
//! `[start, start + width)`.

use std::{fmt, str::FromStr};

use chrono::{DateTime, Datelike, Months, NaiveDateTime, Utc};
use snafu::prelude::*;

use crate::timeseries::IndexZone;

const NANOS_PER_MINUTE: i64 = 60 * 1_000_000_000;
const NANOS_PER_HOUR: i64 = 60 * NANOS_PER_MINUTE;
const NANOS_PER_DAY: i64 = 24 * NANOS_PER_HOUR;

/// Errors produced when parsing a frequency spec (e.g. `1h`).
#[derive(Debug, Snafu, PartialEq, Eq)]
pub enum ParseTimeBucketError {
    /// The frequency string was empty or only whitespace.
    #[snafu(display("frequency spec is empty"))]
    Empty,

    /// The frequency did not include a numeric value.
    #[snafu(display("frequency spec '{spec}' is missing a numeric value"))]
    MissingNumber {
        /// The original frequency string.
        spec: String,
    },

    /// The frequency did not include a required unit suffix.
    #[snafu(display("frequency spec '{spec}' is missing a unit suffix (expected min|h|d|mo)"))]
    MissingUnit {
        /// The original frequency string.
        spec: String,
    },

    /// The numeric portion failed to parse.
    #[snafu(display("invalid frequency value in '{spec}': {source}"))]
    InvalidNumber {
        /// The original frequency string.
        spec: String,
        /// The parse error returned by `u64::from_str`.
        source: std::num::ParseIntError,
    },

    /// The parsed numeric value was zero.
    #[snafu(display("frequency value must be > 0 (got {value}) in '{spec}'"))]
    NonPositive {
        /// The original frequency string.
        spec: String,
        /// The parsed numeric value.
        value: u64,
    },

    /// The parsed numeric value did not fit in a `u32`.
    #[snafu(display("frequency value too large for u32 (got {value}) in '{spec}'"))]
    TooLarge {
        /// The original frequency string.
        spec: String,
        /// The parsed numeric value.
        value: u64,
    },

    /// A fixed-width bucket wider than the nanosecond timestamp range.
    #[snafu(display("frequency '{spec}' is wider than the representable time range"))]
    WidthOverflow {
        /// The original frequency string.
        spec: String,
    },

    /// The frequency used an unsupported unit suffix.
    #[snafu(display("unknown frequency unit '{unit}' in '{spec}' (expected min|h|d|mo)"))]
    UnknownUnit {
        /// The original frequency string.
        spec: String,
        /// The unrecognized unit suffix.
        unit: String,
    },
}

/// Width of a resampling bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBucket {
    /// A bucket spanning a fixed number of minutes.
    Minutes(u32),
    /// A bucket spanning a fixed number of hours.
    Hours(u32),
    /// A bucket spanning a fixed number of days.
    Days(u32),
    /// A bucket spanning a number of calendar months.
    Months(u32),
}

impl FromStr for TimeBucket {
    type Err = ParseTimeBucketError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let spec = input.trim();
        if spec.is_empty() {
            return Err(ParseTimeBucketError::Empty);
        }

        // Split into numeric prefix + unit suffix (unit starts at first alphabetic char).
        let unit_start = spec
            .char_indices()
            .find(|(_, c)| c.is_ascii_alphabetic())
            .map(|(i, _)| i);

        let Some(unit_start) = unit_start else {
            return Err(ParseTimeBucketError::MissingUnit {
                spec: spec.to_string(),
            });
        };

        if unit_start == 0 {
            return Err(ParseTimeBucketError::MissingNumber {
                spec: spec.to_string(),
            });
        }

        let (num_str, unit_str) = spec.split_at(unit_start);
        let num_str = num_str.trim();
        let unit_str = unit_str.trim();

        let value: u64 = num_str
            .parse()
            .map_err(|source| ParseTimeBucketError::InvalidNumber {
                spec: spec.to_string(),
                source,
            })?;

        if value == 0 {
            return Err(ParseTimeBucketError::NonPositive {
                spec: spec.to_string(),
                value,
            });
        }

        let Ok(v) = u32::try_from(value) else {
            return Err(ParseTimeBucketError::TooLarge {
                spec: spec.to_string(),
                value,
            });
        };

        let bucket = match unit_str.to_ascii_lowercase().as_str() {
            "t" | "m" | "min" | "mins" | "minute" | "minutes" => TimeBucket::Minutes(v),
            "h" | "hr" | "hrs" | "hour" | "hours" => TimeBucket::Hours(v),
            "d" | "day" | "days" => TimeBucket::Days(v),
            "mo" | "mon" | "month" | "months" => return Ok(TimeBucket::Months(v)),
            _ => {
                return Err(ParseTimeBucketError::UnknownUnit {
                    spec: spec.to_string(),
                    unit: unit_str.to_string(),
                });
            }
        };

        ensure!(
            bucket.fixed_width_nanos().is_some(),
            WidthOverflowSnafu { spec }
        );
        Ok(bucket)
    }
}

impl TimeBucket {
    /// Parse a frequency spec (e.g. `15min`, `1h`, `2d`, `1mo`).
    ///
    /// # Errors
    /// Returns [`ParseTimeBucketError`] if the string is empty, missing a unit,
    /// has an invalid or non-positive number, overflows `u32`, or uses an
    /// unsupported unit (seconds included).
    pub fn parse(spec: &str) -> Result<Self, ParseTimeBucketError> {
        spec.parse()
    }

    /// Bucket width in nanoseconds.
    ///
    /// `None` for calendar-month buckets, and for fixed widths that do not
    /// fit in an `i64`.
    pub fn fixed_width_nanos(&self) -> Option<i64> {
        match *self {
            TimeBucket::Minutes(n) => i64::from(n).checked_mul(NANOS_PER_MINUTE),
            TimeBucket::Hours(n) => i64::from(n).checked_mul(NANOS_PER_HOUR),
            TimeBucket::Days(n) => i64::from(n).checked_mul(NANOS_PER_DAY),
            TimeBucket::Months(_) => None,
        }
    }
}

impl fmt::Display for TimeBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeBucket::Minutes(n) => write!(f, "{n}min"),
            TimeBucket::Hours(n) => write!(f, "{n}h"),
            TimeBucket::Days(n) => write!(f, "{n}d"),
            TimeBucket::Months(n) => write!(f, "{n}mo"),
        }
    }
}

/// Assigns stored timestamps to the start of their bucket.
///
/// All arithmetic is checked; `None` means a bucket boundary falls outside
/// the `i64` nanosecond range.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BucketGrid {
    bucket: TimeBucket,
    offset: i64,
    /// Origin in local wall-clock nanoseconds.
    origin: i64,
}

impl BucketGrid {
    /// Grid anchored at `origin` when given, otherwise at the local midnight
    /// (or first of the month, for month buckets) of `first_row`.
    pub(crate) fn new(
        bucket: TimeBucket,
        zone: IndexZone,
        origin: Option<DateTime<Utc>>,
        first_row: i64,
    ) -> Option<Self> {
        let offset = zone.offset_nanos();
        let origin = match origin {
            Some(t) => t.timestamp_nanos_opt()?.checked_add(offset)?,
            None => {
                let local = local_datetime(first_row.checked_add(offset)?);
                let day = local.date();
                let start = match bucket {
                    TimeBucket::Months(_) => day.with_day(1)?,
                    _ => day,
                };
                start.and_hms_opt(0, 0, 0)?.and_utc().timestamp_nanos_opt()?
            }
        };
        Some(Self {
            bucket,
            offset,
            origin,
        })
    }

    /// Start of the bucket containing `ts`, in the same representation as `ts`.
    pub(crate) fn bucket_start(&self, ts: i64) -> Option<i64> {
        let local = ts.checked_add(self.offset)?;
        let start = match self.bucket {
            TimeBucket::Months(_) => self.month_bucket_start(local)?,
            _ => {
                let width = self.bucket.fixed_width_nanos()?;
                let k = local.checked_sub(self.origin)?.div_euclid(width);
                self.origin.checked_add(k.checked_mul(width)?)?
            }
        };
        start.checked_sub(self.offset)
    }

    fn month_bucket_start(&self, local: i64) -> Option<i64> {
        let TimeBucket::Months(n) = self.bucket else {
            return None;
        };
        let n = i64::from(n);
        let origin = local_datetime(self.origin);
        let t = local_datetime(local);

        let months = |dt: &NaiveDateTime| i64::from(dt.year()) * 12 + i64::from(dt.month0());
        let mut k = (months(&t) - months(&origin)).div_euclid(n) * n;

        let mut start = shift_months(origin, k)?;
        if start > t {
            k -= n;
            start = shift_months(origin, k)?;
        }
        start.and_utc().timestamp_nanos_opt()
    }
}

fn local_datetime(nanos: i64) -> NaiveDateTime {
    DateTime::from_timestamp_nanos(nanos).naive_utc()
}

fn shift_months(dt: NaiveDateTime, k: i64) -> Option<NaiveDateTime> {
    let months = Months::new(u32::try_from(k.unsigned_abs()).ok()?);
    if k >= 0 {
        dt.checked_add_months(months)
    } else {
        dt.checked_sub_months(months)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn nanos(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> i64 {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .timestamp_nanos_opt()
            .unwrap()
    }

    #[test]
    fn parse_accepts_supported_units() {
        let cases = [
            ("1min", TimeBucket::Minutes(1)),
            ("15T", TimeBucket::Minutes(15)),
            ("2m", TimeBucket::Minutes(2)),
            ("1h", TimeBucket::Hours(1)),
            ("3 hours", TimeBucket::Hours(3)),
            ("1D", TimeBucket::Days(1)),
            ("1mo", TimeBucket::Months(1)),
            ("  6months ", TimeBucket::Months(6)),
        ];
        for (input, expected) in cases {
            assert_eq!(input.parse::<TimeBucket>(), Ok(expected), "{input}");
        }
    }

    #[test]
    fn parse_rejects_bad_specs() {
        assert_eq!("".parse::<TimeBucket>(), Err(ParseTimeBucketError::Empty));
        assert!(matches!(
            "h".parse::<TimeBucket>(),
            Err(ParseTimeBucketError::MissingNumber { .. })
        ));
        assert!(matches!(
            "42".parse::<TimeBucket>(),
            Err(ParseTimeBucketError::MissingUnit { .. })
        ));
        assert!(matches!(
            "1.5h".parse::<TimeBucket>(),
            Err(ParseTimeBucketError::InvalidNumber { .. })
        ));
        assert!(matches!(
            "0d".parse::<TimeBucket>(),
            Err(ParseTimeBucketError::NonPositive { value: 0, .. })
        ));
        assert!(matches!(
            "5000000000h".parse::<TimeBucket>(),
            Err(ParseTimeBucketError::TooLarge { .. })
        ));
        assert!(matches!(
            "200000d".parse::<TimeBucket>(),
            Err(ParseTimeBucketError::WidthOverflow { .. })
        ));
        assert!(matches!(
            "4294967295min".parse::<TimeBucket>(),
            Err(ParseTimeBucketError::WidthOverflow { .. })
        ));
        // Calendar months never overflow at parse time.
        assert!("4294967295mo".parse::<TimeBucket>().is_ok());
        assert!(matches!(
            "30s".parse::<TimeBucket>(),
            Err(ParseTimeBucketError::UnknownUnit { .. })
        ));
    }

    #[test]
    fn display_round_trips() {
        for bucket in [
            TimeBucket::Minutes(15),
            TimeBucket::Hours(1),
            TimeBucket::Days(7),
            TimeBucket::Months(3),
        ] {
            assert_eq!(bucket.to_string().parse::<TimeBucket>(), Ok(bucket));
        }
    }

    #[test]
    fn fixed_grid_defaults_to_midnight_of_first_row() {
        let grid = BucketGrid::new(
            TimeBucket::Hours(6),
            IndexZone::Naive,
            None,
            nanos(2020, 1, 1, 7, 30),
        )
        .unwrap();
        assert_eq!(
            grid.bucket_start(nanos(2020, 1, 1, 7, 30)),
            Some(nanos(2020, 1, 1, 6, 0))
        );
        assert_eq!(
            grid.bucket_start(nanos(2020, 1, 2, 0, 0)),
            Some(nanos(2020, 1, 2, 0, 0))
        );
    }

    #[test]
    fn fixed_grid_follows_explicit_origin() {
        let origin = Utc.with_ymd_and_hms(2020, 1, 1, 0, 10, 0).unwrap();
        let grid =
            BucketGrid::new(TimeBucket::Minutes(15), IndexZone::Naive, Some(origin), 0).unwrap();
        assert_eq!(
            grid.bucket_start(nanos(2020, 1, 1, 0, 24)),
            Some(nanos(2020, 1, 1, 0, 10))
        );
        assert_eq!(
            grid.bucket_start(nanos(2020, 1, 1, 0, 25)),
            Some(nanos(2020, 1, 1, 0, 25))
        );
        // Rows before the origin still land on the same grid.
        assert_eq!(
            grid.bucket_start(nanos(2020, 1, 1, 0, 9)),
            Some(nanos(2019, 12, 31, 23, 55))
        );
    }

    #[test]
    fn aware_day_buckets_start_at_local_midnight() {
        let plus_two = IndexZone::Aware(FixedOffset::east_opt(2 * 3600).unwrap());
        // 2020-01-01T23:00Z is 2020-01-02T01:00+02:00.
        let grid =
            BucketGrid::new(TimeBucket::Days(1), plus_two, None, nanos(2020, 1, 1, 23, 0)).unwrap();
        assert_eq!(
            grid.bucket_start(nanos(2020, 1, 1, 23, 0)),
            Some(nanos(2020, 1, 1, 22, 0))
        );
    }

    #[test]
    fn month_buckets_follow_the_calendar() {
        let grid = BucketGrid::new(
            TimeBucket::Months(1),
            IndexZone::Naive,
            None,
            nanos(2020, 1, 15, 12, 0),
        )
        .unwrap();
        assert_eq!(
            grid.bucket_start(nanos(2020, 2, 29, 23, 59)),
            Some(nanos(2020, 2, 1, 0, 0))
        );
        assert_eq!(
            grid.bucket_start(nanos(2020, 3, 1, 0, 0)),
            Some(nanos(2020, 3, 1, 0, 0))
        );

        let quarterly = BucketGrid::new(
            TimeBucket::Months(3),
            IndexZone::Naive,
            None,
            nanos(2020, 1, 15, 12, 0),
        )
        .unwrap();
        assert_eq!(
            quarterly.bucket_start(nanos(2020, 6, 30, 0, 0)),
            Some(nanos(2020, 4, 1, 0, 0))
        );
        assert_eq!(
            quarterly.bucket_start(nanos(2019, 12, 31, 0, 0)),
            Some(nanos(2019, 10, 1, 0, 0))
        );
    }

    #[test]
    fn oversized_fixed_buckets_fall_outside_the_grid() {
        assert_eq!(TimeBucket::Days(200_000).fixed_width_nanos(), None);
        let grid = BucketGrid::new(TimeBucket::Days(200_000), IndexZone::Naive, None, 0).unwrap();
        assert_eq!(grid.bucket_start(nanos(2020, 1, 1, 0, 0)), None);
    }

    #[test]
    fn month_buckets_with_mid_month_origin() {
        let origin = Utc.with_ymd_and_hms(2020, 1, 10, 0, 0, 0).unwrap();
        let grid =
            BucketGrid::new(TimeBucket::Months(1), IndexZone::Naive, Some(origin), 0).unwrap();
        assert_eq!(
            grid.bucket_start(nanos(2020, 2, 5, 0, 0)),
            Some(nanos(2020, 1, 10, 0, 0))
        );
        assert_eq!(
            grid.bucket_start(nanos(2020, 2, 10, 0, 0)),
            Some(nanos(2020, 2, 10, 0, 0))
        );
    }
}
