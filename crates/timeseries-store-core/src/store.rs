//! Durable, range-queryable storage of series tables.
//!
//! A [`SeriesStore`] owns one store root on disk. Each `(partition, key)`
//! pair maps to exactly one Parquet table file (see
//! [`crate::storage::layout`]); the file is the only source of truth, so a
//! store opened later on the same root sees everything written before.
//!
//! Every operation holds the store's lock for its whole duration, including
//! the file IO. Operations on different keys therefore serialize too; there
//! is no per-key parallelism. The guard is released on every exit path,
//! error paths included.
//!
//! `set` and `delete` additionally hold a per-table lock file
//! (`<name>.<variant>.lock`, see [`storage::FileLock`]) across their
//! read-modify-write, so writers in other processes, or other
//! [`SeriesStore`] instances on the same root, cannot interleave with them.
//!
//! Table files are only ever replaced whole (write to a uniquely named
//! temporary sibling, fsync, rename), so a failed `set` or `delete` leaves
//! the previous table in place and readers never see a partial file.

pub mod error;
mod codec;
mod key;
mod merge;
mod range;

use std::{
    path::{Path, PathBuf},
    sync::{Mutex, MutexGuard},
};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use snafu::prelude::*;

pub use error::{StoreError, StoreResult};
pub use key::{SeriesKey, Variant};

use crate::{
    storage::{self, StoreLocation, layout},
    timeseries::Timeseries,
};
use error::{AwarenessSnafu, EmptyAddressSnafu, InvalidLocationSnafu, StorageSnafu};
use range::TimeRange;

/// Quality reported for rows stored without one.
pub const LEGACY_QUALITY: f64 = 1.0;

/// A store of series tables rooted at one [`StoreLocation`].
#[derive(Debug)]
pub struct SeriesStore {
    location: StoreLocation,
    lock: Mutex<()>,
}

impl SeriesStore {
    /// Open (creating if needed) the store at `location`.
    ///
    /// Fails with [`StoreError::InvalidLocation`] if the root exists but is
    /// not a directory, or cannot be created.
    pub fn open(location: StoreLocation) -> StoreResult<Self> {
        storage::ensure_root(&location).context(InvalidLocationSnafu {
            location: location.to_string(),
        })?;
        Ok(Self {
            location,
            lock: Mutex::new(()),
        })
    }

    /// The root this store reads and writes.
    pub fn location(&self) -> &StoreLocation {
        &self.location
    }

    fn acquire(&self) -> MutexGuard<'_, ()> {
        match self.lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                // The lock guards no in-memory state; table files are
                // replaced atomically, so a panic cannot leave them torn.
                warn!(
                    "store lock for {} was poisoned by a panicking operation; recovering",
                    self.location
                );
                self.lock.clear_poison();
                poisoned.into_inner()
            }
        }
    }

    fn table_path(partition: &str, key: &SeriesKey) -> StoreResult<PathBuf> {
        ensure!(
            !partition.is_empty() && !key.name.is_empty(),
            EmptyAddressSnafu
        );
        Ok(layout::table_rel_path(partition, &key.name, key.variant.tag()))
    }

    fn lock_table(&self, partition: &str, key: &SeriesKey) -> StoreResult<storage::FileLock> {
        let rel = layout::lock_rel_path(partition, &key.name, key.variant.tag());
        storage::FileLock::acquire(&self.location, &rel, storage::LOCK_TIMEOUT)
            .context(StorageSnafu)
    }

    fn read_table(&self, rel: &Path, range: TimeRange) -> StoreResult<Option<Timeseries>> {
        let path = rel.display().to_string();
        match storage::read_if_exists(&self.location, rel).context(StorageSnafu)? {
            Some(bytes) => codec::decode(bytes, &path, range).map(Some),
            None => Ok(None),
        }
    }

    fn write_table(&self, rel: &Path, ts: &Timeseries) -> StoreResult<()> {
        let bytes = codec::encode(ts, &rel.display().to_string())?;
        storage::write_atomic(&self.location, rel, &bytes).context(StorageSnafu)
    }

    /// Rows of `partition`/`key` with `start <= timestamp < end`.
    ///
    /// - A missing bound is unbounded on that side; `start >= end` yields no
    ///   rows.
    /// - An unknown key yields [`Timeseries::empty`].
    /// - Rows are sorted by timestamp.
    /// - Rows stored without a quality are reported with
    ///   [`LEGACY_QUALITY`].
    pub fn get(
        &self,
        partition: &str,
        key: &SeriesKey,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> StoreResult<Timeseries> {
        let rel = Self::table_path(partition, key)?;
        let range = TimeRange::from_bounds(start, end)?;

        let _guard = self.acquire();
        let Some(mut ts) = self.read_table(&rel, range)? else {
            debug!("get {partition}/{key}: no table");
            return Ok(Timeseries::empty());
        };

        let patched = ts.fill_missing_quality(LEGACY_QUALITY);
        if patched > 0 {
            warn!(
                "get {partition}/{key}: {patched} row(s) without quality, reported as {LEGACY_QUALITY}"
            );
        }
        debug!("get {partition}/{key}: {} row(s)", ts.len());
        Ok(ts)
    }

    /// Merge `ts` into `partition`/`key`.
    ///
    /// Incoming rows replace stored rows at the same timestamp; other stored
    /// rows are kept. The table stays sorted and duplicate-free. An empty
    /// `ts` is a no-op. If the stored and incoming awareness differ, the
    /// table is promoted to UTC; two different explicit offsets are rejected
    /// without touching the file.
    pub fn set(&self, partition: &str, key: &SeriesKey, ts: &Timeseries) -> StoreResult<()> {
        let rel = Self::table_path(partition, key)?;
        if ts.is_empty() {
            debug!("set {partition}/{key}: nothing to write");
            return Ok(());
        }

        let _guard = self.acquire();
        let _table_lock = self.lock_table(partition, key)?;
        let existing = self
            .read_table(&rel, TimeRange::ALL)?
            .unwrap_or_else(|| Timeseries::empty_with_zone(ts.zone()));
        let before = existing.len();

        let merged = merge::upsert(existing, ts.clone()).context(AwarenessSnafu {
            path: rel.display().to_string(),
        })?;
        self.write_table(&rel, &merged)?;

        debug!(
            "set {partition}/{key}: {} incoming row(s), {before} -> {} stored",
            ts.len(),
            merged.len()
        );
        Ok(())
    }

    /// Remove rows of `partition`/`key` with `start <= timestamp < end`.
    ///
    /// Returns the number of rows removed; an empty range or an unknown key
    /// removes nothing and is not an error. A table left with no rows is
    /// deleted from disk.
    pub fn delete(
        &self,
        partition: &str,
        key: &SeriesKey,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> StoreResult<usize> {
        let rel = Self::table_path(partition, key)?;
        let range = TimeRange::from_bounds(start, end)?;

        let _guard = self.acquire();
        if !storage::exists(&self.location, &rel).context(StorageSnafu)? {
            debug!("delete {partition}/{key}: no table");
            return Ok(0);
        }
        let _table_lock = self.lock_table(partition, key)?;
        let Some(existing) = self.read_table(&rel, TimeRange::ALL)? else {
            debug!("delete {partition}/{key}: no table");
            return Ok(0);
        };

        let (kept, removed) = merge::remove_range(&existing, range);
        if removed == 0 {
            debug!("delete {partition}/{key}: no rows in range");
            return Ok(0);
        }

        if kept.is_empty() {
            storage::remove_if_exists(&self.location, &rel).context(StorageSnafu)?;
            info!("delete {partition}/{key}: table emptied and removed");
        } else {
            self.write_table(&rel, &kept)?;
            debug!("delete {partition}/{key}: removed {removed} row(s)");
        }
        Ok(removed)
    }

    /// Names of partitions holding at least a directory on disk.
    pub fn partitions(&self) -> StoreResult<Vec<String>> {
        let _guard = self.acquire();
        let entries = storage::list_dir(&self.location, Path::new("")).context(StorageSnafu)?;
        Ok(entries
            .into_iter()
            .filter(|e| e.is_dir)
            .filter_map(|e| layout::unescape_component(&e.name))
            .collect())
    }

    /// Keys stored in `partition`, sorted.
    pub fn keys(&self, partition: &str) -> StoreResult<Vec<SeriesKey>> {
        ensure!(!partition.is_empty(), EmptyAddressSnafu);

        let _guard = self.acquire();
        let entries = storage::list_dir(&self.location, &layout::partition_rel_dir(partition))
            .context(StorageSnafu)?;
        let mut keys: Vec<SeriesKey> = entries
            .into_iter()
            .filter(|e| !e.is_dir)
            .filter_map(|e| layout::parse_table_file_name(&e.name))
            .filter_map(|(name, tag)| {
                Variant::from_tag(&tag).map(|variant| SeriesKey { name, variant })
            })
            .collect();
        keys.sort();
        Ok(keys)
    }
}
