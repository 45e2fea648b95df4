//! Filesystem access for the store root.
//!
//! This module centralizes the file-level operations used by
//! [`crate::store::SeriesStore`]:
//!
//! - Resolving relative table paths against the store root.
//! - Atomic whole-file replacement (write to a temporary sibling, fsync,
//!   rename into place) so a table file is always either the previous or the
//!   new version, never a torn mix.
//! - Reading full file contents, removing files, and listing directories.
//!
//! Nothing here knows about tables or series; path conventions live in
//! [`layout`]. Only the local filesystem is supported, but callers go through
//! [`StoreLocation`] so other backends can be added without touching the
//! store logic.

pub mod layout;

use log::warn;
use snafu::{Backtrace, prelude::*};
use std::{
    error::Error,
    fmt,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

/// General result type used by storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Represents the root location of a store.
#[derive(Clone, Debug)]
pub enum StoreLocation {
    /// A store rooted at the given local directory.
    Local(PathBuf),
}

impl StoreLocation {
    /// Creates a new `StoreLocation` for a local filesystem path.
    pub fn local(root: impl Into<PathBuf>) -> Self {
        StoreLocation::Local(root.into())
    }

    /// Returns the root path of this location.
    pub fn root(&self) -> &Path {
        match self {
            StoreLocation::Local(root) => root,
        }
    }
}

impl fmt::Display for StoreLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreLocation::Local(root) => write!(f, "{}", root.display()),
        }
    }
}

/// Errors produced by the storage backend implementation.
///
/// Backend-specific I/O errors are wrapped here so higher layers can map them
/// into [`StorageError`] variants with path context.
#[derive(Debug)]
pub enum BackendError {
    /// A local filesystem I/O error.
    Local(io::Error),
}

impl fmt::Display for BackendError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BackendError::Local(e) => write!(f, "local I/O error: {e}"),
        }
    }
}

impl Error for BackendError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BackendError::Local(e) => Some(e),
        }
    }
}

/// Errors that can occur during storage operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum StorageError {
    /// The specified path was not found.
    #[snafu(display("Path not found: {path}"))]
    NotFound {
        /// The path that was not found.
        path: String,
        /// Underlying backend error that caused the failure.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The file to be created already exists.
    #[snafu(display("File already exists: {path}"))]
    AlreadyExists {
        /// The path that already exists.
        path: String,
        /// Underlying backend error.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// Another writer held a lock for longer than the caller was willing to wait.
    #[snafu(display("Timed out after {waited:?} waiting for lock {path}"))]
    LockTimeout {
        /// The lock file.
        path: String,
        /// How long the caller waited.
        waited: Duration,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// The store root exists but is not a directory.
    #[snafu(display("Store root is not a directory: {path}"))]
    NotADirectory {
        /// The offending path.
        path: String,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },

    /// An I/O error occurred on the local filesystem.
    #[snafu(display("Local I/O error at {path}: {source}"))]
    OtherIo {
        /// The path where the I/O error occurred.
        path: String,
        /// Underlying backend I/O error with platform-specific details.
        source: BackendError,
        /// The backtrace at the time the error occurred.
        backtrace: Backtrace,
    },
}

/// A single directory entry returned by [`list_dir`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    /// File or directory name (not a path).
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

fn join_local(location: &StoreLocation, rel: &Path) -> PathBuf {
    match location {
        StoreLocation::Local(root) => root.join(rel),
    }
}

fn create_parent_dir(abs: &Path) -> StorageResult<()> {
    if let Some(parent) = abs.parent() {
        fs::create_dir_all(parent)
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: parent.display().to_string(),
            })?;
    }
    Ok(())
}

/// Make sure the store root exists and is a directory, creating it if needed.
pub fn ensure_root(location: &StoreLocation) -> StorageResult<()> {
    let root = location.root();
    match fs::metadata(root) {
        Ok(meta) if meta.is_dir() => Ok(()),
        Ok(_) => NotADirectorySnafu {
            path: root.display().to_string(),
        }
        .fail(),
        Err(e) if e.kind() == io::ErrorKind::NotFound => fs::create_dir_all(root)
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: root.display().to_string(),
            }),
        Err(e) => Err(BackendError::Local(e)).context(OtherIoSnafu {
            path: root.display().to_string(),
        }),
    }
}

/// Write `contents` to `rel_path` inside `location` using an atomic write.
///
/// The payload is written to a uniquely named temporary sibling (`.*.tmp`),
/// synced, and then renamed into place. Concurrent writers never share a
/// temporary file. If any step fails the temporary file is removed and the
/// previous file (if any) is left untouched.
pub fn write_atomic(location: &StoreLocation, rel_path: &Path, contents: &[u8]) -> StorageResult<()> {
    let abs = join_local(location, rel_path);
    create_parent_dir(&abs)?;
    let dir = abs.parent().unwrap_or_else(|| location.root());

    let mut tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(BackendError::Local)
        .context(OtherIoSnafu {
            path: dir.display().to_string(),
        })?;
    let tmp_str = tmp.path().display().to_string();

    tmp.write_all(contents)
        .map_err(BackendError::Local)
        .context(OtherIoSnafu {
            path: tmp_str.clone(),
        })?;
    tmp.as_file()
        .sync_all()
        .map_err(BackendError::Local)
        .context(OtherIoSnafu { path: tmp_str })?;

    // On failure the returned `NamedTempFile` is dropped, which removes it.
    tmp.persist(&abs)
        .map_err(|e| BackendError::Local(e.error))
        .context(OtherIoSnafu {
            path: abs.display().to_string(),
        })?;
    Ok(())
}

/// Create a *new* file at `rel_path` and write `contents`, failing with
/// [`StorageError::AlreadyExists`] if the file already exists.
pub fn write_new(location: &StoreLocation, rel_path: &Path, contents: &[u8]) -> StorageResult<()> {
    let abs = join_local(location, rel_path);
    create_parent_dir(&abs)?;
    let path_str = abs.display().to_string();

    let mut file = match OpenOptions::new().write(true).create_new(true).open(&abs) {
        Ok(f) => f,
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
            return Err(BackendError::Local(e)).context(AlreadyExistsSnafu { path: path_str });
        }
        Err(e) => return Err(BackendError::Local(e)).context(OtherIoSnafu { path: path_str }),
    };

    if let Err(e) = file.write_all(contents).and_then(|()| file.sync_all()) {
        let _ = fs::remove_file(&abs);
        return Err(BackendError::Local(e)).context(OtherIoSnafu { path: path_str });
    }
    Ok(())
}

/// How long [`FileLock::acquire`] waits for another holder.
pub const LOCK_TIMEOUT: Duration = Duration::from_secs(30);

/// Lock files older than this are assumed to belong to a crashed writer.
pub const LOCK_STALE_AFTER: Duration = Duration::from_secs(300);

/// An exclusive lock shared by every process using the same store root.
///
/// The lock is a marker file created with "create only if not exists"
/// semantics; it is removed again when the guard drops.
#[derive(Debug)]
pub struct FileLock {
    abs: PathBuf,
}

impl FileLock {
    /// Take the lock at `rel_path`, waiting up to `timeout` for the current
    /// holder to release it.
    ///
    /// A lock file older than [`LOCK_STALE_AFTER`] is broken and taken over.
    pub fn acquire(
        location: &StoreLocation,
        rel_path: &Path,
        timeout: Duration,
    ) -> StorageResult<Self> {
        let abs = join_local(location, rel_path);
        let holder = format!("{}\n", std::process::id());
        let started = Instant::now();
        let mut backoff = Duration::from_millis(2);

        loop {
            match write_new(location, rel_path, holder.as_bytes()) {
                Ok(()) => return Ok(Self { abs }),
                Err(StorageError::AlreadyExists { .. }) => {}
                Err(e) => return Err(e),
            }

            if is_stale(&abs) {
                warn!("breaking stale lock {}", abs.display());
                let _ = fs::remove_file(&abs);
                continue;
            }
            ensure!(
                started.elapsed() < timeout,
                LockTimeoutSnafu {
                    path: abs.display().to_string(),
                    waited: timeout,
                }
            );

            thread::sleep(backoff);
            backoff = (backoff * 2).min(Duration::from_millis(50));
        }
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.abs)
            && e.kind() != io::ErrorKind::NotFound
        {
            warn!("failed to release lock {}: {e}", self.abs.display());
        }
    }
}

fn is_stale(abs: &Path) -> bool {
    fs::metadata(abs)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| modified.elapsed().ok())
        .is_some_and(|age| age > LOCK_STALE_AFTER)
}

/// Read the full contents of the file at `rel_path` within `location`.
///
/// Errors:
/// - If the file does not exist this returns `StorageError::NotFound`.
/// - On any other I/O error this returns `StorageError::OtherIo`.
pub fn read_all_bytes(location: &StoreLocation, rel_path: &Path) -> StorageResult<Vec<u8>> {
    let abs = join_local(location, rel_path);
    let path_str = abs.display().to_string();

    match fs::read(&abs) {
        Ok(bytes) => Ok(bytes),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            Err(BackendError::Local(e)).context(NotFoundSnafu { path: path_str })
        }
        Err(e) => Err(BackendError::Local(e)).context(OtherIoSnafu { path: path_str }),
    }
}

/// Like [`read_all_bytes`], but maps a missing file to `Ok(None)`.
pub fn read_if_exists(location: &StoreLocation, rel_path: &Path) -> StorageResult<Option<Vec<u8>>> {
    match read_all_bytes(location, rel_path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(StorageError::NotFound { .. }) => Ok(None),
        Err(e) => Err(e),
    }
}

/// Whether a file or directory exists at `rel_path`.
pub fn exists(location: &StoreLocation, rel_path: &Path) -> StorageResult<bool> {
    let abs = join_local(location, rel_path);
    abs.try_exists()
        .map_err(BackendError::Local)
        .context(OtherIoSnafu {
            path: abs.display().to_string(),
        })
}

/// Remove the file at `rel_path`. Returns `false` if it did not exist.
pub fn remove_if_exists(location: &StoreLocation, rel_path: &Path) -> StorageResult<bool> {
    let abs = join_local(location, rel_path);
    match fs::remove_file(&abs) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(BackendError::Local(e)).context(OtherIoSnafu {
            path: abs.display().to_string(),
        }),
    }
}

/// List the entries of the directory at `rel_dir`, sorted by name.
///
/// A missing directory yields an empty list. Entries whose names are not
/// valid UTF-8 are skipped.
pub fn list_dir(location: &StoreLocation, rel_dir: &Path) -> StorageResult<Vec<DirEntry>> {
    let abs = join_local(location, rel_dir);
    let path_str = abs.display().to_string();

    let read_dir = match fs::read_dir(&abs) {
        Ok(rd) => rd,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(BackendError::Local(e)).context(OtherIoSnafu { path: path_str });
        }
    };

    let mut out = Vec::new();
    for entry in read_dir {
        let entry = entry.map_err(BackendError::Local).context(OtherIoSnafu {
            path: path_str.clone(),
        })?;
        let file_type = entry
            .file_type()
            .map_err(BackendError::Local)
            .context(OtherIoSnafu {
                path: path_str.clone(),
            })?;
        if let Ok(name) = entry.file_name().into_string() {
            out.push(DirEntry {
                name,
                is_dir: file_type.is_dir(),
            });
        }
    }
    out.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(out)
}
