//! On-disk layout helpers for a store root.
//!
//! ```text
//! store_root/
//!   <partition>/
//!     <series name>.<variant>.parquet
//! ```
//!
//! Partition and series names are escaped with [`escape_component`] so any
//! identifier maps to exactly one file name: bytes outside `[A-Za-z0-9_-]`
//! (including `.`, which separates the variant tag) become `%XX`.
//!
//! The functions here return relative [`PathBuf`] values; callers join them
//! with a [`crate::storage::StoreLocation`] before doing IO.

use std::path::PathBuf;

/// File extension of table files.
pub const TABLE_EXT: &str = "parquet";

fn is_plain(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'-'
}

/// Escape an arbitrary name into a single safe path component.
pub fn escape_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        if is_plain(b) {
            out.push(b as char);
        } else {
            out.push_str(&format!("%{b:02X}"));
        }
    }
    out
}

/// Reverse [`escape_component`]. Returns `None` for malformed input.
pub fn unescape_component(escaped: &str) -> Option<String> {
    let bytes = escaped.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'%' => {
                let hex = escaped.get(i + 1..i + 3)?;
                out.push(u8::from_str_radix(hex, 16).ok()?);
                i += 3;
            }
            b if is_plain(b) => {
                out.push(b);
                i += 1;
            }
            _ => return None,
        }
    }
    String::from_utf8(out).ok()
}

/// Relative path: `<partition>/`
pub fn partition_rel_dir(partition: &str) -> PathBuf {
    PathBuf::from(escape_component(partition))
}

/// Relative path: `<partition>/<name>.<tag>.parquet`
pub fn table_rel_path(partition: &str, name: &str, tag: &str) -> PathBuf {
    partition_rel_dir(partition).join(format!("{}.{tag}.{TABLE_EXT}", escape_component(name)))
}

/// Relative path: `<partition>/<name>.<tag>.lock`
///
/// Marker file held by whichever process is rewriting the matching table.
pub fn lock_rel_path(partition: &str, name: &str, tag: &str) -> PathBuf {
    partition_rel_dir(partition).join(format!("{}.{tag}.lock", escape_component(name)))
}

/// Split a table file name into its unescaped series name and variant tag.
///
/// Returns `None` for anything that is not a table file (for example, a
/// leftover `*.tmp` from an interrupted write or a `*.lock` marker).
pub fn parse_table_file_name(file_name: &str) -> Option<(String, String)> {
    let stem = file_name.strip_suffix(TABLE_EXT)?.strip_suffix('.')?;
    let (name, tag) = stem.rsplit_once('.')?;
    Some((unescape_component(name)?, tag.to_string()))
}
