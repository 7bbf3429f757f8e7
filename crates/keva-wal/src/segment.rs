//! Append-only segment files.
//!
//! A segment holds a contiguous run of encoded log records and is bounded by
//! the configured maximum size. Names are fixed-width (`wal_<hex16>.log`) so
//! lexicographic filename order equals creation order; the directory search
//! and the replication cursor both rely on that.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{WalError, WalResult};

/// Prefix shared by every segment file name.
pub const SEGMENT_PREFIX: &str = "wal_";

/// Extension shared by every segment file name.
pub const SEGMENT_EXTENSION: &str = "log";

/// Returns the file name for a segment id, e.g. `wal_000000000000002a.log`.
#[must_use]
pub fn segment_file_name(id: u64) -> String {
    format!("{SEGMENT_PREFIX}{id:016x}.{SEGMENT_EXTENSION}")
}

/// Parses a segment id back out of a file name.
///
/// Returns `None` for anything that does not follow the naming scheme, which
/// also shields the directory from path-traversal through wire-supplied names.
#[must_use]
pub fn parse_segment_id(name: &str) -> Option<u64> {
    let stem = name
        .strip_prefix(SEGMENT_PREFIX)?
        .strip_suffix(&format!(".{SEGMENT_EXTENSION}"))?;
    if stem.len() != 16 {
        return None;
    }
    u64::from_str_radix(stem, 16).ok()
}

/// The active segment file the writer appends to.
#[derive(Debug)]
pub struct Segment {
    id: u64,
    path: PathBuf,
    file: File,
    size: u64,
}

impl Segment {
    /// Creates a fresh segment file for `id`.
    pub fn create(dir: &Path, id: u64) -> WalResult<Self> {
        let path = dir.join(segment_file_name(id));
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            id,
            path,
            file,
            size,
        })
    }

    /// Opens an existing segment file for appending.
    pub fn open(dir: &Path, id: u64) -> WalResult<Self> {
        let path = dir.join(segment_file_name(id));
        let file = OpenOptions::new().append(true).open(&path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            id,
            path,
            file,
            size,
        })
    }

    /// Returns the segment id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the current size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Returns the path to the segment file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `data` and syncs it to disk as a unit.
    pub fn append(&mut self, data: &[u8]) -> WalResult<()> {
        self.file.write_all(data)?;
        self.file.sync_all()?;
        self.size += data.len() as u64;
        Ok(())
    }
}
