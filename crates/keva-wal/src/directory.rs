//! The segments directory: the ordered set of segment files on disk.
//!
//! Recovery iterates every segment's raw bytes; replication looks up "the
//! first segment after name X" (master) and persists received segments under
//! their original names (slave).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{WalError, WalResult};
use crate::segment::parse_segment_id;

/// Handle to a data directory holding WAL segments.
#[derive(Debug, Clone)]
pub struct SegmentDirectory {
    dir: PathBuf,
}

impl SegmentDirectory {
    /// Opens the directory, creating it if missing.
    pub fn new(dir: impl Into<PathBuf>) -> WalResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Returns the directory path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Delivers every segment's raw bytes to `action`.
    ///
    /// Enumeration order is whatever the filesystem yields; callers that need
    /// LSN order must sort the decoded records themselves.
    pub fn for_each(&self, mut action: impl FnMut(&[u8]) -> WalResult<()>) -> WalResult<()> {
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if parse_segment_id(name).is_none() {
                continue;
            }

            let data = fs::read(entry.path())?;
            action(&data)?;
        }

        Ok(())
    }

    /// Returns every segment file name, sorted ascending.
    pub fn segment_names(&self) -> WalResult<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if let Some(name) = entry.file_name().to_str() {
                if parse_segment_id(name).is_some() {
                    names.push(name.to_string());
                }
            }
        }

        names.sort();
        Ok(names)
    }

    /// Returns the first segment name strictly greater than `name`.
    ///
    /// An empty `name` therefore yields the oldest segment. Returns `None`
    /// when the caller is already caught up.
    pub fn next_after(&self, name: &str) -> WalResult<Option<String>> {
        let names = self.segment_names()?;
        let idx = names.partition_point(|candidate| candidate.as_str() <= name);
        Ok(names.into_iter().nth(idx))
    }

    /// Returns the lexicographically last segment name, if any.
    pub fn last(&self) -> WalResult<Option<String>> {
        Ok(self.segment_names()?.into_iter().next_back())
    }

    /// Reads the full raw bytes of the named segment.
    pub fn read(&self, name: &str) -> WalResult<Vec<u8>> {
        self.validate(name)?;
        Ok(fs::read(self.dir.join(name))?)
    }

    /// Persists raw segment bytes under `name`, synced to disk.
    ///
    /// Overwriting an existing segment with the same bytes is how a slave
    /// retries after a crash between persist and apply; it is safe because
    /// segments are immutable once shipped.
    pub fn write(&self, name: &str, data: &[u8]) -> WalResult<()> {
        self.validate(name)?;

        let mut file = fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(self.dir.join(name))?;
        use std::io::Write;
        file.write_all(data)?;
        file.sync_all()?;
        Ok(())
    }

    fn validate(&self, name: &str) -> WalResult<()> {
        if parse_segment_id(name).is_none() {
            return Err(WalError::invalid_segment_name(name));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::segment::segment_file_name;
    use tempfile::TempDir;

    fn populate(dir: &SegmentDirectory, ids: &[u64]) {
        for &id in ids {
            dir.write(&segment_file_name(id), format!("segment-{id}").as_bytes())
                .unwrap();
        }
    }

    #[test]
    fn test_creates_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let nested = tmp.path().join("a/b/wal");
        let dir = SegmentDirectory::new(&nested).unwrap();
        assert!(nested.is_dir());
        assert!(dir.segment_names().unwrap().is_empty());
    }

    #[test]
    fn test_next_after() {
        let tmp = TempDir::new().unwrap();
        let dir = SegmentDirectory::new(tmp.path()).unwrap();
        populate(&dir, &[0, 1, 3]);

        // Empty cursor: start from the oldest segment.
        assert_eq!(
            dir.next_after("").unwrap(),
            Some(segment_file_name(0))
        );
        assert_eq!(
            dir.next_after(&segment_file_name(0)).unwrap(),
            Some(segment_file_name(1))
        );
        // A gap is skipped over, not an error.
        assert_eq!(
            dir.next_after(&segment_file_name(1)).unwrap(),
            Some(segment_file_name(3))
        );
        // Caught up.
        assert_eq!(dir.next_after(&segment_file_name(3)).unwrap(), None);
    }

    #[test]
    fn test_last() {
        let tmp = TempDir::new().unwrap();
        let dir = SegmentDirectory::new(tmp.path()).unwrap();
        assert_eq!(dir.last().unwrap(), None);

        populate(&dir, &[2, 0, 1]);
        assert_eq!(dir.last().unwrap(), Some(segment_file_name(2)));
    }

    #[test]
    fn test_for_each_sees_only_segments() {
        let tmp = TempDir::new().unwrap();
        let dir = SegmentDirectory::new(tmp.path()).unwrap();
        populate(&dir, &[0, 1]);
        std::fs::write(tmp.path().join("stray.txt"), b"not a segment").unwrap();

        let mut seen = Vec::new();
        dir.for_each(|data| {
            seen.push(data.to_vec());
            Ok(())
        })
        .unwrap();

        seen.sort();
        assert_eq!(seen, vec![b"segment-0".to_vec(), b"segment-1".to_vec()]);
    }

    #[test]
    fn test_read_write_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let dir = SegmentDirectory::new(tmp.path()).unwrap();

        let name = segment_file_name(7);
        dir.write(&name, b"payload").unwrap();
        assert_eq!(dir.read(&name).unwrap(), b"payload");

        // Re-persisting the same segment is allowed (slave retry path).
        dir.write(&name, b"payload").unwrap();
        assert_eq!(dir.read(&name).unwrap(), b"payload");
    }

    #[test]
    fn test_rejects_foreign_names() {
        let tmp = TempDir::new().unwrap();
        let dir = SegmentDirectory::new(tmp.path()).unwrap();

        assert!(matches!(
            dir.write("../escape.log", b"x"),
            Err(WalError::InvalidSegmentName { .. })
        ));
        assert!(matches!(
            dir.read("stray.txt"),
            Err(WalError::InvalidSegmentName { .. })
        ));
    }
}
