//! Recovery reader: reconstitutes the durable record stream.

use crate::directory::SegmentDirectory;
use crate::error::WalResult;
use crate::record::LogRecord;

/// Reads every durable record across all segments.
#[derive(Debug, Clone)]
pub struct LogsReader {
    directory: SegmentDirectory,
}

impl LogsReader {
    /// Creates a reader over the given segments directory.
    #[must_use]
    pub fn new(directory: SegmentDirectory) -> Self {
        Self { directory }
    }

    /// Returns every durable record, sorted ascending by LSN.
    ///
    /// Segment enumeration order is not guaranteed to match append order, so
    /// the full set is sorted globally before it is returned; replay
    /// correctness depends on this.
    pub fn read(&self) -> WalResult<Vec<LogRecord>> {
        let mut records = Vec::new();
        self.directory.for_each(|data| {
            records.extend(LogRecord::decode_all(data)?);
            Ok(())
        })?;

        records.sort_by_key(|record| record.lsn);
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WalError;
    use crate::segment::segment_file_name;
    use bytes::BytesMut;
    use keva_common::types::Lsn;
    use tempfile::TempDir;

    fn write_segment(dir: &SegmentDirectory, id: u64, lsns: &[u64]) {
        let mut buf = BytesMut::new();
        for &lsn in lsns {
            LogRecord::set(Lsn::new(lsn), format!("k{lsn}"), "v").encode(&mut buf);
        }
        dir.write(&segment_file_name(id), &buf).unwrap();
    }

    #[test]
    fn test_empty_directory() {
        let tmp = TempDir::new().unwrap();
        let reader = LogsReader::new(SegmentDirectory::new(tmp.path()).unwrap());
        assert!(reader.read().unwrap().is_empty());
    }

    #[test]
    fn test_records_sorted_across_segments() {
        let tmp = TempDir::new().unwrap();
        let dir = SegmentDirectory::new(tmp.path()).unwrap();

        // Interleaved LSNs: segment 0 holds [50, 10], segment 1 holds [30].
        // Whatever order the directory yields, replay order must be global.
        write_segment(&dir, 0, &[50, 10]);
        write_segment(&dir, 1, &[30]);

        let records = LogsReader::new(dir).read().unwrap();
        let lsns: Vec<u64> = records.iter().map(|r| r.lsn.as_u64()).collect();
        assert_eq!(lsns, vec![10, 30, 50]);
    }

    #[test]
    fn test_decode_failure_is_fatal() {
        let tmp = TempDir::new().unwrap();
        let dir = SegmentDirectory::new(tmp.path()).unwrap();
        write_segment(&dir, 0, &[1, 2]);
        dir.write(&segment_file_name(1), b"garbage").unwrap();

        let result = LogsReader::new(dir).read();
        assert!(matches!(result, Err(WalError::Decode { .. })));
    }
}
