//! Batch writer: turns a batch of write requests into one durable append.

use std::path::PathBuf;

use bytes::BytesMut;
use tracing::{debug, error};

use crate::error::{WalError, WalResult};
use crate::request::WriteRequest;
use crate::segment::Segment;

/// Writes batches of records to the active segment, rotating when full.
///
/// Segment files are created lazily, on the first append that needs them, so
/// a directory never contains an empty segment that replication could ship
/// before its first batch lands.
#[derive(Debug)]
pub struct LogsWriter {
    dir: PathBuf,
    active: Option<Segment>,
    max_segment_size: u64,
}

impl LogsWriter {
    /// Opens the writer over `dir`, resuming the last segment if one exists.
    pub fn new(
        dir: impl Into<PathBuf>,
        last_segment_id: Option<u64>,
        max_segment_size: u64,
    ) -> WalResult<Self> {
        let dir = dir.into();
        let active = match last_segment_id {
            Some(id) => Some(Segment::open(&dir, id)?),
            None => None,
        };

        Ok(Self {
            dir,
            active,
            max_segment_size,
        })
    }

    /// Persists a batch as a single contiguous write.
    ///
    /// Every record is encoded, in order, into one buffer; the buffer goes to
    /// disk with one write plus one sync, so the batch is durable as a unit.
    /// On success every request's future resolves with `Ok(())`; on failure
    /// every future observes the same error. No partial success, no retry.
    pub fn write(&mut self, batch: Vec<WriteRequest>) {
        if batch.is_empty() {
            return;
        }

        let mut buf = BytesMut::with_capacity(
            batch.iter().map(|r| r.record().encoded_len()).sum(),
        );
        for request in &batch {
            request.record().encode(&mut buf);
        }

        match self.persist(&buf) {
            Ok(()) => {
                debug!(records = batch.len(), bytes = buf.len(), "flushed WAL batch");
                for request in batch {
                    request.complete(Ok(()));
                }
            }
            Err(err) => {
                error!(error = %err, records = batch.len(), "failed to flush WAL batch");
                fail_batch(batch, &err.to_string());
            }
        }
    }

    /// Opens a new segment if `data` would overflow the active one (or none
    /// is open yet), then appends and syncs. A batch never spans two segment
    /// files.
    fn persist(&mut self, data: &[u8]) -> WalResult<()> {
        let needs_new = match &self.active {
            None => true,
            Some(segment) => {
                segment.size() > 0 && segment.size() + data.len() as u64 > self.max_segment_size
            }
        };

        if needs_new {
            let id = self.active.as_ref().map_or(0, |segment| segment.id() + 1);
            let segment = Segment::create(&self.dir, id)?;
            debug!(segment = segment.id(), "opened WAL segment");
            self.active = Some(segment);
        }

        self.active
            .as_mut()
            .unwrap_or_else(|| unreachable!("active segment was just ensured"))
            .append(data)
    }

    /// Returns the id of the segment currently being appended to, if any.
    #[must_use]
    pub fn active_segment_id(&self) -> Option<u64> {
        self.active.as_ref().map(Segment::id)
    }
}

/// Resolves every request in a failed batch with the same error.
fn fail_batch(batch: Vec<WriteRequest>, reason: &str) {
    for request in batch {
        request.complete(Err(WalError::flush(reason)));
    }
}
