//! The replication master: serves WAL segments to standbys.

use bytes::Bytes;
use tracing::{debug, error};

use keva_wal::SegmentDirectory;

use crate::protocol::{SyncRequest, SyncResponse};

/// Serves catch-up requests from standbys out of the local WAL directory.
///
/// Shares the segments directory with the local WAL; segments are immutable
/// once rotated, and the active segment is only ever appended to, so reading
/// here needs no coordination with the writer.
#[derive(Debug, Clone)]
pub struct Master {
    directory: SegmentDirectory,
}

impl Master {
    /// Creates a master over the given WAL directory.
    #[must_use]
    pub fn new(directory: SegmentDirectory) -> Self {
        Self { directory }
    }

    /// Handles one raw replication request and returns the encoded response.
    ///
    /// Failures are answered with `{succeed: false}` and logged; a broken
    /// request must never take down the replication listener.
    pub fn handle_request(&self, request: &[u8]) -> Bytes {
        let request = match SyncRequest::decode(request) {
            Ok(request) => request,
            Err(err) => {
                error!(error = %err, "failed to decode replication request");
                return SyncResponse::failure().encode();
            }
        };

        self.synchronize(&request).encode()
    }

    fn synchronize(&self, request: &SyncRequest) -> SyncResponse {
        let next = match self.directory.next_after(&request.last_segment_name) {
            Ok(next) => next,
            Err(err) => {
                error!(error = %err, "failed to find next WAL segment");
                return SyncResponse::failure();
            }
        };

        let Some(name) = next else {
            debug!(cursor = %request.last_segment_name, "standby is caught up");
            return SyncResponse::caught_up();
        };

        match self.directory.read(&name) {
            // A freshly rotated segment can be visible before its first batch
            // lands; treat it as "nothing new yet" so the cursor never skips
            // past records still to come.
            Ok(data) if data.is_empty() => {
                debug!(segment = %name, "segment not ready yet");
                SyncResponse::caught_up()
            }
            Ok(data) => {
                debug!(segment = %name, bytes = data.len(), "shipping segment");
                SyncResponse::segment(name, data)
            }
            Err(err) => {
                error!(segment = %name, error = %err, "failed to read WAL segment");
                SyncResponse::failure()
            }
        }
    }
}
