//! The replication slave: polls its master and applies shipped segments.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use keva_net::TcpClient;
use keva_wal::{LogRecord, SegmentDirectory, WalResult};

use crate::error::{ReplicationError, ReplicationResult};
use crate::protocol::{SyncRequest, SyncResponse};

/// Record batches decoded from shipped segments, consumed by storage.
pub type SegmentFeed = mpsc::Receiver<Vec<LogRecord>>;

/// Polls a master for WAL segments and applies them locally.
///
/// Per cycle: persist the shipped segment under its original name, hand the
/// decoded records to storage, then advance the cursor. The order is
/// load-bearing - advancing only after a successful apply gives at-least-once
/// delivery across a crash, and re-applying a segment is safe because engine
/// mutation is idempotent per key.
#[derive(Debug)]
pub struct Slave {
    client: TcpClient,
    directory: SegmentDirectory,
    sync_interval: Duration,
    last_segment_name: String,
    feed_tx: mpsc::Sender<Vec<LogRecord>>,
}

impl Slave {
    /// Creates a slave polling through `client`.
    ///
    /// The cursor starts at the newest segment already present in the local
    /// data directory, so a restarting standby resumes where it left off.
    /// Returns the slave and the feed its storage should consume.
    pub fn new(
        client: TcpClient,
        directory: SegmentDirectory,
        sync_interval: Duration,
    ) -> WalResult<(Self, SegmentFeed)> {
        let last_segment_name = directory.last()?.unwrap_or_default();
        let (feed_tx, feed_rx) = mpsc::channel(1);

        Ok((
            Self {
                client,
                directory,
                sync_interval,
                last_segment_name,
                feed_tx,
            },
            feed_rx,
        ))
    }

    /// Runs the poll loop until `shutdown` fires.
    pub async fn run(mut self, mut shutdown: mpsc::Receiver<()>) {
        let mut interval = tokio::time::interval(self.sync_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("replication poller stopped");
                    return;
                }
                _ = interval.tick() => {
                    // On failure the cursor is unchanged; the next tick
                    // retries the same cycle.
                    if let Err(err) = self.synchronize().await {
                        warn!(error = %err, cursor = %self.last_segment_name, "replication cycle failed");
                    }
                }
            }
        }
    }

    /// One synchronization cycle.
    async fn synchronize(&mut self) -> ReplicationResult<()> {
        let request = SyncRequest::new(self.last_segment_name.clone());
        let response_bytes = self.client.send(&request.encode()).await?;
        let response = SyncResponse::decode(&response_bytes)?;

        if !response.succeed {
            return Err(ReplicationError::MasterFailure);
        }
        if response.segment_name.is_empty() {
            debug!("no changes from master");
            return Ok(());
        }

        self.directory
            .write(&response.segment_name, &response.segment_data)?;

        let records = LogRecord::decode_all(&response.segment_data)?;
        self.feed_tx
            .send(records)
            .await
            .map_err(|_| ReplicationError::FeedClosed)?;

        debug!(segment = %response.segment_name, "applied replicated segment");
        self.last_segment_name = response.segment_name;
        Ok(())
    }
}
