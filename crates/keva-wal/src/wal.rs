//! WAL core: batch accumulation and the background flush task.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

use keva_common::types::Lsn;

use crate::config::{RecoveryPolicy, WalConfig};
use crate::directory::SegmentDirectory;
use crate::error::{WalError, WalResult};
use crate::reader::LogsReader;
use crate::record::LogRecord;
use crate::request::{WriteFuture, WriteRequest};
use crate::segment::parse_segment_id;
use crate::writer::LogsWriter;

/// State shared between the WAL handle and the flush task.
///
/// Holds only the accumulating batch: the handoff sender lives in the handle,
/// so dropping the WAL closes the channel and lets the flush task drain and
/// exit on its own.
#[derive(Debug, Default)]
struct Shared {
    /// Batch currently being accumulated. Guarded by its own mutex so
    /// producers never wait on writer I/O.
    pending: Mutex<Vec<WriteRequest>>,
}

/// The write-ahead log.
///
/// Mutations enter through [`set`](Wal::set) / [`del`](Wal::del) and resolve
/// their returned future once the containing batch is durable. One background
/// task per WAL owns the writer and the flush timer.
#[derive(Debug)]
pub struct Wal {
    shared: Arc<Shared>,
    /// Depth-1 handoff to the flush task; a full channel back-pressures
    /// producers until the writer accepts the previous batch.
    batches_tx: mpsc::Sender<Vec<WriteRequest>>,
    flush_batch_size: usize,
    reader: LogsReader,
    recovery: RecoveryPolicy,
    shutdown_tx: mpsc::Sender<()>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Wal {
    /// Opens the WAL, resuming the newest segment in the data directory.
    ///
    /// Must be called from within a tokio runtime: the flush task is spawned
    /// here.
    pub fn open(config: WalConfig) -> WalResult<Self> {
        config.validate()?;

        let directory = SegmentDirectory::new(&config.data_dir)?;
        let last_segment_id = directory
            .last()?
            .as_deref()
            .and_then(parse_segment_id);
        let writer = LogsWriter::new(
            &config.data_dir,
            last_segment_id,
            config.max_segment_size,
        )?;
        let reader = LogsReader::new(directory);

        let (batches_tx, batches_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        let shared = Arc::new(Shared::default());

        let task = FlushTask {
            shared: Arc::clone(&shared),
            writer,
            batches_rx,
            shutdown_rx,
            flush_interval: config.flush_interval,
        };
        let handle = tokio::spawn(task.run());

        info!(dir = %config.data_dir.display(), "opened WAL");

        Ok(Self {
            shared,
            batches_tx,
            flush_batch_size: config.flush_batch_size,
            reader,
            recovery: config.recovery,
            shutdown_tx,
            task: Mutex::new(Some(handle)),
        })
    }

    /// Queues a `Set` for durability; the future resolves once it is on disk.
    pub async fn set(&self, lsn: Lsn, key: &str, value: &str) -> WriteFuture {
        self.push(LogRecord::set(lsn, key, value)).await
    }

    /// Queues a `Del` for durability; the future resolves once it is on disk.
    pub async fn del(&self, lsn: Lsn, key: &str) -> WriteFuture {
        self.push(LogRecord::del(lsn, key)).await
    }

    /// Returns every durable record across all segments, sorted by LSN.
    pub fn recover(&self) -> WalResult<Vec<LogRecord>> {
        self.reader.read()
    }

    /// The policy the caller should apply when [`recover`](Wal::recover) fails.
    #[must_use]
    pub fn recovery_policy(&self) -> RecoveryPolicy {
        self.recovery
    }

    /// Stops the flush task after draining queued and pending batches.
    pub async fn shutdown(&self) {
        let _ = self.shutdown_tx.send(()).await;
        let task = self.task.lock().take();
        if let Some(task) = task {
            let _ = task.await;
        }
    }

    async fn push(&self, record: LogRecord) -> WriteFuture {
        let (request, future) = WriteRequest::new(record);

        let full_batch = {
            let mut pending = self.shared.pending.lock();
            pending.push(request);
            if pending.len() >= self.flush_batch_size {
                Some(std::mem::take(&mut *pending))
            } else {
                None
            }
        };

        if let Some(batch) = full_batch {
            if let Err(returned) = self.batches_tx.send(batch).await {
                // The flush task is gone; nothing will ever write this batch.
                for request in returned.0 {
                    request.complete(Err(WalError::Closed));
                }
            }
        }

        future
    }
}

/// Background task that owns the writer, the timer, and the handoff channel.
struct FlushTask {
    shared: Arc<Shared>,
    writer: LogsWriter,
    batches_rx: mpsc::Receiver<Vec<WriteRequest>>,
    shutdown_rx: mpsc::Receiver<()>,
    flush_interval: Duration,
}

impl FlushTask {
    async fn run(mut self) {
        let mut interval = tokio::time::interval(self.flush_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    self.drain();
                    debug!("WAL flush task stopped");
                    return;
                }
                batch = self.batches_rx.recv() => match batch {
                    Some(batch) => {
                        self.writer.write(batch);
                        interval.reset();
                    }
                    None => {
                        // Every WAL handle is gone; flush leftovers and exit.
                        self.drain();
                        return;
                    }
                },
                _ = interval.tick() => self.flush_pending(),
            }
        }
    }

    /// Flushes the partially filled batch; a no-op when it is empty.
    fn flush_pending(&mut self) {
        let batch = std::mem::take(&mut *self.shared.pending.lock());
        if !batch.is_empty() {
            self.writer.write(batch);
        }
    }

    /// Final drain: queued full batches first (they are older), then whatever
    /// was still accumulating. Closing the channel bounces any in-flight
    /// handoff back to its producer, which resolves those futures as closed.
    fn drain(&mut self) {
        self.batches_rx.close();
        while let Ok(batch) = self.batches_rx.try_recv() {
            self.writer.write(batch);
        }
        self.flush_pending();
    }
}
