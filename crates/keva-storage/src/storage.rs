//! The storage orchestrator.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::{info, warn};

use keva_common::types::{CommandKind, Lsn};
use keva_engine::Engine;
use keva_wal::{LogRecord, RecoveryPolicy, Wal, WalError};

use crate::error::{StorageError, StorageResult};
use crate::id_generator::IdGenerator;

/// Stream of record batches a standby receives from its master.
pub type ReplicaFeed = mpsc::Receiver<Vec<LogRecord>>;

/// Applies log records to an engine in the order given.
///
/// This is the single replay function: startup recovery and the replication
/// feed both go through it. Application is idempotent per key, so replaying
/// the same records twice leaves the engine in the same state.
pub fn apply_records(engine: &dyn Engine, records: &[LogRecord]) {
    for record in records {
        match (record.command, record.args.as_slice()) {
            (CommandKind::Set, [key, value]) => engine.set(key, value),
            (CommandKind::Del, [key]) => engine.del(key),
            (CommandKind::Get, _) => {}
            (command, args) => {
                warn!(%command, arity = args.len(), lsn = %record.lsn, "skipping malformed log record");
            }
        }
    }
}

/// Builder for [`Storage`].
pub struct StorageBuilder {
    engine: Arc<dyn Engine>,
    wal: Option<Arc<Wal>>,
    replica_feed: Option<ReplicaFeed>,
}

impl StorageBuilder {
    /// Attaches a write-ahead log; its records are recovered and replayed
    /// during [`build`](Self::build).
    #[must_use]
    pub fn wal(mut self, wal: Arc<Wal>) -> Self {
        self.wal = Some(wal);
        self
    }

    /// Marks this node as a replica fed by the given stream.
    ///
    /// A replica rejects direct writes and applies what the feed delivers.
    #[must_use]
    pub fn replica_feed(mut self, feed: ReplicaFeed) -> Self {
        self.replica_feed = Some(feed);
        self
    }

    /// Recovers durable state, seeds the LSN generator, starts the feed
    /// consumer if configured, and returns the storage.
    pub fn build(self) -> StorageResult<Arc<Storage>> {
        let mut recovered_max = Lsn::INVALID;

        if let Some(wal) = &self.wal {
            let records = match wal.recover() {
                Ok(records) => records,
                Err(err) => match wal.recovery_policy() {
                    RecoveryPolicy::Strict => return Err(err.into()),
                    RecoveryPolicy::BestEffort => {
                        warn!(error = %err, "WAL recovery failed; starting with an empty store");
                        Vec::new()
                    }
                },
            };

            recovered_max = records
                .iter()
                .map(|record| record.lsn)
                .max()
                .unwrap_or(Lsn::INVALID);

            apply_records(self.engine.as_ref(), &records);
            info!(records = records.len(), max_lsn = %recovered_max, "replayed WAL records");
        }

        let storage = Arc::new(Storage {
            engine: self.engine,
            wal: self.wal,
            id_generator: IdGenerator::new(recovered_max),
            replica: self.replica_feed.is_some(),
            closed: AtomicBool::new(false),
        });

        if let Some(mut feed) = self.replica_feed {
            let engine = Arc::clone(&storage.engine);
            tokio::spawn(async move {
                while let Some(batch) = feed.recv().await {
                    apply_records(engine.as_ref(), &batch);
                }
                info!("replication feed closed");
            });
        }

        Ok(storage)
    }
}

/// The single choke point for every read and write.
pub struct Storage {
    engine: Arc<dyn Engine>,
    wal: Option<Arc<Wal>>,
    id_generator: IdGenerator,
    replica: bool,
    closed: AtomicBool,
}

impl Storage {
    /// Starts building a storage over the given engine.
    #[must_use]
    pub fn builder(engine: Arc<dyn Engine>) -> StorageBuilder {
        StorageBuilder {
            engine,
            wal: None,
            replica_feed: None,
        }
    }

    /// Stores `value` under `key`, durably if a WAL is configured.
    ///
    /// The engine is only mutated after the WAL confirms durability.
    pub async fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        self.check_writable()?;

        let lsn = self.id_generator.next();
        if let Some(wal) = &self.wal {
            let future = wal.set(lsn, key, value).await;
            future
                .wait()
                .await
                .map_err(|_| StorageError::Wal(WalError::Closed))??;
        }

        self.engine.set(key, value);
        Ok(())
    }

    /// Returns the value stored under `key`.
    pub fn get(&self, key: &str) -> StorageResult<String> {
        self.check_open()?;

        self.engine
            .get(key)
            .ok_or_else(|| StorageError::key_not_found(key))
    }

    /// Removes `key`, durably if a WAL is configured.
    pub async fn del(&self, key: &str) -> StorageResult<()> {
        self.check_writable()?;

        let lsn = self.id_generator.next();
        if let Some(wal) = &self.wal {
            let future = wal.del(lsn, key).await;
            future
                .wait()
                .await
                .map_err(|_| StorageError::Wal(WalError::Closed))??;
        }

        self.engine.del(key);
        Ok(())
    }

    /// Returns true if this node is a replica.
    #[must_use]
    pub fn is_replica(&self) -> bool {
        self.replica
    }

    /// Rejects new operations and drains the WAL.
    pub async fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        if let Some(wal) = &self.wal {
            wal.shutdown().await;
        }
    }

    fn check_open(&self) -> StorageResult<()> {
        if self.closed.load(Ordering::Acquire) {
            Err(StorageError::Closed)
        } else {
            Ok(())
        }
    }

    fn check_writable(&self) -> StorageResult<()> {
        self.check_open()?;
        if self.replica {
            return Err(StorageError::ReadOnlyReplica);
        }
        Ok(())
    }
}

impl std::fmt::Debug for Storage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Storage")
            .field("wal", &self.wal.is_some())
            .field("replica", &self.replica)
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}
