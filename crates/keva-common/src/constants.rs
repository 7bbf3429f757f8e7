//! System-wide defaults for KevaDB.

use std::time::Duration;

// =============================================================================
// WAL
// =============================================================================

/// Default number of write requests accumulated before a batch is flushed.
pub const DEFAULT_FLUSH_BATCH_SIZE: usize = 100;

/// Default interval between timer-driven flushes of a partially filled batch.
pub const DEFAULT_FLUSH_INTERVAL: Duration = Duration::from_millis(10);

/// Default maximum size of a single WAL segment file (10 MiB).
pub const DEFAULT_MAX_SEGMENT_SIZE: u64 = 10 * 1024 * 1024;

/// Default directory for WAL segments.
pub const DEFAULT_WAL_DATA_DIR: &str = "./data/wal";

// =============================================================================
// Replication
// =============================================================================

/// Default interval between slave synchronization cycles.
pub const DEFAULT_SYNC_INTERVAL: Duration = Duration::from_secs(1);

/// Default bound on concurrent replica connections served by a master.
pub const DEFAULT_MAX_REPLICAS: usize = 5;

// =============================================================================
// Network
// =============================================================================

/// Default bound on concurrent client connections.
pub const DEFAULT_MAX_CONNECTIONS: usize = 100;

/// Default size of the per-connection request buffer (4 KiB).
pub const DEFAULT_BUFFER_SIZE: usize = 4 * 1024;
