//! # keva-wal
//!
//! Write-ahead log for KevaDB.
//!
//! Every mutating operation is made durable before it is applied to the
//! in-memory engine. Writes are accumulated into batches and flushed either
//! when the batch fills or when a timer fires, so physical writes are batched
//! for throughput without weakening durability: a caller's future resolves only
//! once the batch containing its record has been written and synced.
//!
//! The log is stored as append-only segment files whose fixed-width names sort
//! lexicographically in creation order. Recovery reads every segment, decodes
//! the records, and sorts them by LSN; replication ships whole segments to
//! standbys using the same directory primitives.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod directory;
pub mod error;
pub mod reader;
pub mod record;
pub mod request;
pub mod segment;
pub mod wal;
pub mod writer;

pub use config::{RecoveryPolicy, WalConfig};
pub use directory::SegmentDirectory;
pub use error::{WalError, WalResult};
pub use reader::LogsReader;
pub use record::LogRecord;
pub use request::{WriteFuture, WriteRequest};
pub use wal::Wal;
