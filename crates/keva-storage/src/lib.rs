//! # keva-storage
//!
//! Storage orchestration: the single choke point through which every read and
//! write passes.
//!
//! [`Storage`] ties together the in-memory engine, the optional write-ahead
//! log, the LSN generator, and (on a standby) the replication feed. Mutations
//! become durable before they touch the engine; standbys reject writes and
//! apply what the replication feed delivers instead.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod id_generator;
pub mod storage;

pub use error::{StorageError, StorageResult};
pub use id_generator::IdGenerator;
pub use storage::{apply_records, ReplicaFeed, Storage, StorageBuilder};
