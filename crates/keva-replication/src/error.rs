//! Replication error types.

use thiserror::Error;

use keva_net::NetError;
use keva_wal::WalError;

/// Result type for replication operations.
pub type ReplicationResult<T> = Result<T, ReplicationError>;

/// Errors that can occur during a replication cycle.
///
/// The slave logs these and leaves its cursor untouched; the next tick
/// retries the same cycle.
#[derive(Debug, Error)]
pub enum ReplicationError {
    /// The transport failed (dial, send, or receive).
    #[error(transparent)]
    Net(#[from] NetError),

    /// Persisting or decoding a shipped segment failed.
    #[error(transparent)]
    Wal(#[from] WalError),

    /// A protocol message could not be decoded.
    #[error("failed to decode replication message: {reason}")]
    Decode {
        /// What the decoder stumbled over.
        reason: String,
    },

    /// The master reported that it could not serve the request.
    #[error("master failed to serve replication request")]
    MasterFailure,

    /// The storage-side consumer of the replication feed is gone.
    #[error("replication feed is closed")]
    FeedClosed,
}

impl ReplicationError {
    /// Creates a decode error.
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }
}
