//! WAL error types.

use std::io;

use thiserror::Error;

/// Result type for WAL operations.
pub type WalResult<T> = Result<T, WalError>;

/// Errors that can occur during WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// I/O error during WAL operations.
    #[error("WAL I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// A batch flush failed.
    ///
    /// Carried by every future of the failed batch, so the same failure is
    /// observable by each caller that contributed a record.
    #[error("WAL flush failed: {reason}")]
    Flush {
        /// Description of the flush failure.
        reason: String,
    },

    /// A segment's bytes could not be decoded into records.
    #[error("failed to decode WAL record: {reason}")]
    Decode {
        /// What the decoder stumbled over.
        reason: String,
    },

    /// A file in the data directory does not follow the segment naming scheme.
    #[error("invalid segment name: {name:?}")]
    InvalidSegmentName {
        /// The offending file name.
        name: String,
    },

    /// The WAL has been shut down.
    #[error("WAL is closed")]
    Closed,

    /// Configuration error.
    #[error("WAL configuration error: {reason}")]
    Config {
        /// Why the configuration was rejected.
        reason: String,
    },
}

impl WalError {
    /// Creates a flush error.
    pub fn flush(reason: impl Into<String>) -> Self {
        Self::Flush {
            reason: reason.into(),
        }
    }

    /// Creates a decode error.
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            reason: reason.into(),
        }
    }

    /// Creates an invalid-segment-name error.
    pub fn invalid_segment_name(name: impl Into<String>) -> Self {
        Self::InvalidSegmentName { name: name.into() }
    }

    /// Creates a config error.
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}
