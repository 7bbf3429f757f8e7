//! Storage error types.

use thiserror::Error;

use keva_wal::WalError;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in the storage layer.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A write was attempted on a replica.
    ///
    /// A slave never originates writes; it only applies what it receives from
    /// its master.
    #[error("write operations are not allowed on a replica")]
    ReadOnlyReplica,

    /// The key does not exist.
    #[error("key not found: {key}")]
    KeyNotFound {
        /// The key that was looked up.
        key: String,
    },

    /// The storage has been shut down.
    #[error("storage is closed")]
    Closed,

    /// The write-ahead log failed.
    #[error(transparent)]
    Wal(#[from] WalError),
}

impl StorageError {
    /// Creates a key-not-found error.
    pub fn key_not_found(key: impl Into<String>) -> Self {
        Self::KeyNotFound { key: key.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            StorageError::ReadOnlyReplica.to_string(),
            "write operations are not allowed on a replica"
        );
        assert_eq!(
            StorageError::key_not_found("abc").to_string(),
            "key not found: abc"
        );
    }

    #[test]
    fn test_wal_error_conversion() {
        let err: StorageError = WalError::Closed.into();
        assert!(matches!(err, StorageError::Wal(WalError::Closed)));
    }
}
