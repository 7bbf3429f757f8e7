//! Network error types.

use std::io;

use thiserror::Error;

/// Result type for network operations.
pub type NetResult<T> = Result<T, NetError>;

/// Errors that can occur in the transport layer.
#[derive(Debug, Error)]
pub enum NetError {
    /// I/O error on the socket.
    #[error("network I/O error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: io::Error,
    },

    /// A message filled the whole buffer, so it was probably truncated.
    #[error("message exceeds buffer size of {buffer_size} bytes")]
    BufferOverflow {
        /// The configured buffer size.
        buffer_size: usize,
    },

    /// The peer was idle longer than the configured timeout.
    #[error("connection idle timeout expired")]
    IdleTimeout,

    /// The connection was closed by the peer.
    #[error("connection closed by peer")]
    ConnectionClosed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_conversion() {
        let err: NetError = io::Error::new(io::ErrorKind::BrokenPipe, "pipe").into();
        assert!(matches!(err, NetError::Io { .. }));
    }

    #[test]
    fn test_display() {
        let err = NetError::BufferOverflow { buffer_size: 4096 };
        assert!(err.to_string().contains("4096"));
    }
}
