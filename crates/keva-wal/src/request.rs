//! Write request: one log record plus its completion slot.

use keva_concurrency::{Future, Promise};

use crate::error::WalResult;
use crate::record::LogRecord;

/// Future resolved once the batch containing a request has been flushed.
pub type WriteFuture = Future<WalResult<()>>;

/// A pending write: one record and the promise its caller is waiting on.
///
/// Created when a mutating call enters the WAL, retired by the writer when the
/// containing batch succeeds or fails as a unit.
#[derive(Debug)]
pub struct WriteRequest {
    record: LogRecord,
    promise: Promise<WalResult<()>>,
}

impl WriteRequest {
    /// Wraps a record, returning the request and the caller-facing future.
    #[must_use]
    pub fn new(record: LogRecord) -> (Self, WriteFuture) {
        let (promise, future) = Promise::new();
        (Self { record, promise }, future)
    }

    /// The record to persist.
    #[must_use]
    pub fn record(&self) -> &LogRecord {
        &self.record
    }

    /// Resolves the caller's future with the flush outcome.
    ///
    /// Callers that stopped waiting are ignored: the record is durable either
    /// way.
    pub fn complete(mut self, result: WalResult<()>) {
        self.promise.set(result);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WalError;
    use keva_common::types::Lsn;

    #[tokio::test]
    async fn test_complete_success() {
        let (request, future) = WriteRequest::new(LogRecord::set(Lsn::new(1), "k", "v"));
        assert_eq!(request.record().lsn, Lsn::new(1));

        request.complete(Ok(()));
        assert!(future.wait().await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn test_complete_failure() {
        let (request, future) = WriteRequest::new(LogRecord::del(Lsn::new(2), "k"));
        request.complete(Err(WalError::flush("disk full")));

        let result = future.wait().await.unwrap();
        assert!(matches!(result, Err(WalError::Flush { .. })));
    }

    #[tokio::test]
    async fn test_abandoned_caller() {
        let (request, future) = WriteRequest::new(LogRecord::del(Lsn::new(3), "k"));
        drop(future);
        // Completing after the caller gave up must not panic.
        request.complete(Ok(()));
    }
}
