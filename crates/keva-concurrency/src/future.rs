//! One-shot promise/future pair.
//!
//! A [`Promise`] is written at most once; writing closes it for further writes.
//! The matching [`Future`] suspends its caller until the value is available.

use thiserror::Error;
use tokio::sync::oneshot;

/// Error returned by [`Future::wait`] when the promise was dropped unresolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("promise was dropped before a value was set")]
pub struct PromiseDropped;

/// The write side of a one-shot completion pair.
#[derive(Debug)]
pub struct Promise<T> {
    tx: Option<oneshot::Sender<T>>,
}

impl<T> Promise<T> {
    /// Creates a connected promise/future pair.
    #[must_use]
    pub fn new() -> (Promise<T>, Future<T>) {
        let (tx, rx) = oneshot::channel();
        (Promise { tx: Some(tx) }, Future { rx })
    }

    /// Resolves the promise with `value`.
    ///
    /// The first call wins; subsequent calls are no-ops. A value set after the
    /// future was dropped is discarded silently - the write path must not care
    /// whether anyone is still waiting.
    pub fn set(&mut self, value: T) {
        if let Some(tx) = self.tx.take() {
            let _ = tx.send(value);
        }
    }

    /// Returns true if the promise has already been resolved.
    #[must_use]
    pub fn is_set(&self) -> bool {
        self.tx.is_none()
    }
}

/// The read side of a one-shot completion pair.
#[derive(Debug)]
pub struct Future<T> {
    rx: oneshot::Receiver<T>,
}

impl<T> Future<T> {
    /// Suspends until the promise is resolved and returns the value.
    ///
    /// Returns [`PromiseDropped`] if the write side went away without ever
    /// calling [`Promise::set`].
    pub async fn wait(self) -> Result<T, PromiseDropped> {
        self.rx.await.map_err(|_| PromiseDropped)
    }
}
