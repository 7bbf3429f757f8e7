//! Counting semaphore for connection admission control.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore as TokioSemaphore};

/// A counting admission gate.
///
/// [`acquire`](Semaphore::acquire) suspends when all tickets are taken; the
/// returned [`Permit`] releases its ticket on drop, so a connection task holds
/// the permit for its whole lifetime.
#[derive(Debug, Clone)]
pub struct Semaphore {
    inner: Arc<TokioSemaphore>,
}

impl Semaphore {
    /// Creates a semaphore with `tickets` concurrent holders.
    #[must_use]
    pub fn new(tickets: usize) -> Self {
        Self {
            inner: Arc::new(TokioSemaphore::new(tickets)),
        }
    }

    /// Acquires a ticket, suspending while none are available.
    pub async fn acquire(&self) -> Permit {
        // The semaphore is never closed, so acquisition cannot fail.
        let permit = Arc::clone(&self.inner)
            .acquire_owned()
            .await
            .unwrap_or_else(|_| unreachable!("semaphore is never closed"));
        Permit { _permit: permit }
    }

    /// Attempts to acquire a ticket without suspending.
    #[must_use]
    pub fn try_acquire(&self) -> Option<Permit> {
        Arc::clone(&self.inner)
            .try_acquire_owned()
            .ok()
            .map(|permit| Permit { _permit: permit })
    }

    /// Returns the number of tickets currently available.
    #[must_use]
    pub fn available(&self) -> usize {
        self.inner.available_permits()
    }
}

/// An acquired semaphore ticket; dropping it releases the ticket.
#[derive(Debug)]
pub struct Permit {
    _permit: OwnedSemaphorePermit,
}
