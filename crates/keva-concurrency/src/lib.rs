//! # keva-concurrency
//!
//! Concurrency primitives shared across KevaDB components.
//!
//! - [`Promise`]/[`Future`]: a one-shot completion pair. The WAL uses it to let a
//!   write-path caller wait for durability without the log knowing anything about
//!   its caller's concurrency model.
//! - [`Semaphore`]: a counting admission gate used to bound concurrent network
//!   connections.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod future;
pub mod semaphore;

pub use future::{Future, Promise, PromiseDropped};
pub use semaphore::{Permit, Semaphore};
