//! # keva-common
//!
//! Common types, constants, and small utilities shared across KevaDB crates.
//!
//! This crate provides:
//!
//! - **Types**: the [`Lsn`](types::Lsn) log sequence number and the
//!   [`CommandKind`](types::CommandKind) operation tag carried by log records
//! - **Constants**: system-wide defaults for the WAL, replication, and network layers
//! - **Size parsing**: human-readable byte sizes (`"10MB"`) for configuration files

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod constants;
pub mod size;
pub mod types;

pub use constants::*;
pub use size::parse_size;
pub use types::{CommandKind, Lsn};
