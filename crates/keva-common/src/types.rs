//! Core identifier types for KevaDB.
//!
//! These types provide type-safe wrappers around the raw values that flow
//! through the WAL and replication layers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Log Sequence Number - uniquely identifies an operation in the WAL.
///
/// LSNs are monotonically increasing and define replay order: recovery and
/// replication both apply records in ascending LSN order regardless of the
/// order segments are enumerated in.
///
/// # Example
///
/// ```rust
/// use keva_common::types::Lsn;
///
/// let lsn = Lsn::new(1000);
/// assert!(lsn > Lsn::INVALID);
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct Lsn(u64);

impl Lsn {
    /// Invalid LSN, used as a sentinel value.
    pub const INVALID: Self = Self(0);

    /// First valid LSN.
    pub const FIRST: Self = Self(1);

    /// Maximum LSN value.
    pub const MAX: Self = Self(u64::MAX);

    /// Creates a new `Lsn` from a raw u64 value.
    #[inline]
    #[must_use]
    pub const fn new(lsn: u64) -> Self {
        Self(lsn)
    }

    /// Returns the raw u64 value.
    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Checks if this is a valid LSN.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 != Self::INVALID.0
    }

    /// Creates an `Lsn` from bytes (big-endian).
    #[inline]
    #[must_use]
    pub fn from_be_bytes(bytes: [u8; 8]) -> Self {
        Self(u64::from_be_bytes(bytes))
    }

    /// Converts to bytes (big-endian).
    #[inline]
    #[must_use]
    pub fn to_be_bytes(self) -> [u8; 8] {
        self.0.to_be_bytes()
    }
}

impl fmt::Debug for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Lsn(INVALID)")
        } else {
            write!(f, "Lsn({})", self.0)
        }
    }
}

impl fmt::Display for Lsn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Lsn {
    #[inline]
    fn from(lsn: u64) -> Self {
        Self::new(lsn)
    }
}

impl From<Lsn> for u64 {
    #[inline]
    fn from(lsn: Lsn) -> Self {
        lsn.0
    }
}

/// The command carried by a log record.
///
/// Only `Set` and `Del` ever reach the WAL; `Get` exists so the query layer
/// and the record model share one vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CommandKind {
    /// Store a value under a key.
    Set,
    /// Look up a key.
    Get,
    /// Remove a key.
    Del,
}

impl CommandKind {
    /// Returns the stable one-byte wire tag for this command.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        match self {
            Self::Set => 1,
            Self::Get => 2,
            Self::Del => 3,
        }
    }

    /// Decodes a wire tag back into a command.
    #[must_use]
    pub const fn from_u8(tag: u8) -> Option<Self> {
        match tag {
            1 => Some(Self::Set),
            2 => Some(Self::Get),
            3 => Some(Self::Del),
            _ => None,
        }
    }

    /// Returns the textual command name as it appears in the query protocol.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Get => "GET",
            Self::Del => "DEL",
        }
    }

    /// Returns true for commands that mutate the store.
    #[must_use]
    pub const fn is_mutation(self) -> bool {
        matches!(self, Self::Set | Self::Del)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lsn_basics() {
        let lsn = Lsn::new(1000);
        assert_eq!(lsn.as_u64(), 1000);
        assert!(lsn.is_valid());
        assert!(!Lsn::INVALID.is_valid());

        let bytes = lsn.to_be_bytes();
        assert_eq!(Lsn::from_be_bytes(bytes), lsn);
    }

    #[test]
    fn test_lsn_ordering() {
        assert!(Lsn::new(1) < Lsn::new(2));
        assert!(Lsn::INVALID < Lsn::FIRST);
        assert!(Lsn::FIRST < Lsn::MAX);
    }

    #[test]
    fn test_command_tags_roundtrip() {
        for kind in [CommandKind::Set, CommandKind::Get, CommandKind::Del] {
            assert_eq!(CommandKind::from_u8(kind.as_u8()), Some(kind));
        }
        assert_eq!(CommandKind::from_u8(0), None);
        assert_eq!(CommandKind::from_u8(200), None);
    }

    #[test]
    fn test_command_mutation() {
        assert!(CommandKind::Set.is_mutation());
        assert!(CommandKind::Del.is_mutation());
        assert!(!CommandKind::Get.is_mutation());
    }
}
