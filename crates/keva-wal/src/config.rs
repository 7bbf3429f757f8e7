//! WAL configuration.

use std::path::PathBuf;
use std::time::Duration;

use keva_common::constants::{
    DEFAULT_FLUSH_BATCH_SIZE, DEFAULT_FLUSH_INTERVAL, DEFAULT_MAX_SEGMENT_SIZE,
    DEFAULT_WAL_DATA_DIR,
};

use crate::error::{WalError, WalResult};

/// Policy applied when recovery hits a segment it cannot decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecoveryPolicy {
    /// Log the failure and start with an empty recovered set.
    ///
    /// Availability over strict durability; the behaviour the store has always
    /// had, so it stays the default.
    #[default]
    BestEffort,
    /// Refuse to start on any decode failure.
    Strict,
}

/// Configuration for the write-ahead log.
#[derive(Debug, Clone)]
pub struct WalConfig {
    /// Directory where WAL segments are stored.
    pub data_dir: PathBuf,

    /// Number of write requests that triggers an immediate batch flush.
    pub flush_batch_size: usize,

    /// Interval between timer-driven flushes of a partially filled batch.
    pub flush_interval: Duration,

    /// Maximum size of a segment file; the writer rotates before exceeding it.
    pub max_segment_size: u64,

    /// What to do when recovery cannot decode a segment.
    pub recovery: RecoveryPolicy,
}

impl Default for WalConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_WAL_DATA_DIR),
            flush_batch_size: DEFAULT_FLUSH_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            max_segment_size: DEFAULT_MAX_SEGMENT_SIZE,
            recovery: RecoveryPolicy::default(),
        }
    }
}

impl WalConfig {
    /// Creates a configuration with the given data directory and defaults for
    /// everything else.
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            ..Default::default()
        }
    }

    /// Sets the flush batch size.
    #[must_use]
    pub fn with_flush_batch_size(mut self, size: usize) -> Self {
        self.flush_batch_size = size;
        self
    }

    /// Sets the flush interval.
    #[must_use]
    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Sets the maximum segment size.
    #[must_use]
    pub fn with_max_segment_size(mut self, size: u64) -> Self {
        self.max_segment_size = size;
        self
    }

    /// Sets the recovery policy.
    #[must_use]
    pub fn with_recovery(mut self, policy: RecoveryPolicy) -> Self {
        self.recovery = policy;
        self
    }

    /// Validates the configuration.
    pub fn validate(&self) -> WalResult<()> {
        if self.flush_batch_size == 0 {
            return Err(WalError::config("flush batch size must be positive"));
        }

        if self.flush_interval.is_zero() {
            return Err(WalError::config("flush interval must be positive"));
        }

        if self.max_segment_size == 0 {
            return Err(WalError::config("max segment size must be positive"));
        }

        Ok(())
    }
}
