//! Server configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use keva_common::constants::{
    DEFAULT_BUFFER_SIZE, DEFAULT_FLUSH_BATCH_SIZE, DEFAULT_MAX_CONNECTIONS,
    DEFAULT_MAX_REPLICAS, DEFAULT_WAL_DATA_DIR,
};
use keva_common::parse_size;
use keva_wal::{RecoveryPolicy, WalConfig};

/// Top-level server configuration, loadable from a TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Client-facing TCP settings.
    #[serde(default)]
    pub network: NetworkConfig,

    /// Write-ahead log settings; omit the section to run without durability.
    #[serde(default)]
    pub wal: Option<WalSection>,

    /// Replication settings; omit the section to run standalone.
    #[serde(default)]
    pub replication: Option<ReplicationSection>,
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks cross-field requirements.
    pub fn validate(&self) -> Result<()> {
        if let Some(replication) = &self.replication {
            if replication.master_address.trim().is_empty() {
                bail!("replication requires master_address");
            }
            if self.wal.is_none() {
                bail!("replication requires a [wal] section for segment storage");
            }
        }
        Ok(())
    }
}

/// Client-facing TCP settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: String,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bound on concurrent client connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,

    /// Request buffer size, e.g. `"4KB"`.
    #[serde(default = "default_buffer_size")]
    pub buffer_size: String,

    /// Close idle connections after this many milliseconds, if set.
    #[serde(default)]
    pub idle_timeout_ms: Option<u64>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_connections: default_max_connections(),
            buffer_size: default_buffer_size(),
            idle_timeout_ms: None,
        }
    }
}

impl NetworkConfig {
    /// Returns the `host:port` address to bind to.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parses the buffer size field.
    pub fn buffer_size_bytes(&self) -> Result<usize> {
        Ok(parse_size(&self.buffer_size)? as usize)
    }

    /// Returns the idle timeout, if configured.
    #[must_use]
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_ms.map(Duration::from_millis)
    }
}

/// Write-ahead log settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalSection {
    /// Number of records that triggers an immediate flush.
    #[serde(default = "default_flush_batch_size")]
    pub flush_batch_size: usize,

    /// Timer-driven flush interval in milliseconds.
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,

    /// Maximum segment size, e.g. `"10MB"`.
    #[serde(default = "default_max_segment_size")]
    pub max_segment_size: String,

    /// Directory for WAL segments.
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,

    /// Recovery policy: `"best-effort"` or `"strict"`.
    #[serde(default = "default_recovery")]
    pub recovery: String,
}

impl Default for WalSection {
    fn default() -> Self {
        Self {
            flush_batch_size: default_flush_batch_size(),
            flush_interval_ms: default_flush_interval_ms(),
            max_segment_size: default_max_segment_size(),
            data_directory: default_data_directory(),
            recovery: default_recovery(),
        }
    }
}

impl WalSection {
    /// Converts this section into a [`WalConfig`].
    pub fn wal_config(&self) -> Result<WalConfig> {
        let recovery = match self.recovery.as_str() {
            "best-effort" => RecoveryPolicy::BestEffort,
            "strict" => RecoveryPolicy::Strict,
            other => bail!("unknown recovery policy {other:?}"),
        };

        Ok(WalConfig::new(&self.data_directory)
            .with_flush_batch_size(self.flush_batch_size)
            .with_flush_interval(Duration::from_millis(self.flush_interval_ms))
            .with_max_segment_size(parse_size(&self.max_segment_size)?)
            .with_recovery(recovery))
    }
}

/// The replication role of a node, fixed once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReplicaRole {
    /// Serves its own WAL segments to standbys.
    Master,
    /// Polls a master and applies what it ships; rejects direct writes.
    Slave,
}

/// Replication settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationSection {
    /// This node's role.
    pub role: ReplicaRole,

    /// Replication address: the master listens on it, a slave dials it.
    pub master_address: String,

    /// Slave poll interval in milliseconds.
    #[serde(default = "default_sync_interval_ms")]
    pub sync_interval_ms: u64,

    /// Bound on concurrent replica connections served by a master.
    #[serde(default = "default_max_replicas")]
    pub max_replicas: usize,
}

impl ReplicationSection {
    /// Returns the slave poll interval.
    #[must_use]
    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3223
}

fn default_max_connections() -> usize {
    DEFAULT_MAX_CONNECTIONS
}

fn default_buffer_size() -> String {
    format!("{DEFAULT_BUFFER_SIZE}")
}

fn default_flush_batch_size() -> usize {
    DEFAULT_FLUSH_BATCH_SIZE
}

fn default_flush_interval_ms() -> u64 {
    10
}

fn default_max_segment_size() -> String {
    "10MB".to_string()
}

fn default_data_directory() -> PathBuf {
    PathBuf::from(DEFAULT_WAL_DATA_DIR)
}

fn default_recovery() -> String {
    "best-effort".to_string()
}

fn default_sync_interval_ms() -> u64 {
    1000
}

fn default_max_replicas() -> usize {
    DEFAULT_MAX_REPLICAS
}
