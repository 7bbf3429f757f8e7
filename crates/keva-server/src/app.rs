//! Node wiring: build a configured node and run it until shutdown.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use bytes::Bytes;
use tokio::sync::mpsc;
use tracing::info;

use keva_engine::{Engine, MemoryEngine};
use keva_net::{TcpClient, TcpClientOptions, TcpServer, TcpServerOptions};
use keva_replication::{Master, Slave};
use keva_storage::Storage;
use keva_wal::{SegmentDirectory, Wal};

use crate::config::{ReplicaRole, ServerConfig};
use crate::database::Database;

/// The replication half of a node, fixed at startup.
enum ReplicationRuntime {
    /// Serve our own segments to standbys.
    Master { server: TcpServer, master: Master },
    /// Poll a master and apply what it ships.
    Slave { slave: Slave },
}

/// A fully wired node, bound to its addresses but not yet serving.
///
/// Splitting bind from run lets callers (tests in particular) learn the
/// ephemeral addresses before traffic starts.
pub struct App {
    storage: Arc<Storage>,
    database: Arc<Database>,
    client_server: TcpServer,
    replication: Option<ReplicationRuntime>,
}

impl App {
    /// Builds engine, WAL, storage, and the configured replication role, and
    /// binds the listeners.
    pub async fn bind(config: &ServerConfig) -> Result<Self> {
        config.validate()?;

        let engine: Arc<dyn Engine> = Arc::new(MemoryEngine::new());

        let wal_config = config
            .wal
            .as_ref()
            .map(|section| section.wal_config())
            .transpose()?;
        let wal = wal_config
            .clone()
            .map(Wal::open)
            .transpose()
            .context("failed to open WAL")?
            .map(Arc::new);

        let mut builder = Storage::builder(engine);
        if let Some(wal) = &wal {
            builder = builder.wal(Arc::clone(wal));
        }

        let mut replication = None;
        if let Some(section) = &config.replication {
            let wal_config = wal_config
                .as_ref()
                .context("replication requires a [wal] section")?;
            let directory = SegmentDirectory::new(&wal_config.data_dir)?;

            match section.role {
                ReplicaRole::Master => {
                    let options = TcpServerOptions::default()
                        .with_max_connections(section.max_replicas);
                    let server = TcpServer::bind(&section.master_address, options)
                        .await
                        .context("failed to bind replication listener")?;
                    info!(addr = %section.master_address, "replication master");

                    replication = Some(ReplicationRuntime::Master {
                        server,
                        master: Master::new(directory),
                    });
                }
                ReplicaRole::Slave => {
                    // The response carries a whole segment; size the buffer
                    // for it plus the protocol envelope.
                    let buffer = wal_config.max_segment_size as usize + 1024;
                    let client = TcpClient::connect(
                        &section.master_address,
                        TcpClientOptions::default().with_buffer_size(buffer),
                    )
                    .await
                    .context("failed to connect to replication master")?;
                    info!(master = %section.master_address, "replication slave");

                    let (slave, feed) =
                        Slave::new(client, directory, section.sync_interval())?;
                    builder = builder.replica_feed(feed);
                    replication = Some(ReplicationRuntime::Slave { slave });
                }
            }
        }

        let storage = builder.build()?;
        let database = Arc::new(Database::new(Arc::clone(&storage)));

        let network = &config.network;
        let mut options = TcpServerOptions::default()
            .with_max_connections(network.max_connections)
            .with_buffer_size(network.buffer_size_bytes()?);
        if let Some(idle) = network.idle_timeout() {
            options = options.with_idle_timeout(idle);
        }
        let client_server = TcpServer::bind(&network.address(), options)
            .await
            .context("failed to bind client listener")?;

        Ok(Self {
            storage,
            database,
            client_server,
            replication,
        })
    }

    /// Returns the client-facing address.
    pub fn client_addr(&self) -> Result<SocketAddr> {
        Ok(self.client_server.local_addr()?)
    }

    /// Returns the replication listener address on a master.
    pub fn replication_addr(&self) -> Option<SocketAddr> {
        match &self.replication {
            Some(ReplicationRuntime::Master { server, .. }) => server.local_addr().ok(),
            _ => None,
        }
    }

    /// Serves until `shutdown` fires, then stops listeners and drains the WAL.
    pub async fn run(self, mut shutdown: mpsc::Receiver<()>) -> Result<()> {
        let database = self.database;
        let handler = move |request: Bytes| {
            let database = Arc::clone(&database);
            async move {
                let query = String::from_utf8_lossy(&request);
                Bytes::from(database.handle_query(query.trim()).await)
            }
        };

        let (client_tx, client_rx) = mpsc::channel(1);
        let client_task = tokio::spawn(self.client_server.serve(handler, client_rx));

        let mut replication_tx = None;
        let replication_task = match self.replication {
            Some(ReplicationRuntime::Master { server, master }) => {
                let (tx, rx) = mpsc::channel(1);
                replication_tx = Some(tx);
                let handler = move |request: Bytes| {
                    let master = master.clone();
                    async move { master.handle_request(&request) }
                };
                Some(tokio::spawn(server.serve(handler, rx)))
            }
            Some(ReplicationRuntime::Slave { slave }) => {
                let (tx, rx) = mpsc::channel(1);
                replication_tx = Some(tx);
                Some(tokio::spawn(slave.run(rx)))
            }
            None => None,
        };

        let _ = shutdown.recv().await;
        info!("shutting down");

        if let Some(tx) = replication_tx {
            let _ = tx.send(()).await;
        }
        let _ = client_tx.send(()).await;

        if let Some(task) = replication_task {
            let _ = task.await;
        }
        let _ = client_task.await;

        self.storage.shutdown().await;
        Ok(())
    }
}
