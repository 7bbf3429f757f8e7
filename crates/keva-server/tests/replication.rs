//! End-to-end replication: a master and a slave node, full stack.

use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use keva_net::{TcpClient, TcpClientOptions};
use keva_server::config::{ReplicaRole, ReplicationSection, WalSection};
use keva_server::{App, ServerConfig};

struct Node {
    addr: SocketAddr,
    replication_addr: Option<SocketAddr>,
    shutdown: mpsc::Sender<()>,
    handle: JoinHandle<anyhow::Result<()>>,
}

impl Node {
    async fn stop(self) {
        self.shutdown.send(()).await.unwrap();
        self.handle.await.unwrap().unwrap();
    }
}

/// Every flushed batch rotates into its own segment (tiny segment limit), so
/// each write becomes visible to the shipping protocol immediately.
fn wal_section(wal_dir: &Path) -> WalSection {
    WalSection {
        flush_interval_ms: 5,
        max_segment_size: "1B".to_string(),
        data_directory: wal_dir.to_path_buf(),
        ..Default::default()
    }
}

async fn start_master(wal_dir: &Path) -> Node {
    let mut config = ServerConfig::default();
    config.network.host = "127.0.0.1".to_string();
    config.network.port = 0;
    config.wal = Some(wal_section(wal_dir));
    config.replication = Some(ReplicationSection {
        role: ReplicaRole::Master,
        master_address: "127.0.0.1:0".to_string(),
        sync_interval_ms: 20,
        max_replicas: 5,
    });

    let app = App::bind(&config).await.unwrap();
    let addr = app.client_addr().unwrap();
    let replication_addr = app.replication_addr();
    let (shutdown, shutdown_rx) = mpsc::channel(1);
    let handle = tokio::spawn(app.run(shutdown_rx));

    Node {
        addr,
        replication_addr,
        shutdown,
        handle,
    }
}

async fn start_slave(wal_dir: &Path, master_addr: SocketAddr) -> Node {
    let mut config = ServerConfig::default();
    config.network.host = "127.0.0.1".to_string();
    config.network.port = 0;
    config.wal = Some(wal_section(wal_dir));
    config.replication = Some(ReplicationSection {
        role: ReplicaRole::Slave,
        master_address: master_addr.to_string(),
        sync_interval_ms: 20,
        max_replicas: 5,
    });

    let app = App::bind(&config).await.unwrap();
    let addr = app.client_addr().unwrap();
    let (shutdown, shutdown_rx) = mpsc::channel(1);
    let handle = tokio::spawn(app.run(shutdown_rx));

    Node {
        addr,
        replication_addr: None,
        shutdown,
        handle,
    }
}

async fn connect(addr: SocketAddr) -> TcpClient {
    TcpClient::connect(&addr.to_string(), TcpClientOptions::default())
        .await
        .unwrap()
}

async fn query(client: &mut TcpClient, line: &str) -> String {
    let response = client.send(line.as_bytes()).await.unwrap();
    String::from_utf8_lossy(&response).to_string()
}

/// Polls the slave until the key appears or the deadline passes.
async fn wait_for_value(client: &mut TcpClient, key: &str, expected: &str) {
    for _ in 0..250 {
        let response = query(client, &format!("GET {key}")).await;
        if response == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("slave never converged on {key}={expected}");
}

#[tokio::test]
async fn test_slave_converges_on_master_writes() {
    let master_dir = tempfile::TempDir::new().unwrap();
    let slave_dir = tempfile::TempDir::new().unwrap();

    let master = start_master(master_dir.path()).await;
    let slave = start_slave(slave_dir.path(), master.replication_addr.unwrap()).await;

    let mut master_client = connect(master.addr).await;
    let mut slave_client = connect(slave.addr).await;

    assert_eq!(query(&mut master_client, "SET a 1").await, "[ok]");
    wait_for_value(&mut slave_client, "a", "1").await;

    assert_eq!(query(&mut master_client, "SET b 2").await, "[ok]");
    wait_for_value(&mut slave_client, "b", "2").await;

    // Shipped segments land in the slave's own data directory.
    let slave_segments = std::fs::read_dir(slave_dir.path()).unwrap().count();
    assert!(slave_segments >= 2, "expected shipped segments on disk");

    drop(master_client);
    drop(slave_client);
    slave.stop().await;
    master.stop().await;
}

#[tokio::test]
async fn test_slave_rejects_direct_writes() {
    let master_dir = tempfile::TempDir::new().unwrap();
    let slave_dir = tempfile::TempDir::new().unwrap();

    let master = start_master(master_dir.path()).await;
    let slave = start_slave(slave_dir.path(), master.replication_addr.unwrap()).await;

    let mut slave_client = connect(slave.addr).await;

    let response = query(&mut slave_client, "SET a 1").await;
    assert_eq!(
        response,
        "[error] write operations are not allowed on a replica"
    );
    assert_eq!(query(&mut slave_client, "GET a").await, "[not found]");

    drop(slave_client);
    slave.stop().await;
    master.stop().await;
}

#[tokio::test]
async fn test_deletes_replicate() {
    let master_dir = tempfile::TempDir::new().unwrap();
    let slave_dir = tempfile::TempDir::new().unwrap();

    let master = start_master(master_dir.path()).await;
    let slave = start_slave(slave_dir.path(), master.replication_addr.unwrap()).await;

    let mut master_client = connect(master.addr).await;
    let mut slave_client = connect(slave.addr).await;

    assert_eq!(query(&mut master_client, "SET a 1").await, "[ok]");
    wait_for_value(&mut slave_client, "a", "1").await;

    assert_eq!(query(&mut master_client, "DEL a").await, "[ok]");
    wait_for_value(&mut slave_client, "a", "[not found]").await;

    drop(master_client);
    drop(slave_client);
    slave.stop().await;
    master.stop().await;
}
