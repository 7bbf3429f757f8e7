//! Request/response TCP server.

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use keva_common::constants::{DEFAULT_BUFFER_SIZE, DEFAULT_MAX_CONNECTIONS};
use keva_concurrency::Semaphore;

use crate::error::{NetError, NetResult};

/// Tuning knobs for a [`TcpServer`].
#[derive(Debug, Clone)]
pub struct TcpServerOptions {
    /// Bound on concurrent connections.
    pub max_connections: usize,
    /// Size of the per-connection request buffer.
    pub buffer_size: usize,
    /// Close a connection after this long without traffic, if set.
    pub idle_timeout: Option<Duration>,
}

impl Default for TcpServerOptions {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            buffer_size: DEFAULT_BUFFER_SIZE,
            idle_timeout: None,
        }
    }
}

impl TcpServerOptions {
    /// Sets the connection bound.
    #[must_use]
    pub fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the request buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets the idle timeout.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }
}

/// A request/response TCP server.
///
/// Each accepted connection runs in its own task, admitted through a counting
/// semaphore so at most `max_connections` run at once. A faulty connection is
/// logged and dropped without disturbing the rest; task isolation also keeps
/// an unexpected panic in one handler from taking the server down.
#[derive(Debug)]
pub struct TcpServer {
    listener: TcpListener,
    semaphore: Semaphore,
    options: TcpServerOptions,
}

impl TcpServer {
    /// Binds to `addr`.
    pub async fn bind(addr: &str, options: TcpServerOptions) -> NetResult<Self> {
        let listener = TcpListener::bind(addr).await?;
        info!(addr = %listener.local_addr()?, "listening");

        Ok(Self {
            listener,
            semaphore: Semaphore::new(options.max_connections),
            options,
        })
    }

    /// Returns the bound address (useful with port 0).
    pub fn local_addr(&self) -> NetResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts and serves connections until `shutdown` fires.
    ///
    /// Every request is passed to `handler`; whatever it returns is written
    /// back as the response.
    pub async fn serve<F, Fut>(self, handler: F, mut shutdown: mpsc::Receiver<()>)
    where
        F: Fn(Bytes) -> Fut + Clone + Send + Sync + 'static,
        Fut: Future<Output = Bytes> + Send,
    {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    info!("server shutdown requested");
                    return;
                }
                accepted = self.listener.accept() => {
                    let (stream, addr) = match accepted {
                        Ok(accepted) => accepted,
                        Err(err) => {
                            error!(error = %err, "failed to accept connection");
                            continue;
                        }
                    };

                    let permit = self.semaphore.acquire().await;
                    debug!(%addr, "accepted connection");

                    let handler = handler.clone();
                    let options = self.options.clone();
                    tokio::spawn(async move {
                        let _permit = permit;
                        match handle_connection(stream, handler, &options).await {
                            Ok(()) | Err(NetError::ConnectionClosed) => {}
                            Err(err) => {
                                warn!(%addr, error = %err, "connection closed with error");
                            }
                        }
                    });
                }
            }
        }
    }
}

/// Serves one connection until the peer disconnects or an error occurs.
async fn handle_connection<F, Fut>(
    mut stream: TcpStream,
    handler: F,
    options: &TcpServerOptions,
) -> NetResult<()>
where
    F: Fn(Bytes) -> Fut,
    Fut: Future<Output = Bytes>,
{
    let mut buf = vec![0u8; options.buffer_size];

    loop {
        let read = match options.idle_timeout {
            Some(limit) => timeout(limit, stream.read(&mut buf))
                .await
                .map_err(|_| NetError::IdleTimeout)??,
            None => stream.read(&mut buf).await?,
        };

        if read == 0 {
            return Err(NetError::ConnectionClosed);
        }
        if read == options.buffer_size {
            return Err(NetError::BufferOverflow {
                buffer_size: options.buffer_size,
            });
        }

        let response = handler(Bytes::copy_from_slice(&buf[..read])).await;

        match options.idle_timeout {
            Some(limit) => timeout(limit, stream.write_all(&response))
                .await
                .map_err(|_| NetError::IdleTimeout)??,
            None => stream.write_all(&response).await?,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{TcpClient, TcpClientOptions};

    async fn spawn_echo_server(options: TcpServerOptions) -> (SocketAddr, mpsc::Sender<()>) {
        let server = TcpServer::bind("127.0.0.1:0", options).await.unwrap();
        let addr = server.local_addr().unwrap();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);

        tokio::spawn(server.serve(
            |request: Bytes| async move {
                let mut response = b"echo:".to_vec();
                response.extend_from_slice(&request);
                Bytes::from(response)
            },
            shutdown_rx,
        ));

        (addr, shutdown_tx)
    }

    #[tokio::test]
    async fn test_request_response() {
        let (addr, _shutdown) = spawn_echo_server(TcpServerOptions::default()).await;

        let mut client = TcpClient::connect(&addr.to_string(), TcpClientOptions::default())
            .await
            .unwrap();
        let response = client.send(b"hello").await.unwrap();
        assert_eq!(&response[..], b"echo:hello");
    }

    #[tokio::test]
    async fn test_multiple_requests_one_connection() {
        let (addr, _shutdown) = spawn_echo_server(TcpServerOptions::default()).await;

        let mut client = TcpClient::connect(&addr.to_string(), TcpClientOptions::default())
            .await
            .unwrap();
        for i in 0..10 {
            let request = format!("req-{i}");
            let response = client.send(request.as_bytes()).await.unwrap();
            assert_eq!(response, format!("echo:req-{i}"));
        }
    }

    #[tokio::test]
    async fn test_concurrent_clients() {
        let (addr, _shutdown) =
            spawn_echo_server(TcpServerOptions::default().with_max_connections(8)).await;

        let mut handles = Vec::new();
        for i in 0..8 {
            handles.push(tokio::spawn(async move {
                let mut client =
                    TcpClient::connect(&addr.to_string(), TcpClientOptions::default())
                        .await
                        .unwrap();
                client.send(format!("c{i}").as_bytes()).await.unwrap()
            }));
        }

        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.await.unwrap(), format!("echo:c{i}"));
        }
    }

    #[tokio::test]
    async fn test_shutdown_stops_accepting() {
        let (addr, shutdown) = spawn_echo_server(TcpServerOptions::default()).await;

        shutdown.send(()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;

        let connected = TcpClient::connect(&addr.to_string(), TcpClientOptions::default()).await;
        // Either the connection is refused outright or the first request
        // fails; the server must no longer answer.
        if let Ok(mut client) = connected {
            assert!(client.send(b"ping").await.is_err());
        }
    }
}
