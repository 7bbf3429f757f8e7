//! Request/response TCP client.

use std::time::Duration;

use bytes::Bytes;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

use keva_common::constants::DEFAULT_BUFFER_SIZE;

use crate::error::{NetError, NetResult};

/// Tuning knobs for a [`TcpClient`].
#[derive(Debug, Clone)]
pub struct TcpClientOptions {
    /// Size of the response buffer; responses must fit in one buffer.
    pub buffer_size: usize,
    /// Fail a round trip that takes longer than this, if set.
    pub idle_timeout: Option<Duration>,
}

impl Default for TcpClientOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            idle_timeout: None,
        }
    }
}

impl TcpClientOptions {
    /// Sets the response buffer size.
    #[must_use]
    pub fn with_buffer_size(mut self, size: usize) -> Self {
        self.buffer_size = size;
        self
    }

    /// Sets the round-trip timeout.
    #[must_use]
    pub fn with_idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = Some(timeout);
        self
    }
}

/// A client for the raw request/response transport.
#[derive(Debug)]
pub struct TcpClient {
    stream: TcpStream,
    buf: Vec<u8>,
    idle_timeout: Option<Duration>,
}

impl TcpClient {
    /// Connects to `addr`.
    pub async fn connect(addr: &str, options: TcpClientOptions) -> NetResult<Self> {
        let stream = TcpStream::connect(addr).await?;
        Ok(Self {
            stream,
            buf: vec![0u8; options.buffer_size],
            idle_timeout: options.idle_timeout,
        })
    }

    /// Sends one request and returns the response.
    pub async fn send(&mut self, request: &[u8]) -> NetResult<Bytes> {
        match self.idle_timeout {
            Some(limit) => timeout(limit, self.round_trip(request))
                .await
                .map_err(|_| NetError::IdleTimeout)?,
            None => self.round_trip(request).await,
        }
    }

    async fn round_trip(&mut self, request: &[u8]) -> NetResult<Bytes> {
        self.stream.write_all(request).await?;

        let read = self.stream.read(&mut self.buf).await?;
        if read == 0 {
            return Err(NetError::ConnectionClosed);
        }
        if read == self.buf.len() {
            return Err(NetError::BufferOverflow {
                buffer_size: self.buf.len(),
            });
        }

        Ok(Bytes::copy_from_slice(&self.buf[..read]))
    }
}
