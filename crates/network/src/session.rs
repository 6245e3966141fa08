//! One station's connection to the arbiter.

use crate::error::ChannelError;
use crate::wire::{Reply, Request};
use contend_types::SimulationConfig;
use futures::{FutureExt, SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_util::codec::{Framed, LinesCodec};
use tracing::{debug, trace};

/// Transport tuning for a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Longest accepted line, in bytes.
    pub max_message_bytes: usize,

    /// Per-line read timeout.
    pub read_timeout: Option<Duration>,

    /// Connect timeout.
    pub connect_timeout: Option<Duration>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_message_bytes: 1024,
            read_timeout: None,
            connect_timeout: None,
        }
    }
}

impl SessionOptions {
    /// Take transport settings from the run configuration.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            max_message_bytes: config.max_message_bytes,
            read_timeout: config.read_timeout(),
            connect_timeout: config.connect_timeout(),
        }
    }
}

/// A framed, line-oriented TCP connection to the arbiter.
///
/// Requests are strictly sequential: callers send one request and read its
/// reply before sending the next.
pub struct ChannelSession {
    peer: SocketAddr,
    framed: Framed<TcpStream, LinesCodec>,
    options: SessionOptions,

    /// Decode error met while draining a reply; reported by the next read.
    pending: Option<ChannelError>,
}

impl ChannelSession {
    /// Resolve `host` and connect to the first address that accepts.
    pub async fn connect(
        host: &str,
        port: u16,
        options: SessionOptions,
    ) -> Result<Self, ChannelError> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
            .await
            .map_err(|source| ChannelError::Resolve {
                host: host.to_string(),
                port,
                source,
            })?
            .collect();

        let mut last_err = ChannelError::NoAddress {
            host: host.to_string(),
            port,
        };

        for addr in addrs {
            match Self::connect_addr(addr, options.connect_timeout).await {
                Ok(stream) => return Self::from_stream(stream, options),
                Err(e) => {
                    debug!(%addr, error = %e, "Connect attempt failed");
                    last_err = e;
                }
            }
        }

        Err(last_err)
    }

    async fn connect_addr(
        addr: SocketAddr,
        timeout: Option<Duration>,
    ) -> Result<TcpStream, ChannelError> {
        let connect = TcpStream::connect(addr);
        let result = match timeout {
            Some(timeout) => tokio::time::timeout(timeout, connect)
                .await
                .map_err(|_| ChannelError::ConnectTimeout { addr, timeout })?,
            None => connect.await,
        };
        result.map_err(|source| ChannelError::Connect { addr, source })
    }

    /// Wrap an already-connected stream.
    pub fn from_stream(stream: TcpStream, options: SessionOptions) -> Result<Self, ChannelError> {
        let peer = stream.peer_addr()?;
        stream.set_nodelay(true)?;
        let codec = LinesCodec::new_with_max_length(options.max_message_bytes);

        Ok(Self {
            peer,
            framed: Framed::new(stream, codec),
            options,
            pending: None,
        })
    }

    /// Address of the arbiter.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Send one line; the newline is appended here.
    pub async fn send_line(&mut self, line: &str) -> Result<(), ChannelError> {
        trace!(line, "send");
        let max = self.options.max_message_bytes;
        self.framed
            .send(line)
            .await
            .map_err(|e| ChannelError::from_codec(e, max))
    }

    /// Send a protocol request.
    pub async fn send(&mut self, request: Request) -> Result<(), ChannelError> {
        self.send_line(&request.encode()).await
    }

    /// Wait for the next line.
    pub async fn receive_line(&mut self) -> Result<String, ChannelError> {
        if let Some(err) = self.pending.take() {
            return Err(err);
        }

        let max = self.options.max_message_bytes;
        let next = self.framed.next();

        let item = match self.options.read_timeout {
            Some(timeout) => tokio::time::timeout(timeout, next)
                .await
                .map_err(|_| ChannelError::ReadTimeout(timeout))?,
            None => next.await,
        };

        match item {
            Some(Ok(line)) => {
                trace!(line = %line, "recv");
                Ok(line)
            }
            Some(Err(e)) => Err(ChannelError::from_codec(e, max)),
            None => Err(ChannelError::EndOfStream),
        }
    }

    /// Wait for a reply and classify it.
    ///
    /// Data replies also include every further line that is already
    /// available without waiting, so a multi-line payload written in one go
    /// is returned as one reply.
    pub async fn receive_reply(&mut self) -> Result<Reply, ChannelError> {
        let first = self.receive_line().await?;
        match Reply::classify(first) {
            Reply::Data(mut lines) => {
                lines.extend(self.drain_ready());
                Ok(Reply::Data(lines))
            }
            other => Ok(other),
        }
    }

    /// Send a request and wait for its reply.
    pub async fn exchange(&mut self, request: Request) -> Result<Reply, ChannelError> {
        self.send(request).await?;
        self.receive_reply().await
    }

    /// Lines that can be read right now without blocking.
    ///
    /// Stops at the first decode error, which is held back for the next
    /// [`receive_line`](Self::receive_line) so the lines before it still
    /// reach the caller.
    fn drain_ready(&mut self) -> Vec<String> {
        let max = self.options.max_message_bytes;
        let mut lines = Vec::new();

        while let Some(item) = self.framed.next().now_or_never() {
            match item {
                Some(Ok(line)) => lines.push(line),
                Some(Err(e)) => {
                    self.pending = Some(ChannelError::from_codec(e, max));
                    break;
                }
                // Peer closed; the next receive reports it
                None => break,
            }
        }

        lines
    }

    /// Flush and shut down the write half.
    pub async fn close(mut self) -> Result<(), ChannelError> {
        let max = self.options.max_message_bytes;
        SinkExt::<&str>::close(&mut self.framed)
            .await
            .map_err(|e| ChannelError::from_codec(e, max))
    }
}
