//! Transport errors.

use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// Errors that can occur on a channel session.
///
/// The first four variants happen before a session exists; a station that
/// hits one of them produces no output. The rest happen mid-session and
/// leave the station with whatever it has collected so far.
#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("failed to resolve {host}:{port}: {source}")]
    Resolve {
        host: String,
        port: u16,
        #[source]
        source: std::io::Error,
    },

    #[error("no usable address for {host}:{port}")]
    NoAddress { host: String, port: u16 },

    #[error("connection to {addr} failed: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("connection to {addr} timed out after {timeout:?}")]
    ConnectTimeout { addr: SocketAddr, timeout: Duration },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("peer closed the connection")]
    EndOfStream,

    #[error("no reply within {0:?}")]
    ReadTimeout(Duration),

    #[error("message exceeds {max} bytes")]
    MessageTooLong { max: usize },
}

impl ChannelError {
    /// True for failures that prevented the session from being established.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            ChannelError::Resolve { .. }
                | ChannelError::NoAddress { .. }
                | ChannelError::Connect { .. }
                | ChannelError::ConnectTimeout { .. }
        )
    }

    /// Convert a codec error, tagging length violations with the configured limit.
    pub(crate) fn from_codec(err: LinesCodecError, max: usize) -> Self {
        match err {
            LinesCodecError::MaxLineLengthExceeded => ChannelError::MessageTooLong { max },
            LinesCodecError::Io(e) => ChannelError::Io(e),
        }
    }
}
