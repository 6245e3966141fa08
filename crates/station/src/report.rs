//! What a station reports when it is done.

use crate::AttemptStats;
use contend_types::StationId;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Why a station stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Termination {
    /// The arbiter sent `$$`.
    StreamEnd,

    /// A granted payload contained the `EOF` token.
    EndOfFile,

    /// Every attempt of one request round failed.
    RetryExhausted { attempts: u32 },

    /// The arbiter closed the connection.
    PeerClosed,

    /// Any other transport failure after connecting.
    Transport(String),

    /// The station never got a connection.
    ConnectFailed(String),

    /// The run's time budget expired.
    Cancelled,

    /// The station's task panicked or was aborted.
    Aborted(String),
}

impl Termination {
    /// Whether the station consumed its stream to the end.
    pub fn is_success(&self) -> bool {
        matches!(self, Termination::StreamEnd | Termination::EndOfFile)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Termination::StreamEnd => write!(f, "end of stream"),
            Termination::EndOfFile => write!(f, "end of file"),
            Termination::RetryExhausted { attempts } => {
                write!(f, "gave up after {attempts} attempts")
            }
            Termination::PeerClosed => write!(f, "arbiter closed connection"),
            Termination::Transport(e) => write!(f, "transport error: {e}"),
            Termination::ConnectFailed(e) => write!(f, "connect failed: {e}"),
            Termination::Cancelled => write!(f, "cancelled"),
            Termination::Aborted(e) => write!(f, "aborted: {e}"),
        }
    }
}

/// Final account of one station.
#[derive(Debug, Clone)]
pub struct StationReport {
    pub station: StationId,
    pub termination: Termination,

    /// Wall time from start to finalization.
    pub elapsed: Duration,

    pub words_received: u64,
    pub distinct_words: usize,

    /// Final request cursor.
    pub offset: u64,

    pub stats: AttemptStats,

    /// Frequency file, if one was written.
    pub output: Option<PathBuf>,
}

impl StationReport {
    /// Report for a station that produced nothing.
    pub fn empty(station: StationId, termination: Termination, elapsed: Duration) -> Self {
        Self {
            station,
            termination,
            elapsed,
            words_received: 0,
            distinct_words: 0,
            offset: 0,
            stats: AttemptStats::default(),
            output: None,
        }
    }

    /// Report for a station whose task died before it could report.
    pub fn aborted(station: StationId, reason: impl Into<String>, elapsed: Duration) -> Self {
        Self::empty(station, Termination::Aborted(reason.into()), elapsed)
    }
}
