//! Request/reply grammar.
//!
//! Messages are single lines; the codec adds and strips the `\n`.

use std::fmt;

/// Rejection token: the attempt collided or was denied.
pub const REJECTED: &str = "HUH!";

/// Probe reply meaning the channel is free.
pub const IDLE: &str = "IDLE";

/// Carrier-sense probe.
pub const BUSY_PROBE: &str = "BUSY?";

/// Line that ends the whole stream.
pub const STREAM_END: &str = "$$";

/// Token that ends this station's transfer.
pub const END_OF_FILE: &str = "EOF";

/// Separator between words on a payload line.
pub const WORD_SEPARATOR: char = ',';

/// Station-to-arbiter messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Request {
    /// Ask for data starting at `offset`.
    Fetch { offset: u64 },

    /// Ask whether the channel is idle.
    SenseChannel,
}

impl Request {
    /// Encode to the line sent on the wire (without the trailing newline).
    pub fn encode(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::Fetch { offset } => write!(f, "{offset}"),
            Request::SenseChannel => f.write_str(BUSY_PROBE),
        }
    }
}

/// Arbiter-to-station reply to a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// `HUH!`
    Rejected,

    /// `IDLE`
    Idle,

    /// Anything else: payload lines, in arrival order.
    Data(Vec<String>),
}

impl Reply {
    /// Classify the first line of a reply.
    pub fn classify(line: String) -> Self {
        match line.trim() {
            REJECTED => Reply::Rejected,
            IDLE => Reply::Idle,
            _ => Reply::Data(vec![line]),
        }
    }

    /// Whether the arbiter rejected the attempt.
    pub fn is_rejected(&self) -> bool {
        matches!(self, Reply::Rejected)
    }
}
