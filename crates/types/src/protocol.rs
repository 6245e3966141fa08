//! Contention protocol selector.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The medium-access strategy every station in a run uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    /// Slotted ALOHA: transmit with probability `1 / num_stations`, aligned to slot edges.
    SlottedAloha,

    /// Binary exponential backoff: random wait of up to `2^k - 1` slots before each attempt.
    Beb,

    /// Carrier-sensing BEB: probe the channel until idle, fall back to BEB on collision.
    SensingBeb,
}

impl Protocol {
    /// All protocols, in CLI order.
    pub const ALL: [Protocol; 3] = [Protocol::SlottedAloha, Protocol::Beb, Protocol::SensingBeb];

    /// The name accepted on the command line.
    pub fn cli_name(self) -> &'static str {
        match self {
            Protocol::SlottedAloha => "aloha",
            Protocol::Beb => "beb",
            Protocol::SensingBeb => "sensing",
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cli_name())
    }
}

/// Returned when a protocol name is not one of `aloha`, `beb` or `sensing`.
#[derive(Debug, Clone, Error)]
#[error("unknown protocol '{0}', expected one of: aloha, beb, sensing")]
pub struct UnknownProtocol(pub String);

impl FromStr for Protocol {
    type Err = UnknownProtocol;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "aloha" | "slotted-aloha" => Ok(Protocol::SlottedAloha),
            "beb" => Ok(Protocol::Beb),
            "sensing" | "sensing-beb" => Ok(Protocol::SensingBeb),
            _ => Err(UnknownProtocol(s.to_string())),
        }
    }
}
