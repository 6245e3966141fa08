//! Core types shared by every contend crate.
//!
//! Everything here is plain data: the immutable run configuration, the
//! protocol selector and station identifiers. No I/O happens in this crate
//! apart from reading the configuration file.

mod config;
mod identifiers;
mod protocol;

pub use config::{ConfigError, SimulationConfig};
pub use identifiers::StationId;
pub use protocol::{Protocol, UnknownProtocol};
