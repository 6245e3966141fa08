//! Transport to the channel arbiter.
//!
//! The arbiter speaks a newline-terminated ASCII protocol over TCP:
//!
//! ```text
//! station -> arbiter   "<offset>\n"   request data starting at offset
//! station -> arbiter   "BUSY?\n"      carrier-sense probe
//! arbiter -> station   "HUH!\n"       attempt rejected (collision)
//! arbiter -> station   "IDLE\n"       channel free
//! arbiter -> station   "a,b,c\n"      granted payload
//! arbiter -> station   "$$\n"         end of the whole stream
//! ```
//!
//! [`wire`] holds the grammar, [`payload`] the tokenizer for granted data,
//! and [`ChannelSession`] owns one framed TCP connection.

mod error;
pub mod payload;
mod session;
pub mod wire;

pub use error::ChannelError;
pub use payload::{Payload, Terminator};
pub use session::{ChannelSession, SessionOptions};
pub use wire::{Reply, Request};
