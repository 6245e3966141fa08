//! Station lifecycle.
//!
//! A [`StationWorker`] owns everything about one simulated station: its
//! session to the arbiter, its contention policy, its random source and its
//! [`StationState`]. Nothing here is shared with other stations, so no
//! locking is involved. The worker always finishes with a
//! [`StationReport`], whatever went wrong along the way.

mod error;
pub mod output;
mod report;
mod state;
mod worker;

pub use error::StationError;
pub use report::{StationReport, Termination};
pub use state::{AttemptStats, StationState};
pub use worker::StationWorker;
