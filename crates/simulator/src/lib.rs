//! Contention simulator.
//!
//! Spawns one [`StationWorker`](contend_station::StationWorker) per configured
//! station, all contending for the same arbiter, and aggregates their
//! [`StationReport`](contend_station::StationReport)s into a
//! [`SimulationReport`].
//!
//! # Example
//!
//! ```ignore
//! use contend_simulator::SimulationRunner;
//! use contend_types::{Protocol, SimulationConfig};
//!
//! let config = SimulationConfig::load("config.json")?;
//! let report = SimulationRunner::new(config, Protocol::Beb)?
//!     .with_output_dir("out")
//!     .run()
//!     .await;
//! report.print();
//! ```

mod report;
mod runner;

pub use report::SimulationReport;
pub use runner::SimulationRunner;
