//! Station errors.

use contend_network::ChannelError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a station's consumption loop or its finalization.
#[derive(Debug, Error)]
pub enum StationError {
    #[error(transparent)]
    Channel(#[from] ChannelError),

    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("station cancelled")]
    Cancelled,
}
