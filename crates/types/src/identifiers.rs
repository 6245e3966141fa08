//! Domain-specific identifier types.

use std::fmt;

/// Station identifier.
///
/// Stations are numbered `0..num_stations` in spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StationId(pub u32);

impl StationId {
    /// Get the raw index.
    pub fn index(self) -> u32 {
        self.0
    }

    /// Iterate over the first `count` station ids.
    pub fn range(count: u32) -> impl Iterator<Item = StationId> {
        (0..count).map(StationId)
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Station({})", self.0)
    }
}
