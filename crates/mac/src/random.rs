//! Per-station random source.

use contend_types::StationId;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::{SystemTime, UNIX_EPOCH};

/// Seeded generator owned by exactly one station.
///
/// Never shared between stations, so no synchronization is needed.
#[derive(Debug, Clone)]
pub struct RandomSource {
    seed: u64,
    rng: ChaCha8Rng,
}

impl RandomSource {
    /// Create a source from an explicit seed.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Create the source for one station.
    ///
    /// With a base seed the result is reproducible; without one the base is
    /// taken from the high-resolution wall clock. Either way the station
    /// index is mixed in so no two stations share a stream.
    pub fn for_station(station: StationId, base_seed: Option<u64>) -> Self {
        let base = base_seed.unwrap_or_else(clock_seed);
        Self::from_seed(station_seed(base, station))
    }

    /// The seed this source was built from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Uniform draw in `[0, 1)`.
    pub fn unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }

    /// Uniform draw in `[0, window - 1]`; zero when the window is empty or one wide.
    pub fn below(&mut self, window: u64) -> u64 {
        if window <= 1 {
            0
        } else {
            self.rng.gen_range(0..window)
        }
    }
}

fn clock_seed() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default()
}

/// splitmix64 finalizer over base and station index.
fn station_seed(base: u64, station: StationId) -> u64 {
    let mut z = base ^ u64::from(station.index()).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
