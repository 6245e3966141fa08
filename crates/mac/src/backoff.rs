//! Binary exponential backoff state.

/// Backoff exponent `k`, bounded to `[0, max]`.
///
/// The wait window before an attempt is `2^k` slots. A rejection raises `k`
/// by one up to the bound; a grant resets it to zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffCounter {
    exponent: u32,
    max: u32,
}

impl BackoffCounter {
    /// Default bound on the exponent.
    pub const DEFAULT_MAX: u32 = 10;

    /// Create a counter at zero with the given bound.
    pub fn new(max: u32) -> Self {
        Self { exponent: 0, max }
    }

    /// Current exponent.
    pub fn value(&self) -> u32 {
        self.exponent
    }

    /// Upper bound of the exponent.
    pub fn max(&self) -> u32 {
        self.max
    }

    /// Number of slots to draw the wait from: `2^k`.
    pub fn window(&self) -> u64 {
        1u64 << self.exponent
    }

    /// Record a rejection. Returns the new exponent.
    pub fn on_rejected(&mut self) -> u32 {
        self.exponent = (self.exponent + 1).min(self.max);
        self.exponent
    }

    /// Record a grant.
    pub fn reset(&mut self) {
        self.exponent = 0;
    }
}

impl Default for BackoffCounter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_increments_and_clamps() {
        let mut backoff = BackoffCounter::default();
        for expected in 1..=10 {
            assert_eq!(backoff.on_rejected(), expected);
        }

        // Stays at the bound
        for _ in 0..5 {
            assert_eq!(backoff.on_rejected(), 10);
        }
        assert_eq!(backoff.window(), 1024);
    }

    #[test]
    fn test_reset_on_grant() {
        let mut backoff = BackoffCounter::default();
        backoff.on_rejected();
        backoff.on_rejected();
        assert_eq!(backoff.window(), 4);

        backoff.reset();
        assert_eq!(backoff.value(), 0);
        assert_eq!(backoff.window(), 1);
    }

    #[test]
    fn test_mixed_sequences_stay_in_bounds() {
        // Deterministic pseudo-random grant/reject pattern
        let mut backoff = BackoffCounter::default();
        let mut state = 0x2545_F491_4F6C_DD1Du64;
        for _ in 0..10_000 {
            state ^= state << 13;
            state ^= state >> 7;
            state ^= state << 17;

            let before = backoff.value();
            if state % 4 == 0 {
                backoff.reset();
                assert_eq!(backoff.value(), 0);
            } else {
                let after = backoff.on_rejected();
                assert_eq!(after, (before + 1).min(10));
            }
            assert!(backoff.value() <= 10);
        }
    }

    #[test]
    fn test_zero_bound() {
        let mut backoff = BackoffCounter::new(0);
        assert_eq!(backoff.on_rejected(), 0);
        assert_eq!(backoff.window(), 1);
    }
}
