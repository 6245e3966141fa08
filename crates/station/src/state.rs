//! Per-station mutable state.

use contend_mac::{AttemptOutcome, BackoffCounter};
use contend_network::Payload;
use std::collections::BTreeMap;

/// Counts of attempt outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttemptStats {
    pub attempts: u64,
    pub granted: u64,
    pub rejected: u64,
    pub deferred: u64,
}

impl AttemptStats {
    /// Record one attempt.
    pub fn record(&mut self, outcome: &AttemptOutcome) {
        self.attempts += 1;
        match outcome {
            AttemptOutcome::Granted(_) => self.granted += 1,
            AttemptOutcome::Rejected => self.rejected += 1,
            AttemptOutcome::Deferred => self.deferred += 1,
        }
    }
}

/// State owned by exactly one station.
#[derive(Debug, Clone)]
pub struct StationState {
    /// Words consumed so far; sent with every request.
    pub offset: u64,

    /// BEB exponent.
    pub backoff: BackoffCounter,

    /// Total words received.
    pub words_received: u64,

    /// Attempt outcome counters.
    pub stats: AttemptStats,

    /// Word -> occurrences, ordered by word.
    word_frequency: BTreeMap<String, u64>,
}

impl StationState {
    /// Fresh state with the given backoff bound.
    pub fn new(max_backoff_exponent: u32) -> Self {
        Self {
            offset: 0,
            backoff: BackoffCounter::new(max_backoff_exponent),
            words_received: 0,
            stats: AttemptStats::default(),
            word_frequency: BTreeMap::new(),
        }
    }

    /// Count one received word and advance the cursor past it.
    pub fn record_word(&mut self, word: &str) {
        match self.word_frequency.get_mut(word) {
            Some(count) => *count += 1,
            None => {
                self.word_frequency.insert(word.to_string(), 1);
            }
        }
        self.words_received += 1;
        self.offset += 1;
    }

    /// Count every word of a granted payload.
    pub fn consume(&mut self, payload: &Payload) {
        for word in &payload.words {
            self.record_word(word);
        }
    }

    /// Frequencies in ascending word order.
    pub fn frequencies(&self) -> &BTreeMap<String, u64> {
        &self.word_frequency
    }

    /// Number of distinct words seen.
    pub fn distinct_words(&self) -> usize {
        self.word_frequency.len()
    }
}

impl Default for StationState {
    fn default() -> Self {
        Self::new(BackoffCounter::DEFAULT_MAX)
    }
}
