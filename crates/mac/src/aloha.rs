//! Slotted ALOHA.

use crate::policy::{AttemptContext, AttemptOutcome, ContentionPolicy};
use crate::slot;
use crate::RandomSource;
use async_trait::async_trait;
use contend_network::{ChannelError, Request};
use contend_types::SimulationConfig;
use std::time::Duration;
use tracing::trace;

/// Transmit with probability `p` per attempt, aligned to wall-clock slot edges.
#[derive(Debug, Clone)]
pub struct SlottedAloha {
    probability: f64,
    slot: Duration,
}

impl SlottedAloha {
    /// Create with an explicit probability (clamped to `[0, 1]`).
    pub fn new(probability: f64, slot: Duration) -> Self {
        Self {
            probability: probability.clamp(0.0, 1.0),
            slot,
        }
    }

    /// `p = 1 / num_stations`, slot from the config.
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.transmit_probability(), config.slot_duration())
    }

    /// Transmission probability per attempt.
    pub fn probability(&self) -> f64 {
        self.probability
    }

    /// Draw once and decide whether to transmit this round.
    pub fn should_transmit(&self, rng: &mut RandomSource) -> bool {
        rng.unit() < self.probability
    }
}

#[async_trait]
impl ContentionPolicy for SlottedAloha {
    fn name(&self) -> &'static str {
        "slotted-aloha"
    }

    async fn attempt(
        &mut self,
        ctx: &mut AttemptContext<'_>,
    ) -> Result<AttemptOutcome, ChannelError> {
        if !self.should_transmit(ctx.rng) {
            trace!(offset = ctx.offset, "Not transmitting this round");
            return Ok(AttemptOutcome::Deferred);
        }

        slot::sleep_until_next_slot(self.slot).await;

        let reply = ctx
            .session
            .exchange(Request::Fetch { offset: ctx.offset })
            .await?;
        let outcome = AttemptOutcome::from_fetch_reply(reply);
        if outcome.is_granted() {
            ctx.backoff.reset();
        }
        Ok(outcome)
    }
}
