//! Carrier-sensing binary exponential backoff.

use crate::beb::backoff_attempt;
use crate::policy::{AttemptContext, AttemptOutcome, ContentionPolicy};
use async_trait::async_trait;
use contend_network::{ChannelError, Reply, Request};
use contend_types::SimulationConfig;
use std::time::Duration;
use tracing::{debug, trace};

/// Probe the channel until it reports idle, then transmit.
///
/// A collision right after an idle probe is resolved with one BEB attempt.
#[derive(Debug, Clone)]
pub struct SensingBackoff {
    slot: Duration,
    sense_interval: Duration,
}

impl SensingBackoff {
    pub fn new(slot: Duration, sense_interval: Duration) -> Self {
        Self {
            slot,
            sense_interval,
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.slot_duration(), config.sense_interval())
    }

    /// Poll until the channel is idle. Returns the number of busy replies seen.
    async fn wait_for_idle(&self, ctx: &mut AttemptContext<'_>) -> Result<u64, ChannelError> {
        let mut busy = 0u64;
        loop {
            match ctx.session.exchange(Request::SenseChannel).await? {
                Reply::Idle => return Ok(busy),
                reply => {
                    busy += 1;
                    trace!(?reply, busy, "Channel busy");
                    tokio::time::sleep(self.sense_interval).await;
                }
            }
        }
    }
}

#[async_trait]
impl ContentionPolicy for SensingBackoff {
    fn name(&self) -> &'static str {
        "sensing-beb"
    }

    async fn attempt(
        &mut self,
        ctx: &mut AttemptContext<'_>,
    ) -> Result<AttemptOutcome, ChannelError> {
        let busy = self.wait_for_idle(ctx).await?;
        if busy > 0 {
            debug!(busy, "Channel became idle");
        }

        let reply = ctx
            .session
            .exchange(Request::Fetch { offset: ctx.offset })
            .await?;

        if reply.is_rejected() {
            debug!("Collision after idle probe, resolving with backoff");
            return backoff_attempt(self.slot, ctx).await;
        }

        ctx.backoff.reset();
        Ok(AttemptOutcome::from_fetch_reply(reply))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::session_for;
    use crate::{BackoffCounter, RandomSource};
    use contend_test_helpers::{Arbiter, ArbiterStep};

    #[tokio::test]
    async fn test_busy_probe_sleeps_and_reprobes() {
        let arbiter = Arbiter::scripted(vec![vec![
            ArbiterStep::busy(),
            ArbiterStep::busy(),
            ArbiterStep::idle(),
            ArbiterStep::lines(&["w1,w2"]),
        ]])
        .await
        .unwrap();
        let mut session = session_for(&arbiter).await;
        let mut rng = RandomSource::from_seed(3);
        let mut backoff = BackoffCounter::default();
        let interval = Duration::from_millis(20);
        let mut sensing = SensingBackoff::new(Duration::from_millis(1), interval);

        let mut ctx = AttemptContext {
            session: &mut session,
            rng: &mut rng,
            backoff: &mut backoff,
            offset: 4,
        };
        let outcome = sensing.attempt(&mut ctx).await.unwrap();
        assert_eq!(outcome, AttemptOutcome::Granted(vec!["w1,w2".to_string()]));

        let received = arbiter.received();
        let lines: Vec<_> = received.iter().map(|r| r.line.as_str()).collect();
        assert_eq!(lines, vec!["BUSY?", "BUSY?", "BUSY?", "4"]);

        // Each busy reply is followed by a full interval before the next probe
        assert!(received[1].at - received[0].at >= interval);
        assert!(received[2].at - received[1].at >= interval);
    }

    #[tokio::test]
    async fn test_collision_falls_back_to_one_backoff_attempt() {
        let arbiter = Arbiter::scripted(vec![vec![
            ArbiterStep::idle(),
            ArbiterStep::reject(),
            ArbiterStep::reject(),
        ]])
        .await
        .unwrap();
        let mut session = session_for(&arbiter).await;
        let mut rng = RandomSource::from_seed(3);
        let mut backoff = BackoffCounter::default();
        let mut sensing = SensingBackoff::new(Duration::from_millis(1), Duration::from_millis(1));

        let mut ctx = AttemptContext {
            session: &mut session,
            rng: &mut rng,
            backoff: &mut backoff,
            offset: 0,
        };
        let outcome = sensing.attempt(&mut ctx).await.unwrap();
        assert_eq!(outcome, AttemptOutcome::Rejected);

        // Only the fallback attempt widens the window
        assert_eq!(backoff.value(), 1);
        assert_eq!(arbiter.received_on(0), vec!["BUSY?", "0", "0"]);
    }

    #[tokio::test]
    async fn test_fallback_grant_resets_backoff() {
        let arbiter = Arbiter::scripted(vec![vec![
            ArbiterStep::idle(),
            ArbiterStep::reject(),
            ArbiterStep::lines(&["ok"]),
        ]])
        .await
        .unwrap();
        let mut session = session_for(&arbiter).await;
        let mut rng = RandomSource::from_seed(8);
        let mut backoff = BackoffCounter::default();
        backoff.on_rejected();
        let mut sensing = SensingBackoff::new(Duration::from_millis(1), Duration::from_millis(1));

        let mut ctx = AttemptContext {
            session: &mut session,
            rng: &mut rng,
            backoff: &mut backoff,
            offset: 2,
        };
        let outcome = sensing.attempt(&mut ctx).await.unwrap();
        assert!(outcome.is_granted());
        assert_eq!(backoff.value(), 0);
    }

    #[tokio::test]
    async fn test_idle_then_grant() {
        let arbiter = Arbiter::scripted(vec![vec![ArbiterStep::idle(), ArbiterStep::lines(&["x"])]])
            .await
            .unwrap();
        let mut session = session_for(&arbiter).await;
        let mut rng = RandomSource::from_seed(1);
        let mut backoff = BackoffCounter::default();
        backoff.on_rejected();
        backoff.on_rejected();
        let mut sensing = SensingBackoff::new(Duration::from_millis(1), Duration::from_millis(1));

        let mut ctx = AttemptContext {
            session: &mut session,
            rng: &mut rng,
            backoff: &mut backoff,
            offset: 9,
        };
        assert!(sensing.attempt(&mut ctx).await.unwrap().is_granted());
        assert_eq!(backoff.value(), 0);
        assert_eq!(arbiter.received_on(0), vec!["BUSY?", "9"]);
    }
}
