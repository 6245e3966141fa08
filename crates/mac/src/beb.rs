//! Binary exponential backoff.

use crate::policy::{AttemptContext, AttemptOutcome, ContentionPolicy};
use crate::slot;
use async_trait::async_trait;
use contend_network::{ChannelError, Request};
use contend_types::SimulationConfig;
use std::time::Duration;
use tracing::{debug, trace};

/// Wait a random number of slots from the backoff window, then transmit.
#[derive(Debug, Clone)]
pub struct BinaryExponentialBackoff {
    slot: Duration,
}

impl BinaryExponentialBackoff {
    pub fn new(slot: Duration) -> Self {
        Self { slot }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(config.slot_duration())
    }
}

#[async_trait]
impl ContentionPolicy for BinaryExponentialBackoff {
    fn name(&self) -> &'static str {
        "beb"
    }

    async fn attempt(
        &mut self,
        ctx: &mut AttemptContext<'_>,
    ) -> Result<AttemptOutcome, ChannelError> {
        backoff_attempt(self.slot, ctx).await
    }
}

/// One BEB attempt: wait `U[0, 2^k - 1]` slots, send, update `k` from the reply.
pub(crate) async fn backoff_attempt(
    slot: Duration,
    ctx: &mut AttemptContext<'_>,
) -> Result<AttemptOutcome, ChannelError> {
    let wait_slots = ctx.rng.below(ctx.backoff.window());
    trace!(
        backoff = ctx.backoff.value(),
        wait_slots,
        "Backing off before transmit"
    );
    tokio::time::sleep(slot::slots(slot, wait_slots)).await;

    let reply = ctx
        .session
        .exchange(Request::Fetch { offset: ctx.offset })
        .await?;

    let outcome = AttemptOutcome::from_fetch_reply(reply);
    if outcome.is_granted() {
        ctx.backoff.reset();
    } else {
        let backoff = ctx.backoff.on_rejected();
        debug!(backoff, "Collision, widening backoff window");
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::session_for;
    use crate::{BackoffCounter, RandomSource};
    use contend_test_helpers::{Arbiter, ArbiterStep};

    #[tokio::test]
    async fn test_rejections_widen_then_grant_resets() {
        let arbiter = Arbiter::scripted(vec![vec![
            ArbiterStep::reject(),
            ArbiterStep::reject(),
            ArbiterStep::reject(),
            ArbiterStep::lines(&["w"]),
        ]])
        .await
        .unwrap();
        let mut session = session_for(&arbiter).await;
        let mut rng = RandomSource::from_seed(5);
        let mut backoff = BackoffCounter::default();
        let mut beb = BinaryExponentialBackoff::new(Duration::from_millis(1));

        let mut observed = Vec::new();
        for _ in 0..4 {
            let mut ctx = AttemptContext {
                session: &mut session,
                rng: &mut rng,
                backoff: &mut backoff,
                offset: 0,
            };
            let outcome = beb.attempt(&mut ctx).await.unwrap();
            observed.push((outcome.is_granted(), backoff.value()));
        }

        assert_eq!(
            observed,
            vec![(false, 1), (false, 2), (false, 3), (true, 0)]
        );
    }

    #[tokio::test]
    async fn test_backoff_clamped_at_bound() {
        let script = vec![ArbiterStep::reject(); 4];
        let arbiter = Arbiter::scripted(vec![script]).await.unwrap();
        let mut session = session_for(&arbiter).await;
        let mut rng = RandomSource::from_seed(11);
        let mut backoff = BackoffCounter::new(2);
        let mut beb = BinaryExponentialBackoff::new(Duration::from_millis(1));

        for _ in 0..4 {
            let mut ctx = AttemptContext {
                session: &mut session,
                rng: &mut rng,
                backoff: &mut backoff,
                offset: 3,
            };
            assert_eq!(beb.attempt(&mut ctx).await.unwrap(), AttemptOutcome::Rejected);
            assert!(backoff.value() <= 2);
        }
        assert_eq!(backoff.value(), 2);
        assert_eq!(arbiter.received_on(0), vec!["3"; 4]);
    }

    #[tokio::test]
    async fn test_transport_error_propagates() {
        let arbiter = Arbiter::scripted(vec![vec![ArbiterStep::Close]])
            .await
            .unwrap();
        let mut session = session_for(&arbiter).await;
        let mut rng = RandomSource::from_seed(2);
        let mut backoff = BackoffCounter::default();
        let mut beb = BinaryExponentialBackoff::new(Duration::from_millis(1));

        let mut ctx = AttemptContext {
            session: &mut session,
            rng: &mut rng,
            backoff: &mut backoff,
            offset: 0,
        };
        let err = beb.attempt(&mut ctx).await.unwrap_err();
        assert!(matches!(err, ChannelError::EndOfStream));
        assert_eq!(backoff.value(), 0);
    }
}
