//! The contention policy seam.

use crate::{
    BackoffCounter, BinaryExponentialBackoff, RandomSource, SensingBackoff, SlottedAloha,
};
use async_trait::async_trait;
use contend_network::wire::IDLE;
use contend_network::{ChannelError, ChannelSession, Reply};
use contend_types::{Protocol, SimulationConfig};

/// Result of one attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// The arbiter accepted the request; carries the reply lines.
    Granted(Vec<String>),

    /// The arbiter answered `HUH!`.
    Rejected,

    /// The policy chose not to transmit; the channel was not touched.
    Deferred,
}

impl AttemptOutcome {
    /// Whether the attempt was granted.
    pub fn is_granted(&self) -> bool {
        matches!(self, AttemptOutcome::Granted(_))
    }

    /// Interpret the reply to an offset request.
    ///
    /// Anything but `HUH!` is a grant. A bare `IDLE` is passed on as data.
    pub fn from_fetch_reply(reply: Reply) -> Self {
        match reply {
            Reply::Rejected => AttemptOutcome::Rejected,
            Reply::Idle => AttemptOutcome::Granted(vec![IDLE.to_string()]),
            Reply::Data(lines) => AttemptOutcome::Granted(lines),
        }
    }
}

/// Everything one attempt may touch. All of it belongs to a single station.
pub struct AttemptContext<'a> {
    pub session: &'a mut ChannelSession,
    pub rng: &'a mut RandomSource,
    pub backoff: &'a mut BackoffCounter,

    /// Request cursor: words consumed so far.
    pub offset: u64,
}

/// One MAC strategy, driven one attempt at a time.
///
/// Implementations return `Err` only for transport failures; those end the
/// station. Rejections and deferrals are ordinary outcomes.
#[async_trait]
pub trait ContentionPolicy: Send {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Make one attempt to get the offset request granted.
    async fn attempt(
        &mut self,
        ctx: &mut AttemptContext<'_>,
    ) -> Result<AttemptOutcome, ChannelError>;
}

/// Build the policy for `protocol` from the run configuration.
pub fn policy_for(protocol: Protocol, config: &SimulationConfig) -> Box<dyn ContentionPolicy> {
    match protocol {
        Protocol::SlottedAloha => Box::new(SlottedAloha::from_config(config)),
        Protocol::Beb => Box::new(BinaryExponentialBackoff::from_config(config)),
        Protocol::SensingBeb => Box::new(SensingBackoff::from_config(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_from_fetch_reply() {
        assert_eq!(
            AttemptOutcome::from_fetch_reply(Reply::Rejected),
            AttemptOutcome::Rejected
        );
        assert_eq!(
            AttemptOutcome::from_fetch_reply(Reply::Data(vec!["a".into()])),
            AttemptOutcome::Granted(vec!["a".into()])
        );
        assert!(AttemptOutcome::from_fetch_reply(Reply::Idle).is_granted());
        assert!(!AttemptOutcome::Deferred.is_granted());
    }

    #[test]
    fn test_policy_for_each_protocol() {
        let config = SimulationConfig::new(2, "127.0.0.1", 1);
        let names: Vec<_> = Protocol::ALL
            .iter()
            .map(|&p| policy_for(p, &config).name())
            .collect();
        assert_eq!(names, vec!["slotted-aloha", "beb", "sensing-beb"]);
    }
}
