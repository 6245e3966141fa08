//! The per-station task.

use crate::output;
use crate::{StationError, StationReport, StationState, Termination};
use contend_mac::{policy_for, AttemptContext, AttemptOutcome, ContentionPolicy, RandomSource};
use contend_network::{ChannelError, ChannelSession, Payload, SessionOptions, Terminator};
use contend_types::{Protocol, SimulationConfig, StationId};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, trace, warn, Instrument};

/// Drives one station from connect to output file.
pub struct StationWorker {
    id: StationId,
    config: Arc<SimulationConfig>,
    policy: Box<dyn ContentionPolicy>,
    rng: RandomSource,
    output_dir: PathBuf,
    cancel: CancellationToken,
}

impl StationWorker {
    /// Create a worker for station `id` using `protocol`.
    pub fn new(
        id: StationId,
        protocol: Protocol,
        config: Arc<SimulationConfig>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        let policy = policy_for(protocol, &config);
        let rng = RandomSource::for_station(id, config.seed);
        Self {
            id,
            config,
            policy,
            rng,
            output_dir: output_dir.into(),
            cancel: CancellationToken::new(),
        }
    }

    /// Stop the station early when `token` is cancelled.
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    pub fn id(&self) -> StationId {
        self.id
    }

    /// Run to completion. Never fails; the outcome is in the report.
    pub async fn run(self) -> StationReport {
        let span = info_span!("station", id = self.id.index(), policy = self.policy.name());
        self.run_inner().instrument(span).await
    }

    async fn run_inner(mut self) -> StationReport {
        let start = Instant::now();
        let options = SessionOptions::from_config(&self.config);

        let connected = tokio::select! {
            _ = self.cancel.cancelled() => {
                return StationReport::empty(self.id, Termination::Cancelled, start.elapsed());
            }
            result = ChannelSession::connect(
                &self.config.server_address,
                self.config.server_port,
                options,
            ) => result,
        };

        let mut session = match connected {
            Ok(session) => session,
            Err(e) => {
                warn!(error = %e, "Failed to connect to arbiter");
                return StationReport::empty(
                    self.id,
                    Termination::ConnectFailed(e.to_string()),
                    start.elapsed(),
                );
            }
        };
        info!(peer = %session.peer(), seed = self.rng.seed(), "Connected");

        let mut state = StationState::new(self.config.max_backoff_exponent);
        let termination = self.consume(&mut session, &mut state).await;

        if let Err(e) = session.close().await {
            debug!(error = %e, "Error closing session");
        }

        let output = match output::write_frequencies(&self.output_dir, self.id, state.frequencies())
            .await
        {
            Ok(path) => Some(path),
            Err(e) => {
                warn!(error = %e, "Failed to write output");
                None
            }
        };

        let elapsed = start.elapsed();
        info!(
            %termination,
            words = state.words_received,
            distinct = state.distinct_words(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Station finished"
        );

        StationReport {
            station: self.id,
            termination,
            elapsed,
            words_received: state.words_received,
            distinct_words: state.distinct_words(),
            offset: state.offset,
            stats: state.stats,
            output,
        }
    }

    /// Request, count and repeat until the stream ends or something fails.
    async fn consume(
        &mut self,
        session: &mut ChannelSession,
        state: &mut StationState,
    ) -> Termination {
        loop {
            let lines = match self.acquire(session, state).await {
                Ok(Some(lines)) => lines,
                Ok(None) => {
                    warn!(
                        attempts = self.config.max_attempts,
                        offset = state.offset,
                        "Giving up after repeated failed attempts"
                    );
                    return Termination::RetryExhausted {
                        attempts: self.config.max_attempts,
                    };
                }
                Err(StationError::Cancelled) => {
                    info!(offset = state.offset, "Cancelled");
                    return Termination::Cancelled;
                }
                Err(StationError::Channel(ChannelError::EndOfStream)) => {
                    info!(offset = state.offset, "Arbiter closed connection");
                    return Termination::PeerClosed;
                }
                Err(e) => {
                    warn!(error = %e, "Transport error");
                    return Termination::Transport(e.to_string());
                }
            };

            let payload = Payload::parse(&lines);
            for word in &payload.words {
                trace!(word = %word, "Received word");
            }
            state.consume(&payload);

            match payload.terminator {
                Some(Terminator::StreamEnd) => return Termination::StreamEnd,
                Some(Terminator::EndOfFile) => return Termination::EndOfFile,
                None => {}
            }
        }
    }

    /// One request round: up to `max_attempts` attempts with a pause after each
    /// failure. `Ok(None)` means every attempt failed.
    async fn acquire(
        &mut self,
        session: &mut ChannelSession,
        state: &mut StationState,
    ) -> Result<Option<Vec<String>>, StationError> {
        let retry_delay = self.config.retry_delay();

        for attempt in 1..=self.config.max_attempts {
            let mut ctx = AttemptContext {
                session: &mut *session,
                rng: &mut self.rng,
                backoff: &mut state.backoff,
                offset: state.offset,
            };

            let outcome = tokio::select! {
                _ = self.cancel.cancelled() => return Err(StationError::Cancelled),
                result = self.policy.attempt(&mut ctx) => result?,
            };
            state.stats.record(&outcome);

            match outcome {
                AttemptOutcome::Granted(lines) => return Ok(Some(lines)),
                AttemptOutcome::Rejected => {
                    debug!(attempt, backoff = state.backoff.value(), "Rejected");
                }
                AttemptOutcome::Deferred => {
                    trace!(attempt, "Deferred");
                }
            }

            tokio::select! {
                _ = self.cancel.cancelled() => return Err(StationError::Cancelled),
                _ = tokio::time::sleep(retry_delay) => {}
            }
        }

        Ok(None)
    }
}
