//! Spawns and joins the station fleet.

use crate::SimulationReport;
use contend_station::{StationReport, StationWorker};
use contend_types::{ConfigError, Protocol, SimulationConfig, StationId};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{self, JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Runs `num_stations` stations against one arbiter.
pub struct SimulationRunner {
    config: Arc<SimulationConfig>,
    protocol: Protocol,
    output_dir: PathBuf,
    time_budget: Option<Duration>,
}

impl SimulationRunner {
    /// Validate `config` and prepare a run. Output goes to the current directory.
    pub fn new(config: SimulationConfig, protocol: Protocol) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config: Arc::new(config),
            protocol,
            output_dir: PathBuf::from("."),
            time_budget: None,
        })
    }

    /// Directory for `output_client_<id>.txt` files.
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Cancel every station still running after `budget`.
    pub fn with_time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Run every station to completion and aggregate their reports.
    pub async fn run(self) -> SimulationReport {
        let num_stations = self.config.num_stations;
        info!(
            protocol = %self.protocol,
            num_stations,
            server = %self.config.server_address,
            port = self.config.server_port,
            slot_ms = self.config.slot_duration_ms,
            "Starting simulation"
        );

        let start = Instant::now();
        let cancel = CancellationToken::new();

        let mut tasks = JoinSet::new();
        let mut spawned = HashMap::with_capacity(num_stations as usize);
        for id in StationId::range(num_stations) {
            let worker = StationWorker::new(
                id,
                self.protocol,
                Arc::clone(&self.config),
                self.output_dir.clone(),
            )
            .with_cancellation(cancel.child_token());
            let handle = tasks.spawn(worker.run());
            spawned.insert(handle.id(), id);
        }

        let budget_timer = self.time_budget.map(|budget| {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(budget).await;
                warn!(?budget, "Time budget expired, cancelling stations");
                cancel.cancel();
            })
        });

        let reports = collect_reports(tasks, spawned, start).await;

        if let Some(timer) = budget_timer {
            timer.abort();
        }

        let report = SimulationReport::new(self.protocol, start.elapsed(), reports);
        info!(
            completed = report.completed(),
            failed = report.failed(),
            total_ms = report.total_elapsed.as_millis() as u64,
            mean_ms = report.mean_elapsed().as_millis() as u64,
            "Simulation finished"
        );
        report
    }
}

/// Join every station task. A task that panicked or was aborted leaves no
/// report of its own and is reported as `Aborted` under the id it was
/// spawned with.
async fn collect_reports(
    mut tasks: JoinSet<StationReport>,
    mut spawned: HashMap<task::Id, StationId>,
    start: Instant,
) -> Vec<StationReport> {
    let mut reports = Vec::with_capacity(spawned.len());

    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(report) => reports.push(report),
            Err(e) => {
                let Some(station) = spawned.remove(&e.id()) else {
                    warn!(error = %e, "Unknown task failed");
                    continue;
                };
                let reason = failure_reason(e);
                warn!(%station, reason = %reason, "Station task failed");
                reports.push(StationReport::aborted(station, reason, start.elapsed()));
            }
        }
    }

    reports
}

fn failure_reason(err: JoinError) -> String {
    if !err.is_panic() {
        return err.to_string();
    }
    let payload = err.into_panic();
    if let Some(msg) = payload.downcast_ref::<&str>() {
        format!("panicked: {msg}")
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        format!("panicked: {msg}")
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contend_station::Termination;

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = SimulationConfig::new(0, "127.0.0.1", 9000);
        let err = SimulationRunner::new(config, Protocol::Beb).err();
        assert!(matches!(
            err,
            Some(ConfigError::Invalid {
                field: "num_clients",
                ..
            })
        ));
    }

    #[test]
    fn test_builder() {
        let config = SimulationConfig::new(3, "127.0.0.1", 9000);
        let runner = SimulationRunner::new(config, Protocol::SensingBeb)
            .unwrap()
            .with_output_dir("/tmp/out")
            .with_time_budget(Duration::from_secs(5));

        assert_eq!(runner.config().num_stations, 3);
        assert_eq!(runner.output_dir, PathBuf::from("/tmp/out"));
        assert_eq!(runner.time_budget, Some(Duration::from_secs(5)));
    }

    async fn failing_station(delay: Duration, msg: &'static str) -> StationReport {
        tokio::time::sleep(delay).await;
        panic!("{msg}")
    }

    #[tokio::test]
    async fn test_panicked_tasks_keep_their_own_station_id() {
        let mut tasks = JoinSet::new();
        let mut spawned = HashMap::new();

        // Station 0 panics after station 1, so completion order differs from id order
        let handle = tasks.spawn(failing_station(Duration::from_millis(50), "station zero failed"));
        spawned.insert(handle.id(), StationId(0));

        let handle = tasks.spawn(failing_station(Duration::ZERO, "station one failed"));
        spawned.insert(handle.id(), StationId(1));

        let handle = tasks.spawn(async {
            StationReport::empty(StationId(2), Termination::StreamEnd, Duration::ZERO)
        });
        spawned.insert(handle.id(), StationId(2));

        let mut reports = collect_reports(tasks, spawned, Instant::now()).await;
        reports.sort_by_key(|r| r.station);

        assert_eq!(reports.len(), 3);
        assert_eq!(
            reports[0].termination,
            Termination::Aborted("panicked: station zero failed".into())
        );
        assert_eq!(
            reports[1].termination,
            Termination::Aborted("panicked: station one failed".into())
        );
        assert_eq!(reports[2].termination, Termination::StreamEnd);
    }
}
