//! Aggregated run results.

use contend_station::StationReport;
use contend_types::Protocol;
use hdrhistogram::Histogram;
use std::time::Duration;

/// Report generated after a simulation run.
pub struct SimulationReport {
    pub protocol: Protocol,

    /// Wall-clock span from first spawn to last join.
    pub total_elapsed: Duration,

    /// One report per station, ordered by station id.
    pub stations: Vec<StationReport>,

    /// Per-station elapsed times in microseconds.
    histogram: Histogram<u64>,
}

impl SimulationReport {
    pub fn new(
        protocol: Protocol,
        total_elapsed: Duration,
        mut stations: Vec<StationReport>,
    ) -> Self {
        stations.sort_by_key(|r| r.station);

        let mut histogram =
            Histogram::<u64>::new(3).expect("histogram creation should succeed");
        for report in &stations {
            let _ = histogram.record(report.elapsed.as_micros() as u64);
        }

        Self {
            protocol,
            total_elapsed,
            stations,
            histogram,
        }
    }

    /// Arithmetic mean of per-station elapsed times.
    pub fn mean_elapsed(&self) -> Duration {
        if self.stations.is_empty() {
            return Duration::ZERO;
        }
        let total: Duration = self.stations.iter().map(|r| r.elapsed).sum();
        total / self.stations.len() as u32
    }

    pub fn p50_elapsed(&self) -> Duration {
        Duration::from_micros(self.histogram.value_at_quantile(0.50))
    }

    pub fn p99_elapsed(&self) -> Duration {
        Duration::from_micros(self.histogram.value_at_quantile(0.99))
    }

    pub fn max_elapsed(&self) -> Duration {
        Duration::from_micros(self.histogram.max())
    }

    /// Stations that consumed their stream to the end.
    pub fn completed(&self) -> usize {
        self.stations
            .iter()
            .filter(|r| r.termination.is_success())
            .count()
    }

    /// Stations that stopped for any other reason.
    pub fn failed(&self) -> usize {
        self.stations.len() - self.completed()
    }

    /// Words received across all stations.
    pub fn words_received(&self) -> u64 {
        self.stations.iter().map(|r| r.words_received).sum()
    }

    /// Rejected attempts across all stations.
    pub fn rejections(&self) -> u64 {
        self.stations.iter().map(|r| r.stats.rejected).sum()
    }

    /// Print the report to stdout.
    pub fn print(&self) {
        println!("\n=== Simulation Report ({}) ===", self.protocol);
        println!("Stations:   {}", self.stations.len());
        println!("Completed:  {}", self.completed());
        println!("Failed:     {}", self.failed());
        println!("Words:      {}", self.words_received());
        println!("Rejections: {}", self.rejections());
        println!();
        println!("Total time: {:?}", self.total_elapsed);
        println!("Mean time:  {:?}", self.mean_elapsed());

        if !self.histogram.is_empty() {
            println!("  P50:  {:?}", self.p50_elapsed());
            println!("  P99:  {:?}", self.p99_elapsed());
            println!("  Max:  {:?}", self.max_elapsed());
        }

        for report in self.stations.iter().filter(|r| !r.termination.is_success()) {
            println!("  {}: {}", report.station, report.termination);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contend_station::Termination;
    use contend_types::StationId;

    fn station(id: u32, millis: u64, termination: Termination) -> StationReport {
        let mut report =
            StationReport::empty(StationId(id), termination, Duration::from_millis(millis));
        report.words_received = u64::from(id) + 1;
        report
    }

    #[test]
    fn test_mean_is_arithmetic() {
        let report = SimulationReport::new(
            Protocol::Beb,
            Duration::from_millis(400),
            vec![
                station(0, 100, Termination::StreamEnd),
                station(1, 200, Termination::StreamEnd),
                station(2, 600, Termination::EndOfFile),
            ],
        );
        assert_eq!(report.mean_elapsed(), Duration::from_millis(300));
        assert_eq!(report.completed(), 3);
        assert_eq!(report.failed(), 0);
        assert_eq!(report.words_received(), 6);
    }

    #[test]
    fn test_stations_sorted_and_failures_counted() {
        let report = SimulationReport::new(
            Protocol::SlottedAloha,
            Duration::from_millis(10),
            vec![
                station(2, 5, Termination::PeerClosed),
                station(0, 5, Termination::StreamEnd),
                station(1, 5, Termination::ConnectFailed("refused".into())),
            ],
        );
        let ids: Vec<_> = report.stations.iter().map(|r| r.station).collect();
        assert_eq!(ids, vec![StationId(0), StationId(1), StationId(2)]);
        assert_eq!(report.completed(), 1);
        assert_eq!(report.failed(), 2);
    }

    #[test]
    fn test_percentiles_track_station_times() {
        let stations = (0..100)
            .map(|i| station(i, u64::from(i) + 1, Termination::StreamEnd))
            .collect();
        let report = SimulationReport::new(Protocol::Beb, Duration::from_millis(100), stations);

        // Histogram keeps three significant figures
        let p50 = report.p50_elapsed().as_micros() as f64;
        assert!((p50 - 50_000.0).abs() / 50_000.0 < 0.01, "p50 {p50}");
        let max = report.max_elapsed().as_micros() as f64;
        assert!((max - 100_000.0).abs() / 100_000.0 < 0.01, "max {max}");
    }

    #[test]
    fn test_empty_report() {
        let report = SimulationReport::new(Protocol::SensingBeb, Duration::ZERO, vec![]);
        assert_eq!(report.mean_elapsed(), Duration::ZERO);
        assert_eq!(report.completed(), 0);
        assert_eq!(report.failed(), 0);
    }
}
