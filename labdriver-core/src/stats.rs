use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSecondsWithFrac};
use std::time::Duration;

/// Latency summary of a finished run.
///
/// Percentiles use the nearest-rank method over the full, sorted set of observations; no
/// interpolation and no sketching. An empty run reports zero for every field.
#[serde_as]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LatencyStats {
    pub count: usize,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub min: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub max: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub mean: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub p50: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub p95: Duration,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub p99: Duration,
}

impl LatencyStats {
    /// Consumes the observations of a run; they are sorted in place and dropped afterwards.
    pub fn from_latencies(mut latencies: Vec<Duration>) -> Self {
        if latencies.is_empty() {
            return Self::default();
        }

        latencies.sort_unstable();

        let count = latencies.len();
        let total: Duration = latencies.iter().sum();
        // NOTE: u32 division is plenty: a run never approaches 4 billion samples.
        let mean = total / u32::try_from(count).unwrap_or(u32::MAX);

        Self {
            count,
            min: latencies[0],
            max: latencies[count - 1],
            mean,
            p50: percentile(&latencies, 50.),
            p95: percentile(&latencies, 95.),
            p99: percentile(&latencies, 99.),
        }
    }

    pub fn p50_ms(&self) -> f64 {
        as_ms(self.p50)
    }

    pub fn p95_ms(&self) -> f64 {
        as_ms(self.p95)
    }

    pub fn p99_ms(&self) -> f64 {
        as_ms(self.p99)
    }
}

/// Nearest-rank percentile of an ascending slice. `p` is in `[0, 100]`.
pub fn percentile(sorted: &[Duration], p: f64) -> Duration {
    if sorted.is_empty() {
        return Duration::ZERO;
    }

    let n = sorted.len();
    let rank = (p * n as f64 / 100.).ceil() as i64 - 1;
    let index = rank.clamp(0, n as i64 - 1) as usize;
    sorted[index]
}

fn as_ms(dur: Duration) -> f64 {
    dur.as_nanos() as f64 / 1e6
}
