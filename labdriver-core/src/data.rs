use crate::LatencyStats;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationMilliSecondsWithFrac};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;
use time::OffsetDateTime;

/// Outcome of a single completed request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub latency: Duration,
    pub outcome: SampleOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// A full response was read with this status code.
    Status(u16),
    /// Connect error, timeout or a broken response body.
    Transport,
}

impl Sample {
    pub fn is_success(&self) -> bool {
        matches!(self.outcome, SampleOutcome::Status(code) if (200..300).contains(&code))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// The configured duration elapsed.
    Completed,
    /// The cancellation token fired first; the data is partial.
    Cancelled,
}

/// Aggregate result of one run.
///
/// Counters only change through [`RunData::record`], which keeps
/// `requests == successes + failures`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunData {
    pub scenario: String,
    #[serde(with = "time::serde::rfc3339")]
    pub started_at: OffsetDateTime,
    #[serde_as(as = "DurationMilliSecondsWithFrac<f64>")]
    pub elapsed: Duration,
    pub outcome: RunOutcome,
    pub requests: u64,
    pub successes: u64,
    pub failures: u64,
    pub transport_errors: u64,
    pub status_counts: BTreeMap<u16, u64>,
    pub latencies: LatencyStats,
    pub score: Option<u8>,
    pub score_line: Option<String>,
}

impl RunData {
    pub fn new(scenario: &str) -> Self {
        Self {
            scenario: scenario.to_string(),
            started_at: OffsetDateTime::now_utc(),
            elapsed: Duration::ZERO,
            outcome: RunOutcome::Completed,
            requests: 0,
            successes: 0,
            failures: 0,
            transport_errors: 0,
            status_counts: BTreeMap::new(),
            latencies: LatencyStats::default(),
            score: None,
            score_line: None,
        }
    }

    pub fn record(&mut self, sample: &Sample) {
        self.requests += 1;
        if sample.is_success() {
            self.successes += 1;
        } else {
            self.failures += 1;
        }

        match sample.outcome {
            SampleOutcome::Status(code) => *self.status_counts.entry(code).or_default() += 1,
            SampleOutcome::Transport => self.transport_errors += 1,
        }
    }

    /// Fraction of failed requests; zero for a run without requests.
    pub fn error_rate(&self) -> f64 {
        if self.requests > 0 {
            self.failures as f64 / self.requests as f64
        } else {
            0.
        }
    }

    /// Completed requests per second of wall-clock run time.
    pub fn actual_rps(&self) -> f64 {
        if self.elapsed.is_zero() {
            0.
        } else {
            self.requests as f64 / self.elapsed.as_secs_f64()
        }
    }

    pub fn set_score(&mut self, score: u8, line: String) {
        self.score = Some(score);
        self.score_line = Some(line);
    }
}

impl fmt::Display for RunData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // NOTE: humantime prints nanoseconds unless the duration is rounded first.
        let elapsed = Duration::from_millis(self.elapsed.as_millis() as u64);
        write!(
            f,
            "{} ({:?}) in {}: requests={}, failures={}, RPS={:.2}, p50={:?}, p95={:?}, p99={:?}",
            self.scenario,
            self.outcome,
            humantime::format_duration(elapsed),
            self.requests,
            self.failures,
            self.actual_rps(),
            self.latencies.p50,
            self.latencies.p95,
            self.latencies.p99,
        )
    }
}
