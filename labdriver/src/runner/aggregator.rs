use async_channel::Receiver;
use labdriver_core::{LatencyStats, RunData, RunOutcome, Sample, PROGRESS_INTERVAL};
use std::time::Duration;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// Sole owner of the run's counters and latency observations.
///
/// Workers only ever reach it through the sample queue, so nothing in the request path takes a
/// lock.
pub(crate) struct Aggregator {
    data: RunData,
    latencies: Vec<Duration>,
}

impl Aggregator {
    pub fn new(scenario: &str) -> Self {
        Self {
            data: RunData::new(scenario),
            latencies: vec![],
        }
    }

    pub fn record(&mut self, sample: Sample) {
        trace!("Sample: {sample:?}");
        self.data.record(&sample);
        self.latencies.push(sample.latency);
    }

    /// Consume samples until every sender has been dropped.
    pub async fn run(mut self, samples: Receiver<Sample>) -> Self {
        let mut progress = interval_at(Instant::now() + PROGRESS_INTERVAL, PROGRESS_INTERVAL);
        progress.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                sample = samples.recv() => match sample {
                    Ok(sample) => self.record(sample),
                    Err(_) => break,
                },
                _ = progress.tick() => {
                    info!(
                        "{} requests so far ({} failed)",
                        self.data.requests, self.data.failures
                    );
                }
            }
        }

        debug!("Sample queue closed after {} samples", self.data.requests);
        self
    }

    pub fn finish(self, elapsed: Duration, outcome: RunOutcome) -> RunData {
        let Self {
            mut data,
            latencies,
        } = self;
        data.elapsed = elapsed;
        data.outcome = outcome;
        data.latencies = LatencyStats::from_latencies(latencies);
        data
    }
}
