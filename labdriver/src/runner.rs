//! Rate-paced, bounded-concurrency load runner
mod aggregator;
mod worker;

use crate::DriverError;
use aggregator::Aggregator;
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use labdriver_core::{ConfigError, RunConfig, RunData, RunOutcome, SAMPLE_QUEUE_SIZE};
use reqwest::{Client, Method, Url};
use std::num::NonZeroU32;
use std::sync::Arc;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};
use worker::{Target, Worker};

/// Lifecycle of a [`Runner`]: `Idle -> Running -> {Completed, Cancelled}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Idle,
    Running,
    Completed,
    Cancelled,
}

/// Issues requests against one target at `rps` with at most `concurrency` in flight, for
/// `duration`.
///
/// Issuance is paced by a GCRA limiter (burst of one), shared by a fixed pool of
/// `concurrency` worker tasks. Each worker waits for the limiter, performs one request start to
/// finish, and reports a [`labdriver_core::Sample`] to a single aggregator task. When every
/// worker is busy the next issuance waits for one to free up; nothing is dropped, so the target
/// RPS is a ceiling rather than a guarantee.
///
/// # Example
/// ```no_run
/// use labdriver::prelude::*;
/// use std::time::Duration;
///
/// # async fn demo() -> Result<(), labdriver::DriverError> {
/// let config = RunConfig::new("smoke", "http://localhost:8080/health", 10, Duration::from_secs(5))
///     .concurrency(4);
///
/// let mut runner = Runner::new(config)?;
/// let data = runner.run(CancellationToken::new()).await;
/// assert_eq!(data.requests, data.successes + data.failures);
/// # Ok(())
/// # }
/// ```
pub struct Runner {
    config: RunConfig,
    client: Client,
    target: Arc<Target>,
    state: RunState,
}

impl Runner {
    pub fn new(config: RunConfig) -> Result<Self, DriverError> {
        config.validate()?;

        let method = Method::from_bytes(config.method.as_bytes())
            .map_err(|_| DriverError::InvalidMethod(config.method.clone()))?;
        let url = Url::parse(&config.target_url).map_err(|err| ConfigError::InvalidTarget {
            url: config.target_url.clone(),
            reason: err.to_string(),
        })?;
        let client = Client::builder().timeout(config.request_timeout).build()?;

        let target = Arc::new(Target {
            name: config.name.clone(),
            method,
            url,
            body: config.body.clone(),
        });

        Ok(Self {
            config,
            client,
            target,
            state: RunState::Idle,
        })
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Run the load until `duration` elapses or `token` fires.
    ///
    /// Either way no new request is issued afterwards; in-flight requests get up to the grace
    /// period to finish and are abandoned (uncounted) after that. Always returns a valid
    /// [`RunData`], partial when cancelled.
    #[instrument(name = "run", skip_all, fields(name = %self.config.name))]
    pub async fn run(&mut self, token: CancellationToken) -> RunData {
        if self.state != RunState::Idle {
            warn!(
                "Runner already finished ({:?}); returning empty run data",
                self.state
            );
            return RunData::new(&self.config.name);
        }

        info!("Running {} with config {:?}", self.config.name, &self.config);
        self.state = RunState::Running;

        let start = Instant::now();
        let deadline = start + self.config.duration;
        let stop = token.child_token();

        let (tx, rx) = async_channel::bounded(SAMPLE_QUEUE_SIZE);
        let aggregator =
            tokio::spawn(Aggregator::new(&self.config.name).run(rx).in_current_span());

        let mut workers = JoinSet::new();
        match NonZeroU32::new(self.config.rps) {
            Some(rps) => {
                let limiter = Arc::new(rate_limiter(rps));
                for id in 0..self.config.concurrency {
                    let worker = Worker {
                        id,
                        client: self.client.clone(),
                        target: self.target.clone(),
                        limiter: limiter.clone(),
                        samples: tx.clone(),
                        stop: stop.clone(),
                    };
                    workers.spawn(worker.run().in_current_span());
                }
            }
            None => warn!("RPS is zero; no requests will be issued"),
        }
        drop(tx);

        let outcome = tokio::select! {
            biased;
            _ = token.cancelled() => RunOutcome::Cancelled,
            _ = tokio::time::sleep_until(deadline) => RunOutcome::Completed,
        };
        stop.cancel();
        debug!("Issuance stopped ({outcome:?})");

        self.drain(&mut workers).await;
        let elapsed = start.elapsed();

        let aggregator = match aggregator.await {
            Ok(aggregator) => aggregator,
            Err(err) => {
                error!("Aggregator task failed: {err}");
                Aggregator::new(&self.config.name)
            }
        };
        let data = aggregator.finish(elapsed, outcome);

        self.state = match outcome {
            RunOutcome::Completed => RunState::Completed,
            RunOutcome::Cancelled => RunState::Cancelled,
        };
        info!("Run finished: {data}");

        data
    }

    /// Wait for in-flight requests, aborting whatever outlives the grace period.
    async fn drain(&self, workers: &mut JoinSet<()>) {
        let grace = self.config.grace_period;
        let drained = tokio::time::timeout(grace, async {
            while let Some(res) = workers.join_next().await {
                if let Err(err) = res {
                    error!("Worker task failed: {err}");
                }
            }
        })
        .await;

        if drained.is_err() {
            warn!(
                "Grace period of {} expired with {} request(s) in flight; abandoning them",
                humantime::format_duration(grace),
                workers.len()
            );
            workers.shutdown().await;
        }
    }
}

fn rate_limiter(rps: NonZeroU32) -> DefaultDirectRateLimiter {
    RateLimiter::direct(Quota::per_second(rps).allow_burst(NonZeroU32::MIN))
}
