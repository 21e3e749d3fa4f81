use async_channel::Sender;
use governor::DefaultDirectRateLimiter;
use labdriver_core::{Sample, SampleOutcome};
use reqwest::{Client, Method, Url};
use std::sync::Arc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
#[allow(unused)]
use tracing::{debug, error, info, trace, warn};

/// The single request every worker of a run repeats.
#[derive(Debug)]
pub(crate) struct Target {
    pub name: String,
    pub method: Method,
    pub url: Url,
    pub body: Option<String>,
}

pub(crate) struct Worker {
    pub id: usize,
    pub client: Client,
    pub target: Arc<Target>,
    pub limiter: Arc<DefaultDirectRateLimiter>,
    pub samples: Sender<Sample>,
    pub stop: CancellationToken,
}

impl Worker {
    pub async fn run(self) {
        trace!("Worker {} started", self.id);
        loop {
            // NOTE: A busy worker never waits on the limiter, so when every worker is busy the
            // next issuance queues until one frees up.
            tokio::select! {
                biased;
                _ = self.stop.cancelled() => break,
                _ = self.limiter.until_ready() => {}
            }

            // The limiter can release a cell in the same instant the run stops.
            if self.stop.is_cancelled() {
                break;
            }

            let sample = issue(&self.client, &self.target).await;
            record_metrics(&self.target.name, &sample);

            if self.samples.send(sample).await.is_err() {
                warn!("Sample queue closed; stopping worker {}", self.id);
                break;
            }
        }
        trace!("Worker {} stopped", self.id);
    }
}

/// Perform one request start to finish and classify it.
pub(crate) async fn issue(client: &Client, target: &Target) -> Sample {
    let mut request = client.request(target.method.clone(), target.url.clone());
    if let Some(body) = &target.body {
        request = request.body(body.clone());
    }

    let start = Instant::now();
    let outcome = match request.send().await {
        Ok(response) => {
            let status = response.status();
            // Drain the body so a broken response counts against the request.
            match response.bytes().await {
                Ok(_) => SampleOutcome::Status(status.as_u16()),
                Err(err) => {
                    debug!("Failed reading response body: {err}");
                    SampleOutcome::Transport
                }
            }
        }
        Err(err) => {
            debug!("Request failed: {err}");
            SampleOutcome::Transport
        }
    };

    Sample {
        latency: start.elapsed(),
        outcome,
    }
}

#[cfg(feature = "metrics")]
fn record_metrics(scenario: &str, sample: &Sample) {
    let scenario = scenario.to_string();
    metrics::histogram!("labdriver_request_latency", "scenario" => scenario.clone())
        .record(sample.latency.as_secs_f64());
    if sample.is_success() {
        metrics::counter!("labdriver_requests_success", "scenario" => scenario).increment(1);
    } else {
        metrics::counter!("labdriver_requests_error", "scenario" => scenario).increment(1);
    }
}

#[cfg(not(feature = "metrics"))]
fn record_metrics(_scenario: &str, _sample: &Sample) {}
