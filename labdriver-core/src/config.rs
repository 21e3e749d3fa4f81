use crate::{ConfigError, DEFAULT_GRACE_PERIOD, DEFAULT_REQUEST_TIMEOUT};
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSeconds};
use std::time::Duration;
use url::Url;

/// A named load profile together with its pass/fail thresholds.
///
/// Scenarios are plain configuration. They are built once at startup (see the registry in the
/// `labdriver` crate) and only read afterwards.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub description: String,
    pub target_url: String,
    pub method: String,
    #[serde(default)]
    pub body: Option<String>,
    pub rps: u32,
    #[serde_as(as = "DurationSeconds<u64>")]
    pub duration: Duration,
    pub concurrency: usize,
    pub max_p95_ms: f64,
    pub max_err_rate: f64,

    /// Observation endpoints. Printed for the operator, never requested by the runner.
    #[serde(default)]
    pub db_stats_url: Option<String>,
    #[serde(default)]
    pub hpa_stats_url: Option<String>,
    #[serde(default)]
    pub batch_url: Option<String>,
}

impl Scenario {
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_name(&self.name)?;
        validate_load(
            &self.target_url,
            &self.method,
            self.duration,
            self.concurrency,
        )?;
        validate_threshold("max_p95_ms", self.max_p95_ms)?;
        validate_threshold("max_err_rate", self.max_err_rate)?;
        Ok(())
    }

    /// The subset of this scenario the runner needs, with default timeouts.
    pub fn run_config(&self) -> RunConfig {
        RunConfig {
            name: self.name.clone(),
            target_url: self.target_url.clone(),
            method: self.method.clone(),
            body: self.body.clone(),
            rps: self.rps,
            duration: self.duration,
            concurrency: self.concurrency,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    /// Observation endpoints that are set, labelled for display.
    pub fn observation_urls(&self) -> Vec<(&'static str, &str)> {
        [
            ("db stats", &self.db_stats_url),
            ("hpa stats", &self.hpa_stats_url),
            ("batches", &self.batch_url),
        ]
        .into_iter()
        .filter_map(|(label, url)| url.as_deref().map(|url| (label, url)))
        .collect()
    }
}

/// Everything a single `Runner` needs for one run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunConfig {
    /// Used for log spans and metric labels.
    pub name: String,
    pub target_url: String,
    pub method: String,
    pub body: Option<String>,
    pub rps: u32,
    pub duration: Duration,
    pub concurrency: usize,
    pub request_timeout: Duration,
    pub grace_period: Duration,
}

impl RunConfig {
    pub fn new(name: &str, target_url: &str, rps: u32, duration: Duration) -> Self {
        Self {
            name: name.to_string(),
            target_url: target_url.to_string(),
            method: "GET".to_string(),
            body: None,
            rps,
            duration,
            concurrency: 1,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    pub fn method(mut self, method: &str) -> Self {
        self.method = method.to_string();
        self
    }

    pub fn body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_name(&self.name)?;
        validate_load(
            &self.target_url,
            &self.method,
            self.duration,
            self.concurrency,
        )
    }
}

// Names end up as report file names, so they must be a single plain path component.
fn validate_name(name: &str) -> Result<(), ConfigError> {
    if name.is_empty() {
        return Err(ConfigError::EmptyName);
    }
    let plain = name
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'));
    if !plain || name == "." || name == ".." {
        return Err(ConfigError::InvalidName(name.to_string()));
    }
    Ok(())
}

fn validate_load(
    target_url: &str,
    method: &str,
    duration: Duration,
    concurrency: usize,
) -> Result<(), ConfigError> {
    let url = Url::parse(target_url).map_err(|err| ConfigError::InvalidTarget {
        url: target_url.to_string(),
        reason: err.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidTarget {
            url: target_url.to_string(),
            reason: format!("unsupported scheme `{}`", url.scheme()),
        });
    }

    if !is_http_token(method) {
        return Err(ConfigError::InvalidMethod(method.to_string()));
    }

    if duration.is_zero() {
        return Err(ConfigError::ZeroDuration);
    }

    if concurrency == 0 {
        return Err(ConfigError::ZeroConcurrency);
    }

    Ok(())
}

fn validate_threshold(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0. {
        Ok(())
    } else {
        Err(ConfigError::InvalidThreshold { name, value })
    }
}

// RFC 9110 `token`
fn is_http_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}
