use std::time::Duration;

/// Per-request timeout used when a [`crate::RunConfig`] does not set one.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// How long in-flight requests may keep running once issuance has stopped.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(5);

/// Capacity of the queue between workers and the aggregator.
pub const SAMPLE_QUEUE_SIZE: usize = 1024;

/// Interval between progress log lines emitted during a run.
pub const PROGRESS_INTERVAL: Duration = Duration::from_secs(5);

/// Score of a run with no penalties applied.
pub const MAX_SCORE: u8 = 100;
