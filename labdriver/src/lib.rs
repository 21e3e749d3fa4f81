//! Failure-pattern load harness.
//!
//! A [`Runner`] drives HTTP load against one target at a paced rate and bounded concurrency,
//! and [`score`] grades the resulting [`RunData`] against a [`Scenario`]'s thresholds.
//!
//! ```no_run
//! use labdriver::{prelude::*, ScenarioRegistry};
//!
//! # async fn demo() -> Result<(), labdriver::DriverError> {
//! let registry = ScenarioRegistry::builtin();
//! let scenario = registry.get("timeouts")?;
//!
//! let mut runner = Runner::new(scenario.run_config())?;
//! let mut data = runner.run(CancellationToken::new()).await;
//!
//! let (points, line) = score(&data, scenario);
//! data.set_score(points, line);
//! # Ok(())
//! # }
//! ```
pub mod cli;
pub mod registry;
pub mod report;
pub mod runner;
pub mod scorer;

mod error;

pub use error::DriverError;
pub use registry::ScenarioRegistry;
pub use report::{JsonReportSink, ReportError, ReportSink};
pub use runner::{RunState, Runner};
pub use scorer::score;

pub mod prelude {
    pub use crate::runner::{RunState, Runner};
    pub use crate::scorer::score;
    pub use labdriver_core::{LatencyStats, RunConfig, RunData, RunOutcome, Scenario};
    pub use tokio_util::sync::CancellationToken;
}

pub use labdriver_core::{LatencyStats, RunConfig, RunData, RunOutcome, Scenario};
