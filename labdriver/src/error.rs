use crate::report::ReportError;
use labdriver_core::ConfigError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid HTTP method `{0}`")]
    InvalidMethod(String),

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Unknown scenario: {name}\nAvailable: {}", available.join(", "))]
    UnknownScenario {
        name: String,
        available: Vec<String>,
    },

    #[error("Usage: driver run <scenario>\nAvailable: {}", available.join(", "))]
    MissingScenario { available: Vec<String> },

    #[error("Duplicate scenario `{0}`")]
    DuplicateScenario(String),

    #[error("Failed to load scenarios from {}: {reason}", path.display())]
    ScenarioFile { path: PathBuf, reason: String },

    #[error("Failed to generate report: {0}")]
    Report(#[from] ReportError),

    #[error("Failed to write output: {0}")]
    Output(#[from] std::io::Error),
}
