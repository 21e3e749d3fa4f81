use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Scenario name must not be empty")]
    EmptyName,

    #[error("Scenario name `{0}` may only use ASCII letters, digits, `.`, `_` and `-`, and must not be `.` or `..`")]
    InvalidName(String),

    #[error("Invalid target URL `{url}`: {reason}")]
    InvalidTarget { url: String, reason: String },

    #[error("Invalid HTTP method `{0}`")]
    InvalidMethod(String),

    #[error("Duration must be greater than zero")]
    ZeroDuration,

    #[error("Concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("Threshold `{name}` must be a finite, non-negative number (got {value})")]
    InvalidThreshold { name: &'static str, value: f64 },
}
