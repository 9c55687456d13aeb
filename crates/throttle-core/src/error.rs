//! Error types shared across the throttle crates.

use thiserror::Error;

/// Reasons a metric reading could not be produced, or a check rejected it.
///
/// These travel in-band inside `MetricResult` and `CheckResult` rather
/// than through `Result`, so the caller always gets value and threshold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MetricError {
    #[error("no app indicated")]
    MissingAppName,

    #[error("app denied")]
    AppDenied,

    #[error("no such metric")]
    NoSuchMetric,

    #[error("threshold exceeded")]
    ThresholdExceeded,

    #[error("{0}")]
    Internal(String),
}

/// Errors that can occur while loading `throttle.toml`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
