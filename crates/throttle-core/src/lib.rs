//! throttle-core — shared types for the throttle admission-control service.
//!
//! Holds the metric and check result types passed between the evaluator
//! and its collaborators, the in-memory metric store that the collection
//! loop writes into, and the `throttle.toml` configuration.

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::{ClusterConfig, ThrottleConfig, VitessConfig};
pub use error::{ConfigError, MetricError};
pub use store::{MetricStore, MetricsAggregator};
pub use types::*;
