//! Topology discovery error types.

use std::time::Duration;

use thiserror::Error;

pub type TopologyResult<T> = Result<T, TopologyError>;

/// Errors that can occur while resolving tablets.
#[derive(Debug, Error)]
pub enum TopologyError {
    #[error("invalid topology url: {0}")]
    InvalidUrl(String),

    #[error("topology request failed: {0}")]
    Transport(String),

    #[error("topology request timed out after {0:?}")]
    Timeout(Duration),

    #[error("malformed tablet list: {0}")]
    Parse(#[from] serde_json::Error),
}

impl TopologyError {
    /// Whether the failure happened on the network rather than in the body.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }
}
