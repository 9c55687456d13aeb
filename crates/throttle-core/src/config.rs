//! throttle.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThrottleConfig {
    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
    #[serde(default = "default_topology_timeout_ms")]
    pub topology_timeout_ms: u64,
    /// Apps refused access to every metric.
    #[serde(default)]
    pub denied_apps: Vec<String>,
    #[serde(default)]
    pub clusters: BTreeMap<String, ClusterConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    /// Maximum acceptable metric value (e.g. lag seconds).
    pub threshold: f64,
    pub vitess: Option<VitessConfig>,
}

/// Where to discover the cluster's replicas through the vtctld API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VitessConfig {
    pub api: String,
    pub keyspace: String,
    /// Empty means all shards.
    #[serde(default)]
    pub shard: String,
}

fn default_listen_port() -> u16 {
    8111
}

fn default_topology_timeout_ms() -> u64 {
    1000
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            listen_port: default_listen_port(),
            topology_timeout_ms: default_topology_timeout_ms(),
            denied_apps: Vec::new(),
            clusters: BTreeMap::new(),
        }
    }
}

impl ThrottleConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ThrottleConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topology_timeout_ms == 0 {
            return Err(ConfigError::Invalid(
                "topology_timeout_ms must be positive".to_string(),
            ));
        }
        for (name, cluster) in &self.clusters {
            if !cluster.threshold.is_finite() || cluster.threshold < 0.0 {
                return Err(ConfigError::Invalid(format!(
                    "cluster {name}: threshold must be a non-negative number, got {}",
                    cluster.threshold
                )));
            }
            if let Some(vitess) = &cluster.vitess {
                if vitess.api.trim().is_empty() || vitess.keyspace.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "cluster {name}: vitess api and keyspace are required"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn topology_timeout(&self) -> Duration {
        Duration::from_millis(self.topology_timeout_ms)
    }
}
