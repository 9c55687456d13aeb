//! In-memory metric store.
//!
//! The collection loop records the latest reading per cluster here; the
//! check path reads it back through [`MetricsAggregator`]. Thresholds and
//! the app deny list come from configuration.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use tracing::debug;

use crate::config::ThrottleConfig;
use crate::error::MetricError;
use crate::types::{ClusterName, MetricResult};

/// Source of aggregated cluster readings for the check path.
pub trait MetricsAggregator: Send + Sync {
    /// Current reading and configured threshold for `cluster_name`, as seen
    /// by `app_name`.
    fn cluster_metric(&self, app_name: &str, cluster_name: &str) -> (MetricResult, f64);

    /// Latest reading of every cluster that has one.
    fn aggregated_metrics(&self) -> HashMap<ClusterName, MetricResult>;
}

#[derive(Debug, Default)]
struct ClusterEntry {
    threshold: f64,
    latest: Option<MetricResult>,
}

#[derive(Debug, Default)]
struct StoreInner {
    clusters: HashMap<ClusterName, ClusterEntry>,
    denied_apps: HashSet<String>,
}

/// Thread-safe store of per-cluster readings. Cheap to clone.
#[derive(Debug, Clone, Default)]
pub struct MetricStore {
    inner: Arc<RwLock<StoreInner>>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed thresholds and the deny list from configuration.
    pub fn from_config(config: &ThrottleConfig) -> Self {
        let store = Self::new();
        for (name, cluster) in &config.clusters {
            store.set_threshold(name, cluster.threshold);
        }
        for app in &config.denied_apps {
            store.deny_app(app);
        }
        store
    }

    pub fn set_threshold(&self, cluster_name: &str, threshold: f64) {
        let mut inner = self.inner.write().expect("metric store lock");
        inner
            .clusters
            .entry(cluster_name.to_string())
            .or_default()
            .threshold = threshold;
    }

    /// Record the latest reading for a cluster, replacing the previous one.
    pub fn record(&self, cluster_name: &str, result: MetricResult) {
        let mut inner = self.inner.write().expect("metric store lock");
        debug!(cluster = %cluster_name, value = result.value, "metric recorded");
        inner
            .clusters
            .entry(cluster_name.to_string())
            .or_default()
            .latest = Some(result);
    }

    pub fn deny_app(&self, app_name: &str) {
        let mut inner = self.inner.write().expect("metric store lock");
        inner.denied_apps.insert(app_name.to_string());
    }

    pub fn allow_app(&self, app_name: &str) {
        let mut inner = self.inner.write().expect("metric store lock");
        inner.denied_apps.remove(app_name);
    }

    pub fn is_denied(&self, app_name: &str) -> bool {
        let inner = self.inner.read().expect("metric store lock");
        inner.denied_apps.contains(app_name)
    }

    pub fn threshold(&self, cluster_name: &str) -> Option<f64> {
        let inner = self.inner.read().expect("metric store lock");
        inner.clusters.get(cluster_name).map(|c| c.threshold)
    }
}

impl MetricsAggregator for MetricStore {
    fn cluster_metric(&self, app_name: &str, cluster_name: &str) -> (MetricResult, f64) {
        let inner = self.inner.read().expect("metric store lock");
        let entry = inner.clusters.get(cluster_name);
        let threshold = entry.map(|c| c.threshold).unwrap_or_default();

        if inner.denied_apps.contains(app_name) {
            return (MetricResult::err(MetricError::AppDenied), threshold);
        }

        match entry.and_then(|c| c.latest.clone()) {
            Some(result) => (result, threshold),
            None => (MetricResult::err(MetricError::NoSuchMetric), threshold),
        }
    }

    fn aggregated_metrics(&self) -> HashMap<ClusterName, MetricResult> {
        let inner = self.inner.read().expect("metric store lock");
        inner
            .clusters
            .iter()
            .filter_map(|(name, c)| c.latest.clone().map(|r| (name.clone(), r)))
            .collect()
    }
}
