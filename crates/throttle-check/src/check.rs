//! The check entry points used by the HTTP layer.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use throttle_core::{CheckResult, ClusterName, MetricResult, MetricsAggregator};
use throttle_metrics::{CheckRecord, InstrumentationDispatcher};

use crate::decision::{classify, MetricFetch};

/// Evaluates app checks against aggregated cluster metrics.
///
/// Holds no mutable state of its own; share it behind an `Arc` across
/// request handlers.
pub struct ThrottleCheck {
    aggregator: Arc<dyn MetricsAggregator>,
    dispatcher: InstrumentationDispatcher,
}

impl ThrottleCheck {
    pub fn new(
        aggregator: Arc<dyn MetricsAggregator>,
        dispatcher: InstrumentationDispatcher,
    ) -> Self {
        Self {
            aggregator,
            dispatcher,
        }
    }

    /// Fetch a reading through `fetch`, classify it for `app_name`, and
    /// queue the instrumentation update. Never waits on instrumentation.
    pub fn check_app_metric_result(&self, app_name: &str, fetch: &dyn MetricFetch) -> CheckResult {
        let (metric, threshold) = fetch.fetch();
        let (outcome, fault) = classify(app_name, &metric, threshold);

        debug!(
            app = %app_name,
            %outcome,
            value = metric.value,
            threshold,
            "check evaluated"
        );

        if !app_name.is_empty() {
            self.dispatcher.dispatch(CheckRecord::new(app_name, outcome));
        }

        CheckResult::new(outcome, metric.value, threshold, fault)
    }

    /// Check `app_name` against the current aggregated reading of a MySQL
    /// cluster.
    pub fn check_cluster(&self, app_name: &str, cluster_name: &str) -> CheckResult {
        let fetch = || self.aggregator.cluster_metric(app_name, cluster_name);
        self.check_app_metric_result(app_name, &fetch)
    }

    /// Latest reading of every cluster, straight from the aggregator.
    pub fn aggregated_metrics(&self) -> HashMap<ClusterName, MetricResult> {
        self.aggregator.aggregated_metrics()
    }
}
