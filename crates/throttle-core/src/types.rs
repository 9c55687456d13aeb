//! Metric readings and admission results.

use crate::error::MetricError;

/// Name of a monitored MySQL cluster.
pub type ClusterName = String;

/// A single point-in-time reading of a monitored quantity (e.g. lag seconds).
#[derive(Debug, Clone, PartialEq)]
pub struct MetricResult {
    pub value: f64,
    /// Why the reading could not be produced, if it could not.
    pub fault: Option<MetricError>,
}

impl MetricResult {
    pub fn ok(value: f64) -> Self {
        Self { value, fault: None }
    }

    pub fn err(fault: MetricError) -> Self {
        Self { value: 0.0, fault: Some(fault) }
    }

    /// The value, or the fault that prevented producing it.
    pub fn get(&self) -> Result<f64, MetricError> {
        match &self.fault {
            Some(fault) => Err(fault.clone()),
            None => Ok(self.value),
        }
    }
}

/// Classified result of a single check call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AdmissionOutcome {
    /// Metric is within threshold.
    Admitted,
    /// The app is not allowed to read this metric.
    Denied,
    /// Metric not collected yet, or unknown.
    NotFound,
    /// Metric exceeds threshold; the caller should back off.
    ThresholdExceeded,
    /// The metric provider failed.
    InternalFault,
    /// The request itself was malformed (no app name).
    RequestInvalid,
}

impl AdmissionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admitted => "admitted",
            Self::Denied => "denied",
            Self::NotFound => "not_found",
            Self::ThresholdExceeded => "threshold_exceeded",
            Self::InternalFault => "internal_fault",
            Self::RequestInvalid => "request_invalid",
        }
    }
}

impl std::fmt::Display for AdmissionOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of evaluating one app against one metric. Created fresh per call.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckResult {
    pub outcome: AdmissionOutcome,
    pub value: f64,
    pub threshold: f64,
    pub fault: Option<MetricError>,
}

impl CheckResult {
    pub fn new(
        outcome: AdmissionOutcome,
        value: f64,
        threshold: f64,
        fault: Option<MetricError>,
    ) -> Self {
        Self {
            outcome,
            value,
            threshold,
            fault,
        }
    }

    pub fn is_admitted(&self) -> bool {
        self.outcome == AdmissionOutcome::Admitted
    }

    /// Human-readable fault message, empty when admitted.
    pub fn message(&self) -> String {
        self.fault.as_ref().map(|e| e.to_string()).unwrap_or_default()
    }
}
