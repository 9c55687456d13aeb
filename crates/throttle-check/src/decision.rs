//! Pure classification of a metric reading.

use throttle_core::{AdmissionOutcome, MetricError, MetricResult};

/// Produces the current reading and threshold for one app/cluster context.
pub trait MetricFetch {
    fn fetch(&self) -> (MetricResult, f64);
}

impl<F> MetricFetch for F
where
    F: Fn() -> (MetricResult, f64),
{
    fn fetch(&self) -> (MetricResult, f64) {
        self()
    }
}

/// Classify a reading. The first matching rule wins; faults are carried
/// through unchanged except for the two this function introduces
/// (`MissingAppName` and `ThresholdExceeded`).
pub fn classify(
    app_name: &str,
    metric: &MetricResult,
    threshold: f64,
) -> (AdmissionOutcome, Option<MetricError>) {
    if app_name.is_empty() {
        return (
            AdmissionOutcome::RequestInvalid,
            Some(MetricError::MissingAppName),
        );
    }

    match &metric.fault {
        Some(MetricError::AppDenied) => (AdmissionOutcome::Denied, metric.fault.clone()),
        Some(MetricError::NoSuchMetric) => (AdmissionOutcome::NotFound, metric.fault.clone()),
        Some(_) => (AdmissionOutcome::InternalFault, metric.fault.clone()),
        // Equal to threshold still passes.
        None if metric.value > threshold => (
            AdmissionOutcome::ThresholdExceeded,
            Some(MetricError::ThresholdExceeded),
        ),
        None => (AdmissionOutcome::Admitted, None),
    }
}
