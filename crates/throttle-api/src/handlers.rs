//! HTTP handlers.
//!
//! Check handlers encode the admission outcome in the status code so that
//! clients can throttle on `HEAD` requests without reading a body.

use std::collections::BTreeMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use throttle_core::{AdmissionOutcome, CheckResult, MetricResult};

use crate::ApiState;

/// Status code clients see for each outcome.
pub fn outcome_status(outcome: AdmissionOutcome) -> StatusCode {
    match outcome {
        AdmissionOutcome::Admitted => StatusCode::OK,
        AdmissionOutcome::ThresholdExceeded => StatusCode::TOO_MANY_REQUESTS,
        AdmissionOutcome::NotFound => StatusCode::NOT_FOUND,
        AdmissionOutcome::Denied | AdmissionOutcome::RequestInvalid => {
            StatusCode::EXPECTATION_FAILED
        }
        AdmissionOutcome::InternalFault => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON body of a check response.
#[derive(Debug, Serialize)]
pub struct CheckResponse {
    pub status_code: u16,
    pub outcome: &'static str,
    pub value: f64,
    pub threshold: f64,
    pub message: String,
}

impl From<&CheckResult> for CheckResponse {
    fn from(result: &CheckResult) -> Self {
        Self {
            status_code: outcome_status(result.outcome).as_u16(),
            outcome: result.outcome.as_str(),
            value: result.value,
            threshold: result.threshold,
            message: result.message(),
        }
    }
}

/// One cluster in the aggregated metrics listing.
#[derive(Debug, Serialize)]
pub struct MetricView {
    pub value: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&MetricResult> for MetricView {
    fn from(result: &MetricResult) -> Self {
        Self {
            value: result.value,
            error: result.fault.as_ref().map(|e| e.to_string()),
        }
    }
}

fn check_response(result: CheckResult) -> axum::response::Response {
    (outcome_status(result.outcome), Json(CheckResponse::from(&result))).into_response()
}

// ── Checks ─────────────────────────────────────────────────────

/// GET /check/{app}/mysql/{cluster}
pub async fn check_cluster(
    State(state): State<ApiState>,
    Path((app, cluster)): Path<(String, String)>,
) -> impl IntoResponse {
    check_response(state.check.check_cluster(&app, &cluster))
}

/// GET /check/mysql/{cluster}
pub async fn check_cluster_without_app(
    State(state): State<ApiState>,
    Path(cluster): Path<String>,
) -> impl IntoResponse {
    check_response(state.check.check_cluster("", &cluster))
}

// ── Metrics ────────────────────────────────────────────────────

/// GET /aggregated-metrics
pub async fn aggregated_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let metrics: BTreeMap<String, MetricView> = state
        .check
        .aggregated_metrics()
        .iter()
        .map(|(cluster, result)| (format!("mysql/{cluster}"), MetricView::from(result)))
        .collect();
    Json(metrics)
}

/// GET /metrics
pub async fn prometheus_metrics(State(state): State<ApiState>) -> impl IntoResponse {
    let body = throttle_metrics::render_prometheus(&state.counters.snapshot());
    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}

/// GET /lb-check
pub async fn lb_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use throttle_check::ThrottleCheck;
    use throttle_core::{MetricError, MetricStore};
    use throttle_metrics::{CounterRegistry, InstrumentationDispatcher};

    fn test_state(store: MetricStore) -> ApiState {
        let counters = CounterRegistry::new();
        let dispatcher = InstrumentationDispatcher::inline(Arc::new(counters.clone()));
        ApiState {
            check: Arc::new(ThrottleCheck::new(Arc::new(store), dispatcher)),
            counters,
        }
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn status_per_outcome() {
        assert_eq!(outcome_status(AdmissionOutcome::Admitted), StatusCode::OK);
        assert_eq!(outcome_status(AdmissionOutcome::ThresholdExceeded), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(outcome_status(AdmissionOutcome::NotFound), StatusCode::NOT_FOUND);
        assert_eq!(outcome_status(AdmissionOutcome::Denied), StatusCode::EXPECTATION_FAILED);
        assert_eq!(outcome_status(AdmissionOutcome::RequestInvalid), StatusCode::EXPECTATION_FAILED);
        assert_eq!(outcome_status(AdmissionOutcome::InternalFault), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn check_admitted() {
        let store = MetricStore::new();
        store.set_threshold("main", 1.5);
        store.record("main", MetricResult::ok(1.2));

        let resp = check_cluster(
            State(test_state(store)),
            Path(("web".to_string(), "main".to_string())),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["status_code"], 200);
        assert_eq!(body["outcome"], "admitted");
        assert_eq!(body["value"], 1.2);
        assert_eq!(body["threshold"], 1.5);
        assert_eq!(body["message"], "");
    }

    #[tokio::test]
    async fn check_exceeded() {
        let store = MetricStore::new();
        store.set_threshold("main", 2.0);
        store.record("main", MetricResult::ok(5.0));

        let resp = check_cluster(
            State(test_state(store)),
            Path(("web".to_string(), "main".to_string())),
        )
        .await
        .into_response();
        assert_eq!(resp.status(), StatusCode::TOO_MANY_REQUESTS);
        assert_eq!(body_json(resp).await["message"], "threshold exceeded");
    }

    #[tokio::test]
    async fn check_without_app_rejected() {
        let state = test_state(MetricStore::new());
        let counters = state.counters.clone();

        let resp = check_cluster_without_app(State(state), Path("main".to_string()))
            .await
            .into_response();
        assert_eq!(resp.status(), StatusCode::EXPECTATION_FAILED);
        assert_eq!(body_json(resp).await["message"], "no app indicated");
        assert!(counters.is_empty());
    }

    #[tokio::test]
    async fn aggregated_metrics_keyed_by_cluster() {
        let store = MetricStore::new();
        store.record("main", MetricResult::ok(0.25));
        store.record("broken", MetricResult::err(MetricError::Internal("no replicas".into())));

        let resp = aggregated_metrics(State(test_state(store))).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);

        let body = body_json(resp).await;
        assert_eq!(body["mysql/main"]["value"], 0.25);
        assert!(body["mysql/main"].get("error").is_none());
        assert_eq!(body["mysql/broken"]["error"], "no replicas");
    }

    #[tokio::test]
    async fn prometheus_endpoint_returns_counters() {
        let store = MetricStore::new();
        store.record("main", MetricResult::ok(0.1));
        let state = test_state(store);
        state.check.check_cluster("web", "main");

        let resp = prometheus_metrics(State(state)).await.into_response();
        assert_eq!(resp.status(), StatusCode::OK);
        let content_type = resp.headers().get("content-type").unwrap().to_str().unwrap();
        assert!(content_type.contains("text/plain"));

        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(bytes.to_vec()).unwrap();
        assert!(text.contains("throttle_app_checks_total{app=\"web\"} 1"));
        assert!(text.contains("\nthrottle_checks_total 1\n"));
    }
}
