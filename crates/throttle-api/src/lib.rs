//! throttle-api — HTTP API for throttle checks.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET, HEAD | `/check/{app}/mysql/{cluster}` | Check an app against a cluster |
//! | GET, HEAD | `/check/mysql/{cluster}` | Check without an app (always rejected) |
//! | GET | `/aggregated-metrics` | Latest reading of every cluster |
//! | GET | `/metrics` | Prometheus exposition of check counters |
//! | GET | `/lb-check` | Load balancer liveness |

pub mod handlers;

use std::sync::Arc;

use axum::Router;
use axum::routing::get;
use throttle_check::ThrottleCheck;
use throttle_metrics::CounterRegistry;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub check: Arc<ThrottleCheck>,
    pub counters: CounterRegistry,
}

/// Build the complete API router.
pub fn build_router(check: Arc<ThrottleCheck>, counters: CounterRegistry) -> Router {
    let state = ApiState { check, counters };

    Router::new()
        .route("/check/{app}/mysql/{cluster}", get(handlers::check_cluster))
        .route("/check/mysql/{cluster}", get(handlers::check_cluster_without_app))
        .route("/aggregated-metrics", get(handlers::aggregated_metrics))
        .route("/metrics", get(handlers::prometheus_metrics))
        .route("/lb-check", get(handlers::lb_check))
        .with_state(state)
}
