//! Background dispatch of check instrumentation.
//!
//! Checks hand a [`CheckRecord`] to the dispatcher and return immediately.
//! A single worker task applies records to the sink in arrival order. On
//! shutdown the worker stops accepting records, drains what is queued, and
//! exits; anything dispatched after that is applied inline on the caller,
//! so every record is applied exactly once.

use std::sync::Arc;

use throttle_core::AdmissionOutcome;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::registry::InstrumentationSink;

/// Checks across all apps.
pub const GLOBAL_TOTAL: &str = "checks.total";
/// Non-admitted checks across all apps.
pub const GLOBAL_ERRORS: &str = "checks.errors";

/// Per-app counter `check.<app>.<kind>`, e.g. `check.web.error`. Global
/// counters live under `checks.`, which no app name can reach.
pub fn counter_name(app: &str, kind: &str) -> String {
    format!("check.{app}.{kind}")
}

/// Instrumentation for one completed check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckRecord {
    pub app_name: String,
    pub outcome: AdmissionOutcome,
}

impl CheckRecord {
    pub fn new(app_name: &str, outcome: AdmissionOutcome) -> Self {
        Self {
            app_name: app_name.to_string(),
            outcome,
        }
    }

    /// Bump the total counters, and the error counters unless admitted.
    /// Records without an app name are ignored.
    pub fn apply(&self, sink: &dyn InstrumentationSink) {
        if self.app_name.is_empty() {
            return;
        }
        sink.counter(GLOBAL_TOTAL).inc();
        sink.counter(&counter_name(&self.app_name, "total")).inc();
        if self.outcome != AdmissionOutcome::Admitted {
            sink.counter(GLOBAL_ERRORS).inc();
            sink.counter(&counter_name(&self.app_name, "error")).inc();
        }
    }
}

#[derive(Clone)]
enum Mode {
    Background(mpsc::UnboundedSender<CheckRecord>),
    Inline,
}

/// Hands check records to the sink without blocking the check path.
#[derive(Clone)]
pub struct InstrumentationDispatcher {
    sink: Arc<dyn InstrumentationSink>,
    mode: Mode,
}

/// Handle to the background worker. Dropping it without calling
/// [`shutdown`](Self::shutdown) leaves the worker running until every
/// dispatcher clone is gone.
pub struct DispatchWorker {
    handle: JoinHandle<u64>,
    shutdown_tx: watch::Sender<bool>,
}

impl InstrumentationDispatcher {
    /// Start the background worker. Must be called inside a tokio runtime.
    pub fn spawn(sink: Arc<dyn InstrumentationSink>) -> (Self, DispatchWorker) {
        let (tx, rx) = mpsc::unbounded_channel();
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let worker_sink = sink.clone();
        let handle = tokio::spawn(async move { run_worker(worker_sink, rx, shutdown_rx).await });

        (
            Self {
                sink,
                mode: Mode::Background(tx),
            },
            DispatchWorker {
                handle,
                shutdown_tx,
            },
        )
    }

    /// A dispatcher that applies every record on the calling thread.
    pub fn inline(sink: Arc<dyn InstrumentationSink>) -> Self {
        Self {
            sink,
            mode: Mode::Inline,
        }
    }

    pub fn dispatch(&self, record: CheckRecord) {
        match &self.mode {
            Mode::Background(tx) => {
                if let Err(mpsc::error::SendError(record)) = tx.send(record) {
                    debug!(app = %record.app_name, "dispatch worker stopped, applying inline");
                    record.apply(self.sink.as_ref());
                }
            }
            Mode::Inline => record.apply(self.sink.as_ref()),
        }
    }
}

impl DispatchWorker {
    /// Stop the worker after draining every queued record. Returns the
    /// number of records the worker applied over its lifetime.
    pub async fn shutdown(self) -> u64 {
        let _ = self.shutdown_tx.send(true);
        let applied = self.handle.await.unwrap_or_default();
        info!(applied, "instrumentation dispatcher drained");
        applied
    }
}

async fn run_worker(
    sink: Arc<dyn InstrumentationSink>,
    mut rx: mpsc::UnboundedReceiver<CheckRecord>,
    mut shutdown: watch::Receiver<bool>,
) -> u64 {
    let mut applied = 0;
    let mut shutdown_dropped = false;

    loop {
        tokio::select! {
            record = rx.recv() => match record {
                Some(record) => {
                    record.apply(sink.as_ref());
                    applied += 1;
                }
                // Every dispatcher dropped.
                None => break,
            },
            changed = shutdown.changed(), if !shutdown_dropped => {
                // Handle dropped without a shutdown request: keep serving.
                if changed.is_err() {
                    shutdown_dropped = true;
                    continue;
                }
                rx.close();
                while let Some(record) = rx.recv().await {
                    record.apply(sink.as_ref());
                    applied += 1;
                }
                break;
            }
        }
    }

    debug!(applied, "dispatch worker exiting");
    applied
}
