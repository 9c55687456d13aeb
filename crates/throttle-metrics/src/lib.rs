//! throttle-metrics — instrumentation for throttle checks.
//!
//! Counts checks and check errors, globally and per app, without ever
//! delaying the check itself.
//!
//! # Architecture
//!
//! ```text
//! InstrumentationDispatcher
//!   ├── dispatch(CheckRecord) ← called once per check, never blocks
//!   └── DispatchWorker (background task)
//!       └── CheckRecord::apply() → CounterRegistry
//!
//! Prometheus exposition
//!   └── render_prometheus() → text/plain for /metrics endpoint
//! ```

pub mod dispatch;
pub mod prometheus;
pub mod registry;

pub use dispatch::{CheckRecord, DispatchWorker, GLOBAL_ERRORS, GLOBAL_TOTAL, InstrumentationDispatcher};
pub use prometheus::render_prometheus;
pub use registry::{Counter, CounterRegistry, InstrumentationSink};
