//! throttle-check — admission decisions for throttle checks.
//!
//! An app asks "may I write to cluster X now?". The evaluator fetches the
//! cluster's current metric and threshold, classifies the reading into an
//! [`AdmissionOutcome`](throttle_core::AdmissionOutcome), and hands the
//! instrumentation update to a background dispatcher.
//!
//! # Decision order
//!
//! | Condition | Outcome |
//! |---|---|
//! | empty app name | `RequestInvalid` |
//! | `AppDenied` fault | `Denied` |
//! | `NoSuchMetric` fault | `NotFound` |
//! | any other fault | `InternalFault` |
//! | value > threshold | `ThresholdExceeded` |
//! | otherwise | `Admitted` |

pub mod check;
pub mod decision;

pub use check::ThrottleCheck;
pub use decision::{classify, MetricFetch};
