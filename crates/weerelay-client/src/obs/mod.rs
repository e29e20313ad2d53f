//! Observability helpers.
//!
//! Counters for the decode/apply pipeline, rendered as Prometheus text.

mod metrics;

pub use metrics::{CounterVec, PipelineMetrics};
