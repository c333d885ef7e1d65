//! Observability: process-local query counters and sink abstractions.
//!
//! This module does not touch stores or scan handles directly.
//! Query execution reports through `MetricsEvent` only.

pub(crate) mod metrics;
pub(crate) mod sink;


// re-exports
pub use metrics::{EventOps, EventReport, EventState, GroupCounters};
pub use sink::{MetricsEvent, MetricsSink, metrics_report, metrics_reset_all, with_metrics_sink};
