//! Observability: process-local counters and the sink abstraction the
//! retrieval operations report through.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport, EventState, ListCounters};
pub use sink::{GlobalMetricsSink, MetricsEvent, MetricsSink, OpKind, metrics_report, metrics_reset_all};
