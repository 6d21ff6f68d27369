//! Metrics sink boundary.
//!
//! Retrieval code never touches `obs::metrics` directly. All instrumentation
//! flows through [`MetricsEvent`] and a [`MetricsSink`]; the global sink is
//! the only bridge into the process-wide counters.

use crate::obs::metrics::{self, EventReport, ListCounters};

///
/// OpKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpKind {
    Lookup,
    Search,
    Fetch,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent<'a> {
    OpStart {
        kind: OpKind,
        list: &'a str,
    },
    OpFinish {
        kind: OpKind,
        list: &'a str,
        rows: u64,
    },
    RoundTrip {
        list: &'a str,
        rows: u64,
    },
    ThresholdRetry {
        list: &'a str,
        failed_span: i64,
    },
    FetchSplit {
        list: &'a str,
        ids: u64,
    },
    RemoteFailure {
        list: &'a str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink: Send + Sync {
    fn record(&self, event: MetricsEvent<'_>);
}

///
/// GlobalMetricsSink
///
/// Default process-local sink that writes into the global counters.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        metrics::with_state_mut(|m| match event {
            MetricsEvent::OpStart { kind, list } => {
                let entry = list_entry(&mut m.lists, list);
                match kind {
                    OpKind::Lookup => {
                        m.ops.lookup_calls = m.ops.lookup_calls.saturating_add(1);
                        entry.lookup_calls = entry.lookup_calls.saturating_add(1);
                    }
                    OpKind::Search => {
                        m.ops.search_calls = m.ops.search_calls.saturating_add(1);
                        entry.search_calls = entry.search_calls.saturating_add(1);
                    }
                    OpKind::Fetch => {
                        m.ops.fetch_calls = m.ops.fetch_calls.saturating_add(1);
                        entry.fetch_calls = entry.fetch_calls.saturating_add(1);
                    }
                }
            }

            MetricsEvent::OpFinish { list, rows, .. } => {
                m.ops.rows_returned = m.ops.rows_returned.saturating_add(rows);
                let entry = list_entry(&mut m.lists, list);
                entry.rows_returned = entry.rows_returned.saturating_add(rows);
            }

            MetricsEvent::RoundTrip { list, .. } => {
                m.ops.round_trips = m.ops.round_trips.saturating_add(1);
                let entry = list_entry(&mut m.lists, list);
                entry.round_trips = entry.round_trips.saturating_add(1);
            }

            MetricsEvent::ThresholdRetry { list, .. } => {
                m.ops.threshold_retries = m.ops.threshold_retries.saturating_add(1);
                let entry = list_entry(&mut m.lists, list);
                entry.threshold_retries = entry.threshold_retries.saturating_add(1);
            }

            MetricsEvent::FetchSplit { .. } => {
                m.ops.fetch_splits = m.ops.fetch_splits.saturating_add(1);
            }

            MetricsEvent::RemoteFailure { .. } => {
                m.ops.remote_failures = m.ops.remote_failures.saturating_add(1);
            }
        });
    }
}

fn list_entry<'m>(
    lists: &'m mut std::collections::BTreeMap<String, ListCounters>,
    list: &str,
) -> &'m mut ListCounters {
    lists.entry(list.to_string()).or_default()
}

/// Snapshot the global counters.
///
/// `since_ms` filters by the counter window start, not by per-event time.
#[must_use]
pub fn metrics_report(since_ms: Option<u64>) -> EventReport {
    metrics::report(since_ms)
}

/// Reset all global counters.
pub fn metrics_reset_all() {
    metrics::reset_all();
}

///
/// TESTS
///
