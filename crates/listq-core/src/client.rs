use crate::{
    config::{ConfigError, SearchConfig},
    error::QueryError,
    obs::{GlobalMetricsSink, MetricsEvent, MetricsSink, OpKind},
    query::ListQuery,
    store::{ListStore, StoreError},
    value::Row,
};
use std::sync::Arc;

///
/// ListClient
///
/// Entry point for lookups, searches, and record fetches against one
/// [`ListStore`]. Holds no per-call state, so one client can serve any number
/// of concurrent calls.
///

pub struct ListClient<S> {
    store: S,
    config: SearchConfig,
    sink: Arc<dyn MetricsSink>,
}

///
/// Outcome
///
/// Result of one remote round trip once non-recoverable failures have been
/// turned into `QueryError`s.
///

#[derive(Debug)]
pub(crate) enum Outcome {
    Rows(Vec<Row>),
    Threshold(StoreError),
}

impl<S: ListStore> ListClient<S> {
    /// Client with the default configuration reporting to the global sink.
    pub fn new(store: S) -> Self {
        Self {
            store,
            config: SearchConfig::default(),
            sink: Arc::new(GlobalMetricsSink),
        }
    }

    /// Client with a validated configuration.
    pub fn with_config(store: S, config: SearchConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        Ok(Self {
            store,
            config,
            sink: Arc::new(GlobalMetricsSink),
        })
    }

    /// Report metrics to `sink` instead of the global counters.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn MetricsSink>) -> Self {
        self.sink = sink;
        self
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    pub const fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub(crate) fn record(&self, event: MetricsEvent<'_>) {
        self.sink.record(event);
    }

    pub(crate) fn start(&self, kind: OpKind, list: &str) {
        self.record(MetricsEvent::OpStart { kind, list });
    }

    pub(crate) fn finish(&self, kind: OpKind, list: &str, rows: usize) {
        self.record(MetricsEvent::OpFinish {
            kind,
            list,
            rows: rows as u64,
        });
    }

    /// Issue one query, applying the configured deadline.
    ///
    /// Threshold overflows come back as [`Outcome::Threshold`] so the caller
    /// can pick a smaller request; every other failure ends the operation.
    pub(crate) async fn execute(&self, query: &ListQuery) -> Result<Outcome, QueryError> {
        let list = query.list.as_str();

        let result = match self.config.request_timeout() {
            Some(deadline) => tokio::time::timeout(deadline, self.store.query(query))
                .await
                .map_err(|_| {
                    let after_ms = u64::try_from(deadline.as_millis()).unwrap_or(u64::MAX);
                    tracing::warn!(list, after_ms, "remote query timed out");
                    self.record(MetricsEvent::RemoteFailure { list });
                    QueryError::Timeout {
                        list: list.to_string(),
                        after_ms,
                    }
                })?,
            None => self.store.query(query).await,
        };

        match result {
            Ok(rows) => {
                self.record(MetricsEvent::RoundTrip {
                    list,
                    rows: rows.len() as u64,
                });
                Ok(Outcome::Rows(rows))
            }
            Err(err) if err.is_threshold_exceeded(&self.config.threshold_phrase) => {
                self.record(MetricsEvent::RoundTrip { list, rows: 0 });
                Ok(Outcome::Threshold(err))
            }
            Err(err) => {
                tracing::warn!(list, error = %err, "remote query failed");
                self.record(MetricsEvent::RemoteFailure { list });
                Err(QueryError::remote(list, err))
            }
        }
    }
}
