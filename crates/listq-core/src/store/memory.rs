//! In-process [`ListStore`] that behaves like a hosted list: server-side
//! filtering, ID ordering, row limits, projections, and a hard result-size
//! threshold.

use crate::{
    direction::Direction,
    filter,
    query::{ListQuery, Projection},
    store::{ListStore, StoreError, THRESHOLD_PHRASE},
    value::{Row, RowId},
};
use async_trait::async_trait;
use std::{
    collections::{BTreeMap, VecDeque},
    sync::{Mutex, MutexGuard, PoisonError},
};

/// Default maximum number of matching rows a single query may produce.
pub const DEFAULT_THRESHOLD: usize = 5000;

///
/// MemoryStore
///
/// Lists are keyed by name; rows within a list by ID. Every query is logged
/// so callers can inspect the exact windows a search issued.
///

pub struct MemoryStore {
    id_field: String,
    threshold: usize,
    textual_threshold: bool,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    lists: BTreeMap<String, BTreeMap<RowId, Row>>,
    failures: VecDeque<StoreError>,
    log: Vec<ListQuery>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self {
            id_field: "ID".to_string(),
            threshold: DEFAULT_THRESHOLD,
            textual_threshold: false,
            state: Mutex::new(State::default()),
        }
    }

    #[must_use]
    pub const fn with_threshold(mut self, threshold: usize) -> Self {
        self.threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    /// Report threshold overflows as plain remote failures whose message
    /// carries the threshold phrase, like stores without a structured code.
    #[must_use]
    pub const fn with_textual_threshold_errors(mut self) -> Self {
        self.textual_threshold = true;
        self
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create `list` if it does not exist yet.
    pub fn create_list(&self, list: &str) {
        self.state().lists.entry(list.to_string()).or_default();
    }

    /// Insert or replace a row, creating the list on first use.
    pub fn insert(&self, list: &str, row: Row) {
        self.state()
            .lists
            .entry(list.to_string())
            .or_default()
            .insert(row.id, row);
    }

    pub fn extend(&self, list: &str, rows: impl IntoIterator<Item = Row>) {
        let mut state = self.state();
        let entries = state.lists.entry(list.to_string()).or_default();
        for row in rows {
            entries.insert(row.id, row);
        }
    }

    /// Delete a row. IDs are never handed out again.
    pub fn remove(&self, list: &str, id: RowId) -> Option<Row> {
        self.state().lists.get_mut(list)?.remove(&id)
    }

    #[must_use]
    pub fn row_count(&self, list: &str) -> usize {
        self.state().lists.get(list).map_or(0, BTreeMap::len)
    }

    /// Queue a failure returned by the next query instead of executing it.
    pub fn push_failure(&self, err: StoreError) {
        self.state().failures.push_back(err);
    }

    /// Every query received so far, in arrival order.
    #[must_use]
    pub fn queries(&self) -> Vec<ListQuery> {
        self.state().log.clone()
    }

    #[must_use]
    pub fn query_count(&self) -> usize {
        self.state().log.len()
    }

    pub fn clear_log(&self) {
        self.state().log.clear();
    }

    fn execute(&self, state: &State, query: &ListQuery) -> Result<Vec<Row>, StoreError> {
        let rows = state
            .lists
            .get(&query.list)
            .ok_or_else(|| StoreError::ListNotFound {
                list: query.list.clone(),
            })?;

        let mut hits = Vec::new();
        for row in rows.values() {
            let keep = match &query.filter {
                Some(expr) => filter::matches(expr, row, &self.id_field)
                    .map_err(|err| StoreError::remote(&query.list, err.to_string()))?,
                None => true,
            };
            if keep {
                hits.push(row);
            }
        }

        // Unfiltered queries walk the ID index and stop at the row limit.
        let scanned = match (&query.filter, query.row_limit) {
            (None, Some(limit)) => hits.len().min(usize::try_from(limit).unwrap_or(usize::MAX)),
            _ => hits.len(),
        };
        if scanned > self.threshold {
            let message = format!(
                "the attempted operation is prohibited because it {THRESHOLD_PHRASE} ({scanned} > {})",
                self.threshold
            );
            return Err(if self.textual_threshold {
                StoreError::remote(&query.list, message)
            } else {
                StoreError::threshold(&query.list, message)
            });
        }

        // Only ID ordering is supported; any other order field falls back to ID.
        if query.order.direction == Direction::Desc {
            hits.reverse();
        }
        if let Some(limit) = query.row_limit {
            hits.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        }

        Ok(hits
            .into_iter()
            .map(|row| project(row, &query.projection))
            .collect())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn project(row: &Row, projection: &Projection) -> Row {
    match projection {
        Projection::All => row.clone(),
        Projection::IdOnly => Row::new(row.id),
        Projection::Fields(_) => Row {
            id: row.id,
            fields: row
                .fields
                .iter()
                .filter(|(name, _)| projection.includes(name))
                .map(|(name, value)| (name.clone(), value.clone()))
                .collect(),
        },
    }
}

#[async_trait]
impl ListStore for MemoryStore {
    async fn query(&self, query: &ListQuery) -> Result<Vec<Row>, StoreError> {
        let mut state = self.state();
        state.log.push(query.clone());

        if let Some(err) = state.failures.pop_front() {
            return Err(err);
        }

        self.execute(&state, query)
    }
}

///
/// TESTS
///
