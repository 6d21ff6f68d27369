use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    sync::{LazyLock, Mutex, PoisonError},
};
use time::OffsetDateTime;

///
/// EventState
/// Ephemeral, in-memory counters for list operations.
///

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub lists: BTreeMap<String, ListCounters>,
    pub since_ms: u64,
}

impl Default for EventState {
    fn default() -> Self {
        Self {
            ops: EventOps::default(),
            lists: BTreeMap::new(),
            since_ms: now_millis(),
        }
    }
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Entrypoints
    pub lookup_calls: u64,
    pub search_calls: u64,
    pub fetch_calls: u64,

    // Remote traffic
    pub round_trips: u64,
    pub threshold_retries: u64,
    pub fetch_splits: u64,
    pub remote_failures: u64,

    // Rows handed back to callers
    pub rows_returned: u64,
}

///
/// ListCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ListCounters {
    pub lookup_calls: u64,
    pub search_calls: u64,
    pub fetch_calls: u64,
    pub round_trips: u64,
    pub threshold_retries: u64,
    pub rows_returned: u64,
}

///
/// EventReport
/// Point-in-time snapshot handed to callers.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    pub ops: EventOps,
    pub lists: BTreeMap<String, ListCounters>,
    pub since_ms: u64,
}

static EVENT_STATE: LazyLock<Mutex<EventState>> =
    LazyLock::new(|| Mutex::new(EventState::default()));

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn now_millis() -> u64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000).max(0) as u64
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    let state = EVENT_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    f(&state)
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    let mut state = EVENT_STATE.lock().unwrap_or_else(PoisonError::into_inner);
    f(&mut state)
}

/// Reset all counters.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Snapshot counters.
///
/// When `since_ms` is given and the current window started earlier, an empty
/// report for that window start is returned instead.
#[must_use]
pub(crate) fn report(since_ms: Option<u64>) -> EventReport {
    with_state(|m| match since_ms {
        Some(start) if m.since_ms < start => EventReport {
            since_ms: start,
            ..EventReport::default()
        },
        _ => EventReport {
            ops: m.ops.clone(),
            lists: m.lists.clone(),
            since_ms: m.since_ms,
        },
    })
}
