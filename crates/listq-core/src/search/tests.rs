use super::SearchRequest;
use crate::{
    client::ListClient,
    config::SearchConfig,
    direction::Direction,
    error::QueryError,
    filter::{Cmp, FilterExpr},
    obs::{MetricsEvent, MetricsSink},
    query::{ListQuery, Projection},
    store::{ListStore, MemoryStore, StoreError},
    value::{Row, RowId, Value},
};
use async_trait::async_trait;
use proptest::prelude::*;
use std::{
    collections::BTreeSet,
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

const LIST: &str = "Requests";

fn dense(n: RowId) -> MemoryStore {
    let store = MemoryStore::new();
    store.extend(LIST, (1..=n).map(Row::new));
    store
}

fn client_with_span(store: MemoryStore, span: u32) -> ListClient<MemoryStore> {
    ListClient::with_config(store, SearchConfig::default().with_default_span(span))
        .expect("config is valid")
}

// (min, max] bounds of a window query
fn bounds(query: &ListQuery) -> (i64, i64) {
    let Some(FilterExpr::And(items)) = &query.filter else {
        panic!("window query should be a conjunction: {:?}", query.filter);
    };
    let bound = |expr: &FilterExpr, cmp: Cmp| match expr {
        FilterExpr::Clause(c) if c.cmp == cmp => match c.value {
            Value::Int(v) => v,
            ref other => panic!("unexpected bound value {other:?}"),
        },
        other => panic!("unexpected bound clause {other:?}"),
    };

    (bound(&items[0], Cmp::Gt), bound(&items[1], Cmp::Lte))
}

fn windows(store: &MemoryStore) -> Vec<(i64, i64)> {
    store.queries().iter().map(bounds).collect()
}

///
/// Stores
///

// Delays every query; used to exercise the request deadline.
struct SlowStore {
    inner: MemoryStore,
    delay: Duration,
}

#[async_trait]
impl ListStore for SlowStore {
    async fn query(&self, query: &ListQuery) -> Result<Vec<Row>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.query(query).await
    }
}

// Fails the nth query (zero-based) with a non-threshold error.
struct FailOnCall {
    inner: MemoryStore,
    fail_on: usize,
    calls: AtomicUsize,
}

#[async_trait]
impl ListStore for FailOnCall {
    async fn query(&self, query: &ListQuery) -> Result<Vec<Row>, StoreError> {
        if self.calls.fetch_add(1, Ordering::SeqCst) == self.fail_on {
            return Err(StoreError::remote(&query.list, "503 service unavailable"));
        }
        self.inner.query(query).await
    }
}

#[derive(Default)]
struct RecordingSink {
    retries: Mutex<Vec<i64>>,
    round_trips: AtomicUsize,
}

impl MetricsSink for RecordingSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::ThresholdRetry { failed_span, .. } => self
                .retries
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(failed_span),
            MetricsEvent::RoundTrip { .. } => {
                self.round_trips.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }
    }
}

///
/// Scenarios
///

#[tokio::test]
async fn capped_ascending_search_stops_after_first_window() {
    let client = ListClient::new(dense(12_000));
    let request = SearchRequest::new(LIST).limit(10);

    let ids = client
        .search_ids_from(&request, 12_000)
        .await
        .expect("search should succeed");

    assert_eq!(ids, (1..=10).collect::<Vec<_>>());
    assert_eq!(windows(client.store()), vec![(0, 5000)]);
    assert_eq!(client.store().queries()[0].row_limit, Some(10));
    assert_eq!(client.store().queries()[0].projection, Projection::IdOnly);
}

#[tokio::test]
async fn capped_descending_search_starts_at_tail() {
    let client = ListClient::new(dense(12_000));
    let request = SearchRequest::new(LIST).descending().limit(10);

    let ids = client
        .search_ids_from(&request, 12_000)
        .await
        .expect("search should succeed");

    assert_eq!(ids, (11_991..=12_000).rev().collect::<Vec<_>>());
    assert_eq!(windows(client.store()), vec![(7000, 12_000)]);
}

#[tokio::test]
async fn overflowing_window_retries_at_default_span() {
    let client = ListClient::new(dense(12_000));
    let request = SearchRequest::new(LIST);

    let ids = client
        .search_ids_from(&request, 12_000)
        .await
        .expect("search should succeed");

    assert_eq!(ids.len(), 12_000);
    assert!(ids.windows(2).all(|w| w[0] < w[1]), "ascending order");
    assert_eq!(
        windows(client.store()),
        vec![(0, 5000), (5000, 15_000), (5000, 10_000), (10_000, 20_000)],
        "the 10000-wide window overflows and is retried at 5000"
    );
}

#[tokio::test]
async fn span_doubles_over_sparse_ranges() {
    let store = MemoryStore::new();
    store.extend(LIST, [1, 50, 51, 900].map(Row::new));
    let client = client_with_span(store, 10);

    let ids = client
        .search_ids_from(&SearchRequest::new(LIST), 900)
        .await
        .expect("search should succeed");

    assert_eq!(ids, vec![1, 50, 51, 900]);
    assert_eq!(
        windows(client.store()),
        vec![
            (0, 10),
            (10, 30),
            (30, 70),
            (70, 150),
            (150, 310),
            (310, 630),
            (630, 1270),
        ]
    );
}

#[tokio::test]
async fn retry_resumes_at_the_failed_windows_start() {
    let client = client_with_span(dense(400).with_threshold(100), 50);

    let ids = client
        .search_ids_from(&SearchRequest::new(LIST), 400)
        .await
        .expect("search should succeed");

    assert_eq!(ids, (1..=400).collect::<Vec<_>>());
    assert_eq!(
        windows(client.store()),
        vec![(0, 50), (50, 150), (150, 350), (150, 200), (200, 300), (300, 500)]
    );
}

#[tokio::test]
async fn textual_threshold_errors_are_recognised() {
    let store = dense(400).with_threshold(100).with_textual_threshold_errors();
    let client = client_with_span(store, 50);

    let ids = client
        .search_ids_from(&SearchRequest::new(LIST), 400)
        .await
        .expect("phrase-matched overflow should be retried");

    assert_eq!(ids.len(), 400);
    assert_eq!(client.store().query_count(), 6);
}

#[tokio::test]
async fn descending_search_ends_once_lower_bound_reaches_zero() {
    let client = client_with_span(dense(30), 10);

    let ids = client
        .search_ids_from(&SearchRequest::new(LIST).descending(), 30)
        .await
        .expect("search should succeed");

    assert_eq!(ids, (1..=30).rev().collect::<Vec<_>>());
    assert_eq!(windows(client.store()), vec![(20, 30), (0, 20)]);
}

#[tokio::test]
async fn descending_window_may_slide_below_zero() {
    let client = client_with_span(dense(25), 10);

    let ids = client
        .search_ids_from(&SearchRequest::new(LIST).descending(), 25)
        .await
        .expect("search should succeed");

    assert_eq!(ids.len(), 25);
    assert_eq!(windows(client.store()), vec![(15, 25), (-5, 15)]);
}

#[tokio::test]
async fn only_the_remaining_cap_is_requested() {
    let store = MemoryStore::new();
    store.extend(LIST, [1, 2, 3, 12, 13, 14, 15, 16, 17, 18, 19, 20].map(Row::new));
    let client = client_with_span(store, 5);

    let ids = client
        .search_ids_from(&SearchRequest::new(LIST).limit(5), 20)
        .await
        .expect("search should succeed");

    assert_eq!(ids, vec![1, 2, 3, 12, 13]);
    let limits: Vec<_> = client.store().queries().iter().map(|q| q.row_limit).collect();
    assert_eq!(limits, vec![Some(5), Some(2)]);
}

#[tokio::test]
async fn overflow_at_default_span_is_an_error() {
    let client = client_with_span(dense(10).with_threshold(2), 5);

    let err = client
        .search_ids_from(&SearchRequest::new(LIST), 10)
        .await
        .expect_err("no smaller window exists");

    assert!(matches!(err, QueryError::ThresholdExceeded { .. }), "{err:?}");
    assert_eq!(client.store().query_count(), 1, "no retry loop at the default span");
}

#[tokio::test]
async fn remote_failure_aborts_without_partial_results() {
    let store = FailOnCall {
        inner: dense(30),
        fail_on: 1,
        calls: AtomicUsize::new(0),
    };
    let client = ListClient::with_config(store, SearchConfig::default().with_default_span(10))
        .expect("config is valid");

    let err = client
        .search_ids_from(&SearchRequest::new(LIST), 30)
        .await
        .expect_err("second window fails");

    assert!(err.is_remote(), "{err:?}");
    assert_eq!(client.store().calls.load(Ordering::SeqCst), 2);
}

#[tokio::test(start_paused = true)]
async fn slow_queries_hit_the_deadline() {
    let store = SlowStore {
        inner: dense(10),
        delay: Duration::from_secs(5),
    };
    let config = SearchConfig::default().with_request_timeout(Some(Duration::from_millis(100)));
    let client = ListClient::with_config(store, config).expect("config is valid");

    let err = client
        .search_ids_from(&SearchRequest::new(LIST), 10)
        .await
        .expect_err("query should time out");

    assert!(
        matches!(err, QueryError::Timeout { after_ms: 100, .. }),
        "{err:?}"
    );
}

#[tokio::test]
async fn keywords_and_filters_apply_to_every_window() {
    let store = MemoryStore::new();
    store.extend(
        LIST,
        [
            Row::new(1).with_field("Title", "Pump failure").with_field("Status", "open"),
            Row::new(2).with_field("Title", "Valve check").with_field("Status", "open"),
            Row::new(3).with_field("Notes", "replace pump seal").with_field("Status", "open"),
            Row::new(4).with_field("Title", "pump noise").with_field("Status", "closed"),
        ],
    );
    let client = ListClient::new(store);

    let request = SearchRequest::new(LIST)
        .keywords(["pump"])
        .match_fields(["Title", "Notes"])
        .filter(FilterExpr::eq("Status", "open"));

    let ids = client
        .search_ids_from(&request, 4)
        .await
        .expect("search should succeed");
    assert_eq!(ids, vec![1, 3]);

    let Some(FilterExpr::And(items)) = &client.store().queries()[0].filter else {
        panic!("window query should be a conjunction");
    };
    assert_eq!(items.len(), 4, "two bounds, keyword clause, custom filter");
    assert_eq!(
        items[2],
        FilterExpr::Or(vec![
            FilterExpr::contains("Title", "pump"),
            FilterExpr::contains("Notes", "pump"),
        ])
    );
    assert_eq!(items[3], FilterExpr::eq("Status", "open"));
}

#[tokio::test]
async fn zero_cap_issues_no_query() {
    let client = ListClient::new(dense(10));

    let ids = client
        .search_ids_from(&SearchRequest::new(LIST).limit(0), 10)
        .await
        .expect("search should succeed");

    assert!(ids.is_empty());
    assert_eq!(client.store().query_count(), 0);
}

#[tokio::test]
async fn blank_list_name_is_rejected() {
    let client = ListClient::new(dense(1));
    let err = client
        .search_ids_from(&SearchRequest::new("  "), 1)
        .await
        .expect_err("list name is required");
    assert!(matches!(err, QueryError::InvalidRequest(_)));
}

#[tokio::test]
async fn search_ids_resolves_last_row_first() {
    let client = ListClient::new(dense(12));

    let ids = client
        .search_ids(&SearchRequest::new(LIST).descending().limit(3))
        .await
        .expect("search should succeed");

    assert_eq!(ids, vec![12, 11, 10]);
    let issued = client.store().queries();
    assert_eq!(issued.len(), 2, "one lookup then one window");
    assert_eq!(issued[0].filter, None, "the lookup is unfiltered");
}

#[tokio::test]
async fn empty_list_searches_to_nothing() {
    let store = MemoryStore::new();
    store.create_list(LIST);
    let client = ListClient::new(store);

    let ids = client
        .search_ids(&SearchRequest::new(LIST))
        .await
        .expect("empty list is not an error");
    assert!(ids.is_empty());
    assert_eq!(client.store().query_count(), 1);
}

#[tokio::test]
async fn search_records_returns_projected_rows_in_order() {
    let store = MemoryStore::new();
    store.extend(
        LIST,
        (1..=6).map(|id| {
            Row::new(id)
                .with_field("Title", if id % 2 == 0 { "pump" } else { "valve" })
                .with_field("Owner", "ops")
        }),
    );
    let client = ListClient::new(store);

    let request = SearchRequest::new(LIST)
        .keywords(["pump"])
        .match_fields(["Title"])
        .descending();
    let rows = client
        .search_records(&request, Projection::fields(["Title"]))
        .await
        .expect("search should succeed");

    let ids: Vec<RowId> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![6, 4, 2]);
    assert!(rows.iter().all(|r| r.field("Owner").is_none()));
}

#[tokio::test]
async fn retries_are_reported_to_the_sink() {
    let sink = Arc::new(RecordingSink::default());
    let client = client_with_span(dense(400).with_threshold(100), 50).with_sink(sink.clone());

    client
        .search_ids_from(&SearchRequest::new(LIST), 400)
        .await
        .expect("search should succeed");

    let retries = sink
        .retries
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .clone();
    assert_eq!(retries, vec![200]);
    assert_eq!(sink.round_trips.load(Ordering::SeqCst), 6);
}

///
/// Properties
///

fn run_search(
    ids: &BTreeSet<RowId>,
    span: u32,
    threshold: usize,
    direction: Direction,
    cap: Option<usize>,
) -> Result<Vec<RowId>, QueryError> {
    let store = MemoryStore::new().with_threshold(threshold);
    store.create_list(LIST);
    store.extend(LIST, ids.iter().copied().map(Row::new));
    let client = client_with_span(store, span);
    let last = ids.last().copied().unwrap_or(0);

    let mut request = SearchRequest::new(LIST).direction(direction);
    request.row_limit = cap;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime should build");
    runtime.block_on(client.search_ids_from(&request, last))
}

fn expected(ids: &BTreeSet<RowId>, direction: Direction, cap: Option<usize>) -> Vec<RowId> {
    let ordered: Vec<RowId> = match direction {
        Direction::Asc => ids.iter().copied().collect(),
        Direction::Desc => ids.iter().rev().copied().collect(),
    };
    ordered
        .into_iter()
        .take(cap.unwrap_or(usize::MAX))
        .collect()
}

fn direction_strategy() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Asc), Just(Direction::Desc)]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // Whenever a window at the default span fits, every match is found
    // exactly once, in order, and the cap is honoured.
    #[test]
    fn search_finds_every_match_in_order(
        ids in prop::collection::btree_set(1_u64..=400, 0..120),
        span in 1_u32..40,
        headroom in 0_usize..40,
        direction in direction_strategy(),
        cap in prop::option::of(0_usize..50),
    ) {
        let threshold = span as usize + headroom;
        let found = run_search(&ids, span, threshold, direction, cap)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;

        prop_assert_eq!(found, expected(&ids, direction, cap));
    }

    // Growth past the threshold forces retries; a second identical call
    // must walk exactly the same windows and return the same IDs.
    #[test]
    fn repeated_searches_are_identical(
        ids in prop::collection::btree_set(1_u64..=400, 0..200),
        span in 1_u32..20,
        headroom in 0_usize..10,
        direction in direction_strategy(),
        cap in prop::option::of(1_usize..60),
    ) {
        let store = MemoryStore::new().with_threshold(span as usize + headroom);
        store.create_list(LIST);
        store.extend(LIST, ids.iter().copied().map(Row::new));
        let client = client_with_span(store, span);
        let last = ids.last().copied().unwrap_or(0);

        let mut request = SearchRequest::new(LIST).direction(direction);
        request.row_limit = cap;

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .expect("runtime should build");

        let first = runtime
            .block_on(client.search_ids_from(&request, last))
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let first_windows = client.store().queries();
        client.store().clear_log();

        let second = runtime
            .block_on(client.search_ids_from(&request, last))
            .map_err(|err| TestCaseError::fail(err.to_string()))?;

        prop_assert_eq!(first, second);
        prop_assert_eq!(first_windows, client.store().queries());
    }

    #[test]
    fn directions_are_mirror_images(
        ids in prop::collection::btree_set(1_u64..=300, 0..80),
        span in 1_u32..30,
    ) {
        let threshold = span as usize;
        let asc = run_search(&ids, span, threshold, Direction::Asc, None)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        let mut desc = run_search(&ids, span, threshold, Direction::Desc, None)
            .map_err(|err| TestCaseError::fail(err.to_string()))?;
        desc.reverse();

        prop_assert_eq!(asc, desc);
    }
}
