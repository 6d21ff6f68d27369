//! Keyword/filter search over a list, paged through ID windows so that no
//! single query's result set crosses the list view threshold.
//!
//! Windows grow multiplicatively after every successful query and fall back
//! to the default span the moment one overflows. The loop ends when the far
//! end of the list has been searched or the row cap is met.

mod window;

#[cfg(test)]
mod tests;

pub use window::SearchWindow;

use crate::{
    client::{ListClient, Outcome},
    direction::Direction,
    error::QueryError,
    filter::{FilterExpr, keyword_filter},
    obs::{MetricsEvent, OpKind},
    query::{ListQuery, Projection},
    store::ListStore,
    value::{Row, RowId},
};
use serde::{Deserialize, Serialize};

///
/// SearchRequest
///
/// What to look for: keywords matched against a set of text fields, extra
/// filter expressions ANDed on top, the ID direction, and an optional cap on
/// the number of IDs returned.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub struct SearchRequest {
    pub list: String,
    pub keywords: Vec<String>,
    pub match_fields: Vec<String>,
    pub filters: Vec<FilterExpr>,
    pub direction: Direction,
    pub row_limit: Option<usize>,
}

impl SearchRequest {
    #[must_use]
    pub fn new(list: impl Into<String>) -> Self {
        Self {
            list: list.into(),
            ..Self::default()
        }
    }

    /// Keywords every row must contain. Case normalization is the caller's
    /// job; they are sent as given.
    #[must_use]
    pub fn keywords<I, K>(mut self, keywords: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        self.keywords = keywords.into_iter().map(Into::into).collect();
        self
    }

    /// Fields each keyword may be found in.
    #[must_use]
    pub fn match_fields<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.match_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn filter(mut self, expr: FilterExpr) -> Self {
        self.filters.push(expr);
        self
    }

    #[must_use]
    pub const fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub const fn descending(self) -> Self {
        self.direction(Direction::Desc)
    }

    #[must_use]
    pub const fn limit(mut self, row_limit: usize) -> Self {
        self.row_limit = Some(row_limit);
        self
    }

    /// Clauses shared by every window: the keyword match plus the extra
    /// filters, in that order.
    fn shared_clauses(&self) -> Vec<FilterExpr> {
        keyword_filter(&self.keywords, &self.match_fields)
            .into_iter()
            .chain(self.filters.iter().cloned())
            .collect()
    }
}

///
/// RangeWindowSearch
///
/// State of one search call. Each step issues exactly one query and waits
/// for it before choosing the next window.
///

struct RangeWindowSearch<'a, S> {
    client: &'a ListClient<S>,
    request: &'a SearchRequest,
    shared: Vec<FilterExpr>,
    last_row: i64,
    default_span: i64,
}

impl<S: ListStore> RangeWindowSearch<'_, S> {
    async fn run(self) -> Result<Vec<RowId>, QueryError> {
        let direction = self.request.direction;
        let list = self.request.list.as_str();
        let mut window = SearchWindow::initial(direction, self.last_row, self.default_span);
        let mut ids: Vec<RowId> = Vec::new();

        loop {
            let query = self.window_query(window, ids.len());

            match self.client.execute(&query).await? {
                Outcome::Rows(rows) => {
                    tracing::debug!(
                        list,
                        min = window.min,
                        max = window.max,
                        span = window.span,
                        rows = rows.len(),
                        "window searched"
                    );
                    ids.extend(rows.iter().map(|row| row.id));

                    let limit_reached = self.request.row_limit.is_some_and(|k| ids.len() >= k);
                    if limit_reached || window.reaches_end(direction, self.last_row) {
                        if let Some(k) = self.request.row_limit {
                            ids.truncate(k);
                        }
                        return Ok(ids);
                    }

                    window = window.grow(direction);
                }

                Outcome::Threshold(err) => {
                    if window.span <= self.default_span {
                        return Err(QueryError::ThresholdExceeded {
                            list: list.to_string(),
                            message: err.message(),
                        });
                    }

                    tracing::info!(
                        list,
                        min = window.min,
                        max = window.max,
                        failed_span = window.span,
                        "window exceeded threshold, retrying at default span"
                    );
                    self.client.record(MetricsEvent::ThresholdRetry {
                        list,
                        failed_span: window.span,
                    });

                    window = window.reset(direction, self.default_span);
                }
            }
        }
    }

    fn window_query(&self, window: SearchWindow, found: usize) -> ListQuery {
        let id_field = self.client.config().id_field.as_str();

        let bounds = [
            FilterExpr::gt(id_field, window.min),
            FilterExpr::lte(id_field, window.max),
        ];
        let filter = FilterExpr::all(bounds.into_iter().chain(self.shared.iter().cloned()));

        // Only what is still missing from the cap is requested.
        let remaining = self
            .request
            .row_limit
            .map(|k| u32::try_from(k.saturating_sub(found)).unwrap_or(u32::MAX));

        ListQuery::new(&self.request.list, id_field)
            .filter(filter)
            .direction(self.request.direction)
            .row_limit(remaining)
            .projection(Projection::IdOnly)
    }
}

impl<S: ListStore> ListClient<S> {
    /// Search `request.list` and return matching row IDs in the requested
    /// direction, given the list's current last row ID.
    ///
    /// `last_row_id` tells an ascending search where the list ends and a
    /// descending search where to start.
    ///
    /// Threshold overflows are retried internally with a smaller window. The
    /// one exception is a window already at `default_span` that still
    /// overflows: no smaller window exists, so the search fails with
    /// [`QueryError::ThresholdExceeded`] instead of retrying forever.
    pub async fn search_ids_from(
        &self,
        request: &SearchRequest,
        last_row_id: RowId,
    ) -> Result<Vec<RowId>, QueryError> {
        if request.list.trim().is_empty() {
            return Err(QueryError::invalid("search request has no list name"));
        }
        let last_row = i64::try_from(last_row_id)
            .map_err(|_| QueryError::invalid(format!("last row id {last_row_id} is out of range")))?;

        self.start(OpKind::Search, &request.list);

        if request.row_limit == Some(0) {
            self.finish(OpKind::Search, &request.list, 0);
            return Ok(Vec::new());
        }

        let search = RangeWindowSearch {
            client: self,
            request,
            shared: request.shared_clauses(),
            last_row,
            default_span: i64::from(self.config().default_span),
        };
        let ids = search.run().await?;

        self.finish(OpKind::Search, &request.list, ids.len());

        Ok(ids)
    }

    /// Look up the list's last row ID, then search. An empty list yields no
    /// IDs rather than an error.
    pub async fn search_ids(&self, request: &SearchRequest) -> Result<Vec<RowId>, QueryError> {
        let last_row_id = match self.last_row_id(&request.list).await {
            Ok(id) => id,
            Err(QueryError::NotFound { .. }) => return Ok(Vec::new()),
            Err(err) => return Err(err),
        };

        self.search_ids_from(request, last_row_id).await
    }

    /// Search, then fetch the matching rows with `projection`, in the
    /// request's direction.
    pub async fn search_records(
        &self,
        request: &SearchRequest,
        projection: Projection,
    ) -> Result<Vec<Row>, QueryError> {
        let ids = self.search_ids(request).await?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.fetch_records(&request.list, &ids, request.direction, projection)
            .await
    }
}
