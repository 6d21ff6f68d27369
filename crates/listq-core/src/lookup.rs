use crate::{
    client::{ListClient, Outcome},
    direction::Direction,
    error::QueryError,
    obs::OpKind,
    query::{ListQuery, Projection},
    store::ListStore,
    value::RowId,
};

impl<S: ListStore> ListClient<S> {
    /// Highest existing row ID of `list`.
    ///
    /// One query: IDs descending, capped at a single row. Fails with
    /// [`QueryError::NotFound`] when the list has no rows.
    pub async fn last_row_id(&self, list: &str) -> Result<RowId, QueryError> {
        self.start(OpKind::Lookup, list);

        let query = ListQuery::new(list, &self.config().id_field)
            .direction(Direction::Desc)
            .row_limit(Some(1))
            .projection(Projection::IdOnly);

        let rows = match self.execute(&query).await? {
            Outcome::Rows(rows) => rows,
            Outcome::Threshold(err) => {
                return Err(QueryError::ThresholdExceeded {
                    list: list.to_string(),
                    message: err.message(),
                });
            }
        };

        let id = rows
            .first()
            .map(|row| row.id)
            .ok_or_else(|| QueryError::NotFound {
                list: list.to_string(),
            })?;

        tracing::debug!(list, last_row_id = id, "last row id resolved");
        self.finish(OpKind::Lookup, list, 1);

        Ok(id)
    }
}

///
/// TESTS
///
