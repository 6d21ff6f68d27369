use crate::{
    client::{ListClient, Outcome},
    direction::Direction,
    error::QueryError,
    filter::FilterExpr,
    obs::{MetricsEvent, OpKind},
    query::{ListQuery, Projection},
    store::ListStore,
    value::{Row, RowId},
};
use std::collections::{BTreeSet, VecDeque};

impl<S: ListStore> ListClient<S> {
    /// Full rows for a known set of IDs, ordered by ID in `direction`.
    ///
    /// IDs that no longer exist are silently absent from the result. The set
    /// is de-duplicated and sent in batches of `fetch_batch_size`, each batch
    /// as one disjunction of ID equalities. A batch that overflows the
    /// threshold is split in half and both halves re-issued; a single ID that
    /// still overflows is an error.
    pub async fn fetch_records(
        &self,
        list: &str,
        ids: &[RowId],
        direction: Direction,
        projection: Projection,
    ) -> Result<Vec<Row>, QueryError> {
        if ids.is_empty() {
            return Err(QueryError::invalid("record fetch needs at least one id"));
        }

        self.start(OpKind::Fetch, list);

        let unique: Vec<RowId> = ids.iter().copied().collect::<BTreeSet<_>>().into_iter().collect();
        let mut pending: VecDeque<Vec<RowId>> = unique
            .chunks(self.config().fetch_batch_size)
            .map(<[RowId]>::to_vec)
            .collect();

        let mut rows: Vec<Row> = Vec::with_capacity(unique.len());
        while let Some(batch) = pending.pop_front() {
            let query = self.batch_query(list, &batch, direction, &projection);

            match self.execute(&query).await? {
                Outcome::Rows(found) => rows.extend(found),
                Outcome::Threshold(err) => {
                    if batch.len() == 1 {
                        return Err(QueryError::ThresholdExceeded {
                            list: list.to_string(),
                            message: err.message(),
                        });
                    }

                    tracing::debug!(list, ids = batch.len(), "fetch batch exceeded threshold, splitting");
                    self.record(MetricsEvent::FetchSplit {
                        list,
                        ids: batch.len() as u64,
                    });

                    let (head, tail) = batch.split_at(batch.len() / 2);
                    pending.push_front(tail.to_vec());
                    pending.push_front(head.to_vec());
                }
            }
        }

        rows.sort_by_key(|row| row.id);
        rows.dedup_by_key(|row| row.id);
        if direction == Direction::Desc {
            rows.reverse();
        }

        self.finish(OpKind::Fetch, list, rows.len());

        Ok(rows)
    }

    fn batch_query(
        &self,
        list: &str,
        batch: &[RowId],
        direction: Direction,
        projection: &Projection,
    ) -> ListQuery {
        let id_field = self.config().id_field.as_str();
        let filter = FilterExpr::any(batch.iter().map(|id| FilterExpr::eq(id_field, *id)));

        ListQuery::new(list, id_field)
            .filter(filter)
            .direction(direction)
            .projection(projection.clone())
    }
}

///
/// TESTS
///
