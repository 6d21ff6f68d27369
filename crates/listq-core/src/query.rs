use crate::{direction::Direction, filter::FilterExpr};
use serde::{Deserialize, Serialize};

///
/// ListQuery
///
/// One request against the remote list: filter, ID ordering, optional row
/// limit and the set of fields to bring back. This is the whole payload the
/// `ListStore` seam receives; serializing it into the platform's native
/// syntax is the store's concern.
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct ListQuery {
    pub list: String,
    pub filter: Option<FilterExpr>,
    pub order: OrderBy,
    pub row_limit: Option<u32>,
    pub projection: Projection,
}

impl ListQuery {
    /// Unfiltered query over `list`, ordered by `id_field` ascending.
    #[must_use]
    pub fn new(list: impl Into<String>, id_field: impl Into<String>) -> Self {
        Self {
            list: list.into(),
            filter: None,
            order: OrderBy {
                field: id_field.into(),
                direction: Direction::Asc,
            },
            row_limit: None,
            projection: Projection::All,
        }
    }

    #[must_use]
    pub fn filter(mut self, filter: Option<FilterExpr>) -> Self {
        self.filter = filter;
        self
    }

    #[must_use]
    pub const fn direction(mut self, direction: Direction) -> Self {
        self.order.direction = direction;
        self
    }

    #[must_use]
    pub const fn row_limit(mut self, row_limit: Option<u32>) -> Self {
        self.row_limit = row_limit;
        self
    }

    #[must_use]
    pub fn projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }
}

///
/// OrderBy
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

///
/// Projection
///
/// Which fields a query materializes per row. The row ID is always present.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub enum Projection {
    /// Only the row ID; keeps window-search payloads small.
    IdOnly,
    Fields(Vec<String>),
    #[default]
    All,
}

impl Projection {
    #[must_use]
    pub fn fields<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Fields(fields.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn includes(&self, field: &str) -> bool {
        match self {
            Self::IdOnly => false,
            Self::Fields(fields) => fields.iter().any(|f| f == field),
            Self::All => true,
        }
    }
}
