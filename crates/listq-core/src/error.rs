use crate::store::StoreError;
use thiserror::Error as ThisError;

///
/// QueryError
///
/// Failure of a lookup, search, or fetch. No partial results accompany an
/// error: the operation that produced it is abandoned.
///

#[derive(Debug, ThisError)]
pub enum QueryError {
    /// The list exists but holds no rows.
    #[error("list '{list}' has no rows")]
    NotFound { list: String },

    /// Any remote failure other than a recoverable threshold overflow.
    #[error("remote query on list '{list}' failed: {source}")]
    Remote {
        list: String,
        #[source]
        source: StoreError,
    },

    /// A threshold overflow that no smaller request can avoid.
    #[error("list '{list}' exceeds the list view threshold even at the smallest request: {message}")]
    ThresholdExceeded { list: String, message: String },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("remote query on list '{list}' timed out after {after_ms} ms")]
    Timeout { list: String, after_ms: u64 },
}

impl QueryError {
    pub(crate) fn remote(list: &str, source: StoreError) -> Self {
        Self::Remote {
            list: list.to_string(),
            source,
        }
    }

    pub(crate) fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidRequest(message.into())
    }

    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}
