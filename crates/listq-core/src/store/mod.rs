//! The remote list boundary.
//!
//! Everything that talks to the hosted list goes through [`ListStore`].
//! Serializing a [`ListQuery`] into the platform's native syntax and moving
//! it over the wire is the implementor's concern.

pub mod memory;

use crate::{query::ListQuery, value::Row};
use async_trait::async_trait;
use thiserror::Error as ThisError;

pub use memory::MemoryStore;

/// Phrase hosted lists put in the error text when a query's result set is
/// larger than the list view threshold.
pub const THRESHOLD_PHRASE: &str = "exceeds the list view threshold";

///
/// ListStore
///
/// Query-by-filter capability of a hosted list. Implementations must return
/// rows sorted by the query's `OrderBy`, truncated to its row limit, with the
/// fields named by its projection.
///

#[async_trait]
pub trait ListStore: Send + Sync {
    async fn query(&self, query: &ListQuery) -> Result<Vec<Row>, StoreError>;
}

#[async_trait]
impl<S: ListStore + ?Sized> ListStore for std::sync::Arc<S> {
    async fn query(&self, query: &ListQuery) -> Result<Vec<Row>, StoreError> {
        (**self).query(query).await
    }
}

///
/// StoreError
///
/// Failure reported by the remote list.
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum StoreError {
    /// Structured threshold signal, for stores that expose an error code.
    #[error("query on list '{list}' exceeds the list view threshold: {message}")]
    ThresholdExceeded { list: String, message: String },

    #[error("list '{list}' does not exist")]
    ListNotFound { list: String },

    #[error("remote failure on list '{list}': {message}")]
    Remote { list: String, message: String },
}

impl StoreError {
    pub fn remote(list: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Remote {
            list: list.into(),
            message: message.into(),
        }
    }

    pub fn threshold(list: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ThresholdExceeded {
            list: list.into(),
            message: message.into(),
        }
    }

    /// True when this failure means the result set was too large.
    ///
    /// The structured variant wins; otherwise the remote message is searched
    /// case-insensitively for `phrase`.
    #[must_use]
    pub fn is_threshold_exceeded(&self, phrase: &str) -> bool {
        match self {
            Self::ThresholdExceeded { .. } => true,
            Self::Remote { message, .. } => message
                .to_lowercase()
                .contains(&phrase.to_lowercase()),
            Self::ListNotFound { .. } => false,
        }
    }

    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::ThresholdExceeded { message, .. } | Self::Remote { message, .. } => {
                message.clone()
            }
            Self::ListNotFound { .. } => self.to_string(),
        }
    }
}

///
/// TESTS
///
