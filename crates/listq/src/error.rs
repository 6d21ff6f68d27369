use derive_more::Display;
use listq_caml::RenderError;
use listq_core::{config::ConfigError, error::QueryError, store::StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// Error
/// Public error type with a stable kind + origin taxonomy.
///

#[derive(Debug, Deserialize, Serialize, ThisError)]
#[error("{message}")]
pub struct Error {
    pub kind: ErrorKind,
    pub origin: ErrorOrigin,
    pub message: String,
}

impl Error {
    pub fn new(kind: ErrorKind, origin: ErrorOrigin, message: impl Into<String>) -> Self {
        Self {
            kind,
            origin,
            message: message.into(),
        }
    }

    /// Re-attribute the error to the operation the caller was running.
    #[must_use]
    pub const fn with_origin(mut self, origin: ErrorOrigin) -> Self {
        self.origin = origin;
        self
    }

    /// True when a smaller or later request cannot succeed either.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        !matches!(self.kind, ErrorKind::Remote | ErrorKind::Timeout)
    }
}

impl From<QueryError> for Error {
    fn from(err: QueryError) -> Self {
        let (kind, origin) = match &err {
            QueryError::NotFound { .. } => (ErrorKind::NotFound, ErrorOrigin::Lookup),
            QueryError::Remote { .. } => (ErrorKind::Remote, ErrorOrigin::Store),
            QueryError::ThresholdExceeded { .. } => (ErrorKind::Threshold, ErrorOrigin::Search),
            QueryError::InvalidRequest(_) => (ErrorKind::Invalid, ErrorOrigin::Search),
            QueryError::Timeout { .. } => (ErrorKind::Timeout, ErrorOrigin::Store),
        };

        Self::new(kind, origin, err.to_string())
    }
}

impl From<StoreError> for Error {
    fn from(err: StoreError) -> Self {
        let kind = match err {
            StoreError::ThresholdExceeded { .. } => ErrorKind::Threshold,
            StoreError::ListNotFound { .. } => ErrorKind::NotFound,
            StoreError::Remote { .. } => ErrorKind::Remote,
        };

        Self::new(kind, ErrorOrigin::Store, err.to_string())
    }
}

impl From<ConfigError> for Error {
    fn from(err: ConfigError) -> Self {
        Self::new(ErrorKind::Config, ErrorOrigin::Config, err.to_string())
    }
}

impl From<RenderError> for Error {
    fn from(err: RenderError) -> Self {
        Self::new(ErrorKind::Invalid, ErrorOrigin::Render, err.to_string())
    }
}

///
/// ErrorKind
/// Public error taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorKind {
    /// The list is missing or has no rows.
    NotFound,

    /// The remote list failed for a reason other than the view threshold.
    Remote,

    /// A query overflowed the view threshold and could not be narrowed.
    Threshold,

    /// Request or filter shape is invalid.
    Invalid,

    Timeout,

    Config,
}

///
/// ErrorOrigin
/// Public origin taxonomy for callers.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
pub enum ErrorOrigin {
    Store,
    Search,
    Lookup,
    Fetch,
    Config,
    Render,
}

///
/// TESTS
///
