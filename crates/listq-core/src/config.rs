use crate::store::THRESHOLD_PHRASE;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error as ThisError;

/// Window span known to stay under the list view threshold.
pub const DEFAULT_SPAN: u32 = 5000;

/// Name of the list's auto-assigned identifier column.
pub const DEFAULT_ID_FIELD: &str = "ID";

/// Maximum IDs combined into one record-fetch query.
pub const DEFAULT_FETCH_BATCH_SIZE: usize = 500;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("toml decode error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("invalid search config: {0}")]
    Invalid(String),
}

///
/// SearchConfig
///
/// Tunables shared by every operation of a `ListClient`.
///
/// ```toml
/// default_span = 5000
/// threshold_phrase = "exceeds the list view threshold"
/// id_field = "ID"
/// fetch_batch_size = 500
/// request_timeout_ms = 30000
/// ```
///

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct SearchConfig {
    /// Span of the first window, and the span a window resets to after a
    /// threshold failure.
    pub default_span: u32,

    /// Text that marks a remote failure as a threshold overflow when the
    /// store has no structured code for it. Matched case-insensitively.
    pub threshold_phrase: String,

    pub id_field: String,

    pub fetch_batch_size: usize,

    /// Deadline applied to every remote call. `None` waits indefinitely.
    pub request_timeout_ms: Option<u64>,
}

impl SearchConfig {
    /// Parse and validate a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_span == 0 {
            return Err(ConfigError::Invalid("default_span must be > 0".into()));
        }
        if self.threshold_phrase.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "threshold_phrase must not be empty".into(),
            ));
        }
        if self.id_field.trim().is_empty() {
            return Err(ConfigError::Invalid("id_field must not be empty".into()));
        }
        if self.fetch_batch_size == 0 {
            return Err(ConfigError::Invalid("fetch_batch_size must be > 0".into()));
        }
        if self.request_timeout_ms == Some(0) {
            return Err(ConfigError::Invalid(
                "request_timeout_ms must be > 0 when set".into(),
            ));
        }

        Ok(())
    }

    #[must_use]
    pub const fn with_default_span(mut self, span: u32) -> Self {
        self.default_span = span;
        self
    }

    #[must_use]
    pub fn with_threshold_phrase(mut self, phrase: impl Into<String>) -> Self {
        self.threshold_phrase = phrase.into();
        self
    }

    #[must_use]
    pub fn with_id_field(mut self, id_field: impl Into<String>) -> Self {
        self.id_field = id_field.into();
        self
    }

    #[must_use]
    pub const fn with_fetch_batch_size(mut self, size: usize) -> Self {
        self.fetch_batch_size = size;
        self
    }

    #[must_use]
    pub const fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout_ms = match timeout {
            #[allow(clippy::cast_possible_truncation)]
            Some(t) => Some(t.as_millis() as u64),
            None => None,
        };
        self
    }

    #[must_use]
    pub const fn request_timeout(&self) -> Option<Duration> {
        match self.request_timeout_ms {
            Some(ms) => Some(Duration::from_millis(ms)),
            None => None,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            default_span: DEFAULT_SPAN,
            threshold_phrase: THRESHOLD_PHRASE.to_string(),
            id_field: DEFAULT_ID_FIELD.to_string(),
            fetch_batch_size: DEFAULT_FETCH_BATCH_SIZE,
            request_timeout_ms: None,
        }
    }
}

///
/// TESTS
///
