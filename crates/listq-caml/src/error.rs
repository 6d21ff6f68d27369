use listq_core::filter::Cmp;
use thiserror::Error as ThisError;

///
/// RenderError
///
/// A filter tree with no faithful CAML rendering.
///

#[derive(Debug, ThisError)]
pub enum RenderError {
    #[error("cannot negate '{cmp}' on field '{field}'")]
    UnsupportedNegation { field: String, cmp: Cmp },

    #[error("cannot negate a raw CAML fragment")]
    NegatedRaw,

    #[error("unsupported value for '{cmp}' on field '{field}': {reason}")]
    UnsupportedValue {
        field: String,
        cmp: Cmp,
        reason: &'static str,
    },

    #[error("date formatting failed: {0}")]
    Date(#[from] time::error::Format),
}
