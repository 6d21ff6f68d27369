//! listq: threshold-safe retrieval from hosted lists.
//!
//! ## Crate layout
//! - `core`: data model, filters, the `ListStore` seam, `ListClient` and its
//!   lookup, search, and fetch operations, configuration, and metrics.
//! - `caml`: rendering of filters and list queries into the native
//!   view-XML query syntax.
//! - `error`: the public error type with a stable kind + origin taxonomy.
//!
//! The `prelude` module carries the vocabulary needed to build requests and
//! run them.

pub use listq_caml as caml;
pub use listq_core as core;

pub mod error;

pub use error::{Error, ErrorKind, ErrorOrigin};

//
// Consts
//

/// Workspace version re-export for downstream tooling/tests.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

///
/// Prelude
///

pub mod prelude {
    pub use crate::{
        caml::{render_view, render_where},
        core::{
            client::ListClient,
            config::SearchConfig,
            direction::Direction,
            filter::{Cmp, FilterExpr, keyword_filter},
            query::{ListQuery, Projection},
            search::SearchRequest,
            store::{ListStore, StoreError},
            value::{Row, RowId, Value},
        },
        error::Error,
    };
}

///
/// TESTS
///
