//! Core of listq: the filter model, the `ListStore` seam, and the three
//! retrieval operations (last-row lookup, range-window search, and
//! record fetch by ID) that keep every query under a hosted list's view
//! threshold.

// public exports are one module level down
pub mod client;
pub mod config;
pub mod direction;
pub mod error;
pub mod filter;
pub mod obs;
pub mod query;
pub mod search;
pub mod store;
pub mod value;

// operations implemented on ListClient
mod fetch;
mod lookup;

///
/// Prelude
///
/// Domain vocabulary plus the client. Errors and stores stay behind their
/// modules.
///

pub mod prelude {
    pub use crate::{
        client::ListClient,
        direction::Direction,
        filter::{Cmp, FilterExpr},
        query::Projection,
        search::SearchRequest,
        value::{Row, RowId, Value},
    };
}
