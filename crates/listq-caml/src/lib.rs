//! Serializer from listq's structured filter tree and list queries to the
//! hosted list's native view-XML query syntax (CAML).
//!
//! ```text
//! <View>
//!   <ViewFields>…</ViewFields>
//!   <Query><Where>…</Where><OrderBy>…</OrderBy></Query>
//!   <RowLimit>…</RowLimit>
//! </View>
//! ```
//!
//! Output is emitted without whitespace between elements.

mod error;
mod view;
mod where_clause;
mod xml;

pub use error::RenderError;
pub use view::render_view;
pub use where_clause::{WhereRenderer, render_where};
pub use xml::escape;
