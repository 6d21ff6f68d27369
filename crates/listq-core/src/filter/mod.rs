//! Filter expressions over list rows: the tree, keyword clause construction,
//! and in-process evaluation.

mod eval;
mod expr;
mod keyword;

pub use eval::{EvalError, matches};
pub use expr::{FilterClause, FilterExpr};
pub use keyword::keyword_filter;

use derive_more::Display;
use serde::{Deserialize, Serialize};

///
/// Cmp
///
/// Comparison operator of a single filter clause.
///

#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum Cmp {
    #[display("eq")]
    Eq,
    #[display("ne")]
    Ne,
    #[display("lt")]
    Lt,
    #[display("lte")]
    Lte,
    #[display("gt")]
    Gt,
    #[display("gte")]
    Gte,
    #[display("contains")]
    Contains,
    #[display("begins_with")]
    BeginsWith,
    #[display("is_null")]
    IsNull,
    #[display("is_not_null")]
    IsNotNull,
}

impl Cmp {
    /// Logical complement, where one exists.
    ///
    /// Text matches have no native complement.
    #[must_use]
    pub const fn negate(self) -> Option<Self> {
        match self {
            Self::Eq => Some(Self::Ne),
            Self::Ne => Some(Self::Eq),
            Self::Lt => Some(Self::Gte),
            Self::Lte => Some(Self::Gt),
            Self::Gt => Some(Self::Lte),
            Self::Gte => Some(Self::Lt),
            Self::IsNull => Some(Self::IsNotNull),
            Self::IsNotNull => Some(Self::IsNull),
            Self::Contains | Self::BeginsWith => None,
        }
    }
}
