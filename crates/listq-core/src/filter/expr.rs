use crate::{filter::Cmp, value::Value};
use serde::{Deserialize, Serialize};
use std::ops::{BitAnd, BitOr, Not};

///
/// FilterExpr
///
/// Row predicate sent to the list with every query.
///
/// Leaves are field comparisons ([`FilterClause`]), the constants, and `Raw`
/// fragments the caller wrote in the list's native syntax. `Raw` is opaque:
/// the renderer copies it through and in-process evaluation rejects it.
/// `And`/`Or` hold any number of children; an empty `And` holds for every
/// row and an empty `Or` for none.
///

#[derive(Clone, Debug, Default, Deserialize, PartialEq, Serialize)]
pub enum FilterExpr {
    #[default]
    True,
    False,
    Clause(FilterClause),
    And(Vec<Self>),
    Or(Vec<Self>),
    Not(Box<Self>),
    Raw(String),
}

impl FilterExpr {
    // --- Clause ---

    /// Create a single clause: `field cmp value`.
    pub fn clause(field: impl Into<String>, cmp: Cmp, value: impl Into<Value>) -> Self {
        Self::Clause(FilterClause::new(field, cmp, value))
    }

    /// Wrap an opaque, natively-formatted expression.
    pub fn raw(fragment: impl Into<String>) -> Self {
        Self::Raw(fragment.into())
    }

    // --- Equality ---

    pub fn eq(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::clause(field, Cmp::Eq, value)
    }

    pub fn ne(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::clause(field, Cmp::Ne, value)
    }

    // --- Ordering ---

    pub fn lt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::clause(field, Cmp::Lt, value)
    }

    pub fn lte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::clause(field, Cmp::Lte, value)
    }

    pub fn gt(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::clause(field, Cmp::Gt, value)
    }

    pub fn gte(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::clause(field, Cmp::Gte, value)
    }

    // --- Text ---

    pub fn contains(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::clause(field, Cmp::Contains, value)
    }

    pub fn begins_with(field: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::clause(field, Cmp::BeginsWith, value)
    }

    // --- Presence ---

    pub fn is_null(field: impl Into<String>) -> Self {
        Self::clause(field, Cmp::IsNull, Value::Null)
    }

    pub fn is_not_null(field: impl Into<String>) -> Self {
        Self::clause(field, Cmp::IsNotNull, Value::Null)
    }

    // --- Grouping ---

    /// Conjunction of every item.
    ///
    /// No items yields `None`, one item is returned as-is, and two or more
    /// are wrapped in a single `And`.
    pub fn all<I>(items: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut items: Vec<Self> = items.into_iter().collect();
        match items.len() {
            0 => None,
            1 => items.pop(),
            _ => Some(Self::And(items)),
        }
    }

    /// Disjunction of every item, with the same cardinality rules as [`Self::all`].
    pub fn any<I>(items: I) -> Option<Self>
    where
        I: IntoIterator<Item = Self>,
    {
        let mut items: Vec<Self> = items.into_iter().collect();
        match items.len() {
            0 => None,
            1 => items.pop(),
            _ => Some(Self::Or(items)),
        }
    }

    // --- Combinators ---

    /// Conjunction of `self` and `other`. Existing `And` groups on either
    /// side are spliced in rather than nested.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        let mut items = self.and_items();
        items.extend(other.and_items());
        Self::And(items)
    }

    /// Disjunction of `self` and `other`, splicing `Or` groups like [`Self::and`].
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        let mut items = self.or_items();
        items.extend(other.or_items());
        Self::Or(items)
    }

    fn and_items(self) -> Vec<Self> {
        match self {
            Self::And(items) => items,
            other => vec![other],
        }
    }

    fn or_items(self) -> Vec<Self> {
        match self {
            Self::Or(items) => items,
            other => vec![other],
        }
    }

    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Number of leaves in the tree; raw fragments count as one.
    #[must_use]
    pub fn clause_count(&self) -> usize {
        match self {
            Self::True | Self::False => 0,
            Self::Clause(_) | Self::Raw(_) => 1,
            Self::And(children) | Self::Or(children) => {
                children.iter().map(Self::clause_count).sum()
            }
            Self::Not(inner) => inner.clause_count(),
        }
    }

    // --- Normal form ---

    /// Logically equivalent tree in which:
    /// - `Not` wraps only a clause or a raw fragment,
    /// - no group contains a constant, an empty group, or a directly nested
    ///   group of its own kind,
    /// - one-child groups are unwrapped.
    ///
    /// The result is `True` or `False` only when the whole tree is constant.
    #[must_use]
    pub fn simplify(self) -> Self {
        match self {
            Self::Not(inner) => inner.negated(),
            Self::And(children) => Self::fold_group(children, true),
            Self::Or(children) => Self::fold_group(children, false),
            leaf => leaf,
        }
    }

    // Simplified complement of `self`.
    fn negated(self) -> Self {
        match self {
            Self::True => Self::False,
            Self::False => Self::True,
            Self::Not(inner) => inner.simplify(),
            Self::And(children) => Self::fold_group(children.into_iter().map(Self::not).collect(), false),
            Self::Or(children) => Self::fold_group(children.into_iter().map(Self::not).collect(), true),
            leaf @ (Self::Clause(_) | Self::Raw(_)) => Self::Not(Box::new(leaf)),
        }
    }

    // `conjunction` picks `And` (False absorbs, True is neutral) or its dual.
    fn fold_group(children: Vec<Self>, conjunction: bool) -> Self {
        let mut kept = Vec::with_capacity(children.len());

        for child in children {
            match (child.simplify(), conjunction) {
                (Self::False, true) => return Self::False,
                (Self::True, false) => return Self::True,
                (Self::True, true) | (Self::False, false) => {}
                (Self::And(nested), true) | (Self::Or(nested), false) => kept.extend(nested),
                (other, _) => kept.push(other),
            }
        }

        if conjunction {
            Self::all(kept).unwrap_or(Self::True)
        } else {
            Self::any(kept).unwrap_or(Self::False)
        }
    }
}

///
/// Bit Operations
/// allow us to do | & and ! on expressions
///

impl BitAnd for FilterExpr {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self::Output {
        self.and(rhs)
    }
}

impl BitOr for FilterExpr {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self::Output {
        self.or(rhs)
    }
}

impl Not for FilterExpr {
    type Output = Self;

    fn not(self) -> Self::Output {
        Self::Not(Box::new(self))
    }
}

///
/// FilterClause
/// represents a basic comparison expression: `field cmp value`
///

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct FilterClause {
    pub field: String,
    pub cmp: Cmp,
    pub value: Value,
}

impl FilterClause {
    #[must_use]
    pub fn new(field: impl Into<String>, cmp: Cmp, value: impl Into<Value>) -> Self {
        Self {
            field: field.into(),
            cmp,
            value: value.into(),
        }
    }
}

///
/// TESTS
///
