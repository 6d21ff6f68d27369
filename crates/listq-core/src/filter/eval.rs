use crate::{
    filter::{Cmp, FilterClause, FilterExpr},
    value::{Row, Value},
};
use std::cmp::Ordering;
use thiserror::Error as ThisError;

///
/// EvalError
///

#[derive(Clone, Debug, Eq, PartialEq, ThisError)]
pub enum EvalError {
    #[error("raw filter fragments cannot be evaluated in-process: {fragment}")]
    OpaqueExpression { fragment: String },
}

/// Evaluate `expr` against one row.
///
/// `id_field` names the column that resolves to `row.id`. Missing fields
/// read as `Null`. Text matches are case-insensitive, mirroring how hosted
/// lists evaluate `Contains`/`BeginsWith`.
pub fn matches(expr: &FilterExpr, row: &Row, id_field: &str) -> Result<bool, EvalError> {
    match expr {
        FilterExpr::True => Ok(true),
        FilterExpr::False => Ok(false),
        FilterExpr::Clause(clause) => Ok(eval_clause(clause, row, id_field)),
        FilterExpr::And(children) => {
            for child in children {
                if !matches(child, row, id_field)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
        FilterExpr::Or(children) => {
            for child in children {
                if matches(child, row, id_field)? {
                    return Ok(true);
                }
            }
            Ok(false)
        }
        FilterExpr::Not(inner) => matches(inner, row, id_field).map(|hit| !hit),
        FilterExpr::Raw(fragment) => Err(EvalError::OpaqueExpression {
            fragment: fragment.clone(),
        }),
    }
}

fn eval_clause(clause: &FilterClause, row: &Row, id_field: &str) -> bool {
    let id_value;
    let actual = if clause.field == id_field {
        id_value = Value::Uint(row.id);
        &id_value
    } else {
        row.field(&clause.field).unwrap_or(&Value::Null)
    };

    match clause.cmp {
        Cmp::Eq if clause.value.is_null() => is_blank(actual),
        Cmp::Ne if clause.value.is_null() => !is_blank(actual),
        Cmp::Eq => actual.compare(&clause.value) == Some(Ordering::Equal),
        Cmp::Ne => actual.compare(&clause.value) != Some(Ordering::Equal),
        Cmp::Lt => actual.compare(&clause.value) == Some(Ordering::Less),
        Cmp::Lte => matches!(
            actual.compare(&clause.value),
            Some(Ordering::Less | Ordering::Equal)
        ),
        Cmp::Gt => actual.compare(&clause.value) == Some(Ordering::Greater),
        Cmp::Gte => matches!(
            actual.compare(&clause.value),
            Some(Ordering::Greater | Ordering::Equal)
        ),
        Cmp::Contains => text_match(actual, &clause.value, |hay, needle| hay.contains(needle)),
        Cmp::BeginsWith => {
            text_match(actual, &clause.value, |hay, needle| hay.starts_with(needle))
        }
        Cmp::IsNull => is_blank(actual),
        Cmp::IsNotNull => !is_blank(actual),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Text(s) => s.is_empty(),
        Value::List(items) => items.is_empty(),
        _ => false,
    }
}

// Case-insensitive text comparison; list fields match if any element does.
fn text_match(actual: &Value, needle: &Value, f: fn(&str, &str) -> bool) -> bool {
    let Some(needle) = needle.as_text() else {
        return false;
    };
    let needle = needle.to_lowercase();

    match actual {
        Value::Text(hay) => f(&hay.to_lowercase(), &needle),
        Value::List(items) => items
            .iter()
            .filter_map(Value::as_text)
            .any(|hay| f(&hay.to_lowercase(), &needle)),
        _ => false,
    }
}

///
/// TESTS
///
