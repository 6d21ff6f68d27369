use crate::{
    error::RenderError,
    xml::{field_ref, typed_value},
};
use listq_core::{
    config::DEFAULT_ID_FIELD,
    filter::{Cmp, FilterClause, FilterExpr},
    value::Value,
};

/// Render the body of a `<Where>` element, or `None` when `expr` matches
/// every row.
///
/// Assumes the list's identifier column is named `ID`.
pub fn render_where(expr: &FilterExpr) -> Result<Option<String>, RenderError> {
    WhereRenderer::new(DEFAULT_ID_FIELD).render(expr)
}

///
/// WhereRenderer
///
/// Renders the simplified form of a filter tree. CAML has no negation
/// element, so simplification first pushes `Not` down to the leaves, where a
/// negated clause is written with the inverted comparator.
///

#[derive(Clone, Debug)]
pub struct WhereRenderer {
    id_field: String,
}

impl WhereRenderer {
    #[must_use]
    pub fn new(id_field: impl Into<String>) -> Self {
        Self {
            id_field: id_field.into(),
        }
    }

    /// See [`render_where`].
    pub fn render(&self, expr: &FilterExpr) -> Result<Option<String>, RenderError> {
        match expr.clone().simplify() {
            FilterExpr::True => Ok(None),
            simplified => self.node(&simplified).map(Some),
        }
    }

    fn node(&self, expr: &FilterExpr) -> Result<String, RenderError> {
        match expr {
            // the identifier column is never empty
            FilterExpr::True => Ok(format!("<IsNotNull>{}</IsNotNull>", field_ref(&self.id_field))),
            FilterExpr::False => Ok(format!("<IsNull>{}</IsNull>", field_ref(&self.id_field))),
            FilterExpr::Clause(clause) => self.clause(clause, false),
            FilterExpr::And(children) => self.group(children, "And"),
            FilterExpr::Or(children) => self.group(children, "Or"),
            FilterExpr::Not(inner) => match inner.as_ref() {
                FilterExpr::Clause(clause) => self.clause(clause, true),
                // simplified trees only negate leaves
                _ => Err(RenderError::NegatedRaw),
            },
            FilterExpr::Raw(fragment) => Ok(fragment.clone()),
        }
    }

    /// Left-nested binary group: `<Op><Op>a b</Op>c</Op>`. One child is
    /// emitted bare.
    fn group(&self, children: &[FilterExpr], op: &str) -> Result<String, RenderError> {
        let mut parts = children.iter().map(|child| self.node(child));
        let Some(first) = parts.next().transpose()? else {
            return self.node(if op == "And" { &FilterExpr::True } else { &FilterExpr::False });
        };

        parts.try_fold(first, |acc, next| next.map(|xml| format!("<{op}>{acc}{xml}</{op}>")))
    }

    fn clause(&self, clause: &FilterClause, negated: bool) -> Result<String, RenderError> {
        let cmp = if negated {
            clause
                .cmp
                .negate()
                .ok_or_else(|| RenderError::UnsupportedNegation {
                    field: clause.field.clone(),
                    cmp: clause.cmp,
                })?
        } else {
            clause.cmp
        };

        let cmp = match (cmp, &clause.value) {
            (Cmp::Eq, Value::Null) => Cmp::IsNull,
            (Cmp::Ne, Value::Null) => Cmp::IsNotNull,
            (cmp, _) => cmp,
        };

        let field = field_ref(&clause.field);
        let element = element_name(cmp);
        if matches!(cmp, Cmp::IsNull | Cmp::IsNotNull) {
            return Ok(format!("<{element}>{field}</{element}>"));
        }

        let value = typed_value(&clause.value)?.ok_or_else(|| RenderError::UnsupportedValue {
            field: clause.field.clone(),
            cmp,
            reason: "no scalar rendering",
        })?;

        Ok(format!("<{element}>{field}{value}</{element}>"))
    }
}

impl Default for WhereRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_ID_FIELD)
    }
}

const fn element_name(cmp: Cmp) -> &'static str {
    match cmp {
        Cmp::Eq => "Eq",
        Cmp::Ne => "Neq",
        Cmp::Lt => "Lt",
        Cmp::Lte => "Leq",
        Cmp::Gt => "Gt",
        Cmp::Gte => "Geq",
        Cmp::Contains => "Contains",
        Cmp::BeginsWith => "BeginsWith",
        Cmp::IsNull => "IsNull",
        Cmp::IsNotNull => "IsNotNull",
    }
}

///
/// TESTS
///
