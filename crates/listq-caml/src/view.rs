use crate::{
    error::RenderError,
    where_clause::WhereRenderer,
    xml::{escape, field_ref},
};
use listq_core::query::{ListQuery, Projection};

/// Render a complete `<View>` document for `query`.
///
/// The order field doubles as the identifier column: it is always in the
/// field list of a projected view and is the column `Never` filters check.
pub fn render_view(query: &ListQuery) -> Result<String, RenderError> {
    let id_field = query.order.field.as_str();
    let mut out = String::from("<View>");

    match &query.projection {
        Projection::All => {}
        Projection::IdOnly => {
            out.push_str("<ViewFields>");
            out.push_str(&field_ref(id_field));
            out.push_str("</ViewFields>");
        }
        Projection::Fields(fields) => {
            out.push_str("<ViewFields>");
            out.push_str(&field_ref(id_field));
            for field in fields.iter().filter(|f| f.as_str() != id_field) {
                out.push_str(&field_ref(field));
            }
            out.push_str("</ViewFields>");
        }
    }

    out.push_str("<Query>");
    let filter = match &query.filter {
        Some(expr) => WhereRenderer::new(id_field).render(expr)?,
        None => None,
    };
    if let Some(filter) = filter {
        out.push_str("<Where>");
        out.push_str(&filter);
        out.push_str("</Where>");
    }

    let ascending = if query.order.direction.is_ascending() {
        "True"
    } else {
        "False"
    };
    out.push_str(&format!(
        "<OrderBy><FieldRef Name='{}' Ascending='{ascending}' /></OrderBy>",
        escape(id_field)
    ));
    out.push_str("</Query>");

    if let Some(limit) = query.row_limit {
        out.push_str(&format!("<RowLimit>{limit}</RowLimit>"));
    }
    out.push_str("</View>");

    Ok(out)
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use listq_core::{direction::Direction, filter::FilterExpr};

    #[test]
    fn last_row_lookup_view() {
        let query = ListQuery::new("Requests", "ID")
            .direction(Direction::Desc)
            .row_limit(Some(1));

        assert_eq!(
            render_view(&query).expect("render"),
            "<View><Query><OrderBy><FieldRef Name='ID' Ascending='False' /></OrderBy></Query>\
             <RowLimit>1</RowLimit></View>"
        );
    }

    #[test]
    fn window_view_with_projection_and_filter() {
        let filter = FilterExpr::all([FilterExpr::gt("ID", 0_i64), FilterExpr::lte("ID", 5000_i64)]);
        let query = ListQuery::new("Requests", "ID")
            .filter(filter)
            .row_limit(Some(10))
            .projection(Projection::IdOnly);

        assert_eq!(
            render_view(&query).expect("render"),
            "<View><ViewFields><FieldRef Name='ID' /></ViewFields><Query><Where><And>\
             <Gt><FieldRef Name='ID' /><Value Type='Number'>0</Value></Gt>\
             <Leq><FieldRef Name='ID' /><Value Type='Number'>5000</Value></Leq>\
             </And></Where><OrderBy><FieldRef Name='ID' Ascending='True' /></OrderBy></Query>\
             <RowLimit>10</RowLimit></View>"
        );
    }

    #[test]
    fn field_projection_lists_the_id_once() {
        let query = ListQuery::new("Requests", "ID").projection(Projection::fields(["Title", "ID"]));
        let xml = render_view(&query).expect("render");

        assert!(
            xml.starts_with("<View><ViewFields><FieldRef Name='ID' /><FieldRef Name='Title' /></ViewFields>"),
            "unexpected view fields: {xml}"
        );
        assert!(!xml.contains("<RowLimit>"), "no limit requested");
    }

    #[test]
    fn trivially_true_filter_omits_where() {
        let query = ListQuery::new("Requests", "ID").filter(Some(FilterExpr::True));
        assert!(!render_view(&query).expect("render").contains("<Where>"));
    }

    #[test]
    fn render_errors_propagate() {
        let query =
            ListQuery::new("Requests", "ID").filter(Some(FilterExpr::begins_with("Title", "x").not()));
        assert!(render_view(&query).is_err());
    }
}
