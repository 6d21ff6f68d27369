use crate::filter::FilterExpr;

/// Build the keyword-match clause for a search.
///
/// Every keyword must appear in at least one of `fields`: AND over keywords
/// of OR over fields of `Contains(field, keyword)`. Returns `None` when there
/// are no keywords or no fields, so callers add no clause at all.
///
/// Keywords are used as given; case normalization is the caller's job.
#[must_use]
pub fn keyword_filter<K, F>(keywords: &[K], fields: &[F]) -> Option<FilterExpr>
where
    K: AsRef<str>,
    F: AsRef<str>,
{
    if keywords.is_empty() || fields.is_empty() {
        return None;
    }

    let per_keyword = keywords.iter().filter_map(|keyword| {
        FilterExpr::any(
            fields
                .iter()
                .map(|field| FilterExpr::contains(field.as_ref(), keyword.as_ref())),
        )
    });

    FilterExpr::all(per_keyword)
}

///
/// TESTS
///
