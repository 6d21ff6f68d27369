use crate::error::RenderError;
use listq_core::value::Value;
use time::format_description::well_known::Rfc3339;

/// Escape text for use in element content or a single-quoted attribute.
#[must_use]
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }

    out
}

pub(crate) fn field_ref(field: &str) -> String {
    format!("<FieldRef Name='{}' />", escape(field))
}

/// `<Value Type='…'>…</Value>` for a scalar. `Null` and lists have no
/// scalar form and yield `Ok(None)`.
pub(crate) fn typed_value(value: &Value) -> Result<Option<String>, RenderError> {
    let (ty, text, extra) = match value {
        Value::Null | Value::List(_) => return Ok(None),
        Value::Bool(b) => ("Boolean", if *b { "1" } else { "0" }.to_string(), ""),
        Value::Int(v) => ("Number", v.to_string(), ""),
        Value::Uint(v) => ("Number", v.to_string(), ""),
        Value::Float(v) => ("Number", v.to_string(), ""),
        Value::Text(s) => ("Text", escape(s), ""),
        Value::Date(d) => ("DateTime", d.format(&Rfc3339)?, " IncludeTimeValue='TRUE'"),
    };

    Ok(Some(format!("<Value Type='{ty}'{extra}>{text}</Value>")))
}

///
/// TESTS
///
