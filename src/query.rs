use indexmap::IndexMap;
use serde_json::Value;
use url::form_urlencoded;

/// Typed query parameters in first-occurrence order
pub type QueryParams = IndexMap<String, Value>;

/// Parses a raw query string into typed values.
///
/// Blank values are kept. A key given once is coerced on its own; a repeated
/// key becomes a list of coerced occurrences.
pub fn parse_query_string(raw: &str) -> QueryParams {
    let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
    for (key, value) in form_urlencoded::parse(raw.trim_start_matches('?').as_bytes()) {
        grouped
            .entry(key.into_owned())
            .or_default()
            .push(value.into_owned());
    }

    grouped
        .into_iter()
        .map(|(key, values)| {
            let value = match values.as_slice() {
                [single] => coerce_value(single),
                many => Value::Array(many.iter().map(|v| coerce_value(v)).collect()),
            };
            (key, value)
        })
        .collect()
}

/// JSON literal if it parses, otherwise the text itself; comma-separated
/// strings become lists of coerced pieces.
pub fn coerce_value(text: &str) -> Value {
    match parse_literal(text) {
        Value::String(s) if s.contains(',') => {
            Value::Array(s.split(',').map(coerce_value).collect())
        }
        other => other,
    }
}

/// JSON literal if it parses, otherwise the text as a string.
///
/// Integers wider than 64 bits stay as text so no digits are lost.
pub fn parse_literal(text: &str) -> Value {
    if is_wide_integer(text) {
        return Value::String(text.to_string());
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.to_string()))
}

/// An integer literal that fits neither `i64` nor `u64`
pub fn is_wide_integer(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty()
        && digits.bytes().all(|b| b.is_ascii_digit())
        && text.parse::<i64>().is_err()
        && text.parse::<u64>().is_err()
}
