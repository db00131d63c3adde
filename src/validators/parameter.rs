use crate::contract::ParameterSchema;
use crate::error::ValidationError;
use crate::issue_kind::IssueKind;
use crate::query::is_wide_integer;
use crate::report::{Stage, ValidationIssue};
use crate::validation_helpers::validate_payload;
use crate::validators::date::{parse_date, DateParse};
use serde_json::{Number, Value};
use std::borrow::Cow;

/// Validates one query or URI parameter value against its declaration.
///
/// Lists are checked element by element against the same schema. A date
/// that fits a known layout but holds impossible values is returned as an
/// error rather than an issue.
pub fn check_parameter(
    name: &str,
    value: &Value,
    schema: &ParameterSchema,
) -> Result<Vec<ValidationIssue>, ValidationError> {
    let mut issues = Vec::new();
    check_into(name, value, schema, &mut issues)?;
    Ok(issues)
}

fn check_into(
    location: &str,
    value: &Value,
    schema: &ParameterSchema,
    issues: &mut Vec<ValidationIssue>,
) -> Result<(), ValidationError> {
    if let Value::Array(items) = value {
        for (idx, item) in items.iter().enumerate() {
            check_into(&format!("{}[{}]", location, idx), item, schema, issues)?;
        }
        return Ok(());
    }

    let prepared = prepare_value(value, schema);
    if schema.is_date() {
        issues.extend(check_date(location, &prepared)?);
        return Ok(());
    }

    issues.extend(validate_payload(Stage::Query, &prepared, &schema.schema, location));
    Ok(())
}

/// Objects go to text; numbers and booleans go to text for string schemas.
/// Integers too wide for 64 bits arrive as text and become numbers again
/// for numeric schemas.
fn prepare_value<'v>(value: &'v Value, schema: &ParameterSchema) -> Cow<'v, Value> {
    match value {
        Value::Object(_) => Cow::Owned(Value::String(value.to_string())),
        Value::Number(n) if schema.is_string() => Cow::Owned(Value::String(n.to_string())),
        Value::Bool(b) if schema.is_string() => Cow::Owned(Value::String(b.to_string())),
        Value::String(text) if schema.is_numeric() && is_wide_integer(text) => text
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map_or(Cow::Borrowed(value), |n| Cow::Owned(Value::Number(n))),
        _ => Cow::Borrowed(value),
    }
}

fn check_date(location: &str, value: &Value) -> Result<Option<ValidationIssue>, ValidationError> {
    let text = match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };

    match parse_date(&text) {
        DateParse::Recognized => Ok(None),
        DateParse::Unrecognized => Ok(Some(ValidationIssue::new(
            Stage::Query,
            IssueKind::UnknownDateFormat,
            location,
            format!("Request query param '{}' does not conform to any known date format.", text),
        ))),
        DateParse::Invalid(reason) => Err(ValidationError::UnparseableDate { value: text, reason }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::parse_query_string;
    use serde_json::json;

    fn param(fragment: Value) -> ParameterSchema {
        ParameterSchema::from(fragment)
    }

    #[test]
    fn numbers_fall_back_to_strings_for_string_schemas() {
        let schema = param(json!({"type": "string", "required": true}));
        assert!(check_parameter("required_param", &json!(1), &schema).unwrap().is_empty());
        assert!(check_parameter("flag", &json!(true), &schema).unwrap().is_empty());
    }

    #[test]
    fn wide_integers_are_checked_digit_for_digit() {
        let digits = param(json!({"type": "string", "pattern": "^[0-9]{30}$"}));
        let query = parse_query_string("token=123456789012345678901234567890");
        assert!(check_parameter("token", &query["token"], &digits).unwrap().is_empty());

        let number = param(json!({"type": "integer"}));
        assert!(check_parameter("token", &query["token"], &number).unwrap().is_empty());
    }

    #[test]
    fn objects_are_validated_as_text() {
        let schema = param(json!({"type": "string"}));
        assert!(check_parameter("filter", &json!({"a": 1}), &schema).unwrap().is_empty());
    }

    #[test]
    fn lists_are_checked_per_element() {
        let schema = param(json!({"type": "number"}));
        assert!(check_parameter("ids", &json!([1, 2, 3, 4, 5]), &schema).unwrap().is_empty());

        let issues = check_parameter("ids", &json!([1, "two", 3, "four"]), &schema).unwrap();
        let locations: Vec<&str> = issues.iter().map(|i| i.location.as_str()).collect();
        assert_eq!(locations, vec!["ids[1]", "ids[3]"]);
        assert!(issues.iter().all(|i| i.kind == IssueKind::TypeMismatch));
    }

    #[test]
    fn scalar_issue_is_located_at_parameter_name() {
        let schema = param(json!({"type": "number"}));
        let issues = check_parameter("optional_param", &json!("not a number"), &schema).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location, "optional_param");
        assert_eq!(issues[0].stage, Stage::Query);
    }

    #[test]
    fn dates_use_the_permissive_parser() {
        let schema = param(json!({"type": "date"}));
        assert!(check_parameter("since", &json!("2016-06-14T13:58:32+00:00"), &schema)
            .unwrap()
            .is_empty());

        let issues = check_parameter("since", &json!(["2016-06-14", "nonsense"]), &schema).unwrap();
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::UnknownDateFormat);
        assert_eq!(issues[0].location, "since[1]");
        assert!(issues[0].message.contains("'nonsense'"));
    }

    #[test]
    fn impossible_dates_propagate() {
        let schema = param(json!({"type": "date"}));
        let err = check_parameter("since", &json!("2016-02-30"), &schema).unwrap_err();
        assert!(matches!(err, ValidationError::UnparseableDate { ref value, .. } if value == "2016-02-30"));
    }

    #[test]
    fn enum_constraints_still_apply() {
        let schema = param(json!({"type": "string", "enum": ["asc", "desc"]}));
        let issues = check_parameter("order", &json!("sideways"), &schema).unwrap();
        assert_eq!(issues[0].kind, IssueKind::EnumViolation);
    }
}
