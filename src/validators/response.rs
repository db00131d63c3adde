use crate::contract::MethodSpec;
use crate::error::ValidationError;
use crate::fixture::ResponsePart;
use crate::report::{Stage, ValidationIssue};
use crate::validation_helpers::{decode_schema, validate_payload};
use serde_json::Value;
use tracing::debug;

/// Validates the response body against the schema declared for its exact status code
pub fn validate_response(
    response: &ResponsePart<'_>,
    spec: &MethodSpec,
    method: &str,
    path: &str,
) -> Result<Vec<ValidationIssue>, ValidationError> {
    let entry = spec
        .response(response.status_code)
        .ok_or_else(|| ValidationError::ResponseNotDefined {
            status_code: response.status_code,
            method: method.to_string(),
            path: path.to_string(),
        })?;

    let Some(raw_schema) = entry.json_body_schema() else {
        debug!(status_code = response.status_code, "no response body schema declared");
        return Ok(Vec::new());
    };

    let mut schema = decode_schema(raw_schema, "response body")?.into_owned();
    relax_required(&mut schema);

    let issues = validate_payload(Stage::ResponseBody, response.body, &schema, "");
    debug!(status_code = response.status_code, issues = issues.len(), "response validated");
    Ok(issues)
}

/// Drops `required` lists from every node of a private schema copy.
///
/// Direct members of a `oneOf` with more than one object-typed alternative
/// keep theirs, so discriminated unions still tell their branches apart.
pub fn relax_required(schema: &mut Value) {
    strip_required(schema, None, false);
}

fn strip_required(node: &mut Value, parent_key: Option<&str>, keep: bool) {
    match node {
        Value::Array(items) => {
            let keep_members = parent_key == Some("oneOf")
                && items.iter().filter(|item| is_object_typed(item)).count() > 1;
            for item in items.iter_mut() {
                strip_required(item, parent_key, keep_members);
            }
        }
        Value::Object(map) => {
            if !keep && map.get("required").is_some_and(Value::is_array) {
                map.remove("required");
            }
            for (key, child) in map.iter_mut() {
                strip_required(child, Some(key.as_str()), false);
            }
        }
        _ => {}
    }
}

fn is_object_typed(schema: &Value) -> bool {
    match schema.get("type") {
        Some(Value::String(kind)) => kind == "object",
        Some(Value::Array(kinds)) => kinds.iter().any(|kind| kind == "object"),
        _ => false,
    }
}
