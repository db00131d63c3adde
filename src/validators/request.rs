use crate::contract::MethodSpec;
use crate::error::ValidationError;
use crate::fixture::RequestPart;
use crate::issue_kind::IssueKind;
use crate::query::QueryParams;
use crate::report::{Stage, ValidationIssue};
use crate::validation_helpers::{decode_schema, validate_payload};
use crate::validators::parameter::check_parameter;
use serde_json::Value;
use std::borrow::Cow;
use std::collections::HashSet;
use tracing::debug;

/// Deprecated credential field present in most fixtures but absent from contracts
pub const DEPRECATED_API_KEY: &str = "api_key";

/// Runs the query stage then the body stage
pub fn validate_request(
    request: &RequestPart<'_>,
    spec: &MethodSpec,
) -> Result<Vec<ValidationIssue>, ValidationError> {
    let mut issues = validate_query(&request.query, spec)?;
    if let Some(body) = request.body {
        issues.extend(validate_request_body(body, spec)?);
    }
    debug!(method = %spec.method, issues = issues.len(), "request validated");
    Ok(issues)
}

/// Checks required, declared and undeclared query parameters.
///
/// Each key is reported at most once.
pub fn validate_query(
    query: &QueryParams,
    spec: &MethodSpec,
) -> Result<Vec<ValidationIssue>, ValidationError> {
    let mut pending = query.clone();
    pending.shift_remove(DEPRECATED_API_KEY);
    if pending.is_empty() {
        return Ok(Vec::new());
    }

    let Some(declared) = &spec.query_parameters else {
        return Ok(vec![ValidationIssue::new(
            Stage::Query,
            IssueKind::QueryParametersUndeclared,
            "",
            "`queryParameters` must be defined in specification",
        )]);
    };

    let mut issues = Vec::new();
    let mut reported: HashSet<String> = HashSet::new();

    for (name, schema) in declared.iter().filter(|(_, schema)| schema.required) {
        match pending.shift_remove(name) {
            Some(value) => issues.extend(check_parameter(name, &value, schema)?),
            None => {
                issues.push(ValidationIssue::new(
                    Stage::Query,
                    IssueKind::MissingQueryParameter,
                    "",
                    format!("Missing required query param: '{}'", name),
                ));
            }
        }
        reported.insert(name.clone());
    }

    for (name, value) in &pending {
        if !reported.insert(name.clone()) {
            continue;
        }
        match declared.get(name) {
            Some(schema) => issues.extend(check_parameter(name, value, schema)?),
            None => issues.push(ValidationIssue::new(
                Stage::Query,
                IssueKind::UndefinedQueryParameter,
                "",
                format!("Query parameter '{}' undefined in specification.", name),
            )),
        }
    }

    Ok(issues)
}

/// Validates the body when both a body and a JSON body schema exist
pub fn validate_request_body(
    body: &Value,
    spec: &MethodSpec,
) -> Result<Vec<ValidationIssue>, ValidationError> {
    if is_blank(body) {
        return Ok(Vec::new());
    }
    let Some(raw_schema) = spec.json_body_schema() else {
        return Ok(Vec::new());
    };

    let schema = decode_schema(raw_schema, "request body")?;
    let instance = without_api_key(body);
    Ok(validate_payload(Stage::RequestBody, &instance, &schema, ""))
}

fn is_blank(body: &Value) -> bool {
    match body {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::String(text) => text.is_empty(),
        _ => false,
    }
}

fn without_api_key(body: &Value) -> Cow<'_, Value> {
    match body {
        Value::Object(map) if map.contains_key(DEPRECATED_API_KEY) => {
            let mut copy = map.clone();
            copy.remove(DEPRECATED_API_KEY);
            Cow::Owned(Value::Object(copy))
        }
        _ => Cow::Borrowed(body),
    }
}
