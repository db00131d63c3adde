use crate::error::ValidationError;
use crate::issue_kind::{classify, IssueKind};
use crate::report::{Stage, ValidationIssue};
use jsonschema::{Draft, Validator};
use serde_json::Value;
use std::borrow::Cow;

/// Builds a draft-4 validator; format assertions stay off
pub fn build_validator(schema: &Value, error_context: &str) -> Result<Validator, ValidationError> {
    jsonschema::options()
        .with_draft(Draft::Draft4)
        .should_validate_formats(false)
        .build(schema)
        .map_err(|e| ValidationError::InvalidSchema {
            context: error_context.to_string(),
            message: e.to_string(),
        })
}

/// Contract body schemas usually arrive as JSON-encoded strings
pub fn decode_schema<'s>(raw: &'s Value, context: &str) -> Result<Cow<'s, Value>, ValidationError> {
    match raw {
        Value::String(text) => serde_json::from_str(text).map(Cow::Owned).map_err(|e| {
            ValidationError::InvalidSchema {
                context: context.to_string(),
                message: format!("schema is not valid JSON: {}", e),
            }
        }),
        other => Ok(Cow::Borrowed(other)),
    }
}

/// One step of an instance location
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum PathSegment {
    Key(String),
    Index(usize),
}

/// One failure of an `anyOf`/`oneOf` alternative
#[derive(Debug, Clone, PartialEq)]
pub struct SubViolation {
    pub schema_path: String,
    pub message: String,
}

/// One violation reported by the draft-4 validator
#[derive(Debug, Clone, PartialEq)]
pub struct Violation {
    pub path: Vec<PathSegment>,
    pub kind: IssueKind,
    pub message: String,
    pub sub_errors: Vec<SubViolation>,
}

impl Violation {
    /// Human location, prefixed with `base` (a parameter name, or empty for bodies)
    pub fn location(&self, base: &str) -> String {
        match (self.path.is_empty(), base.is_empty()) {
            (true, true) => "(root)".to_string(),
            (true, false) => base.to_string(),
            (false, _) => format!("{}{}", base, render_path(&self.path)),
        }
    }

    pub fn into_issue(self, stage: Stage, base: &str) -> ValidationIssue {
        let location = self.location(base);
        let details = self
            .sub_errors
            .into_iter()
            .map(|sub| format!("Schema path: {} Error: {}", sub.schema_path, sub.message))
            .collect();
        ValidationIssue::new(stage, self.kind, location, self.message).with_details(details)
    }
}

/// Collects every violation of `instance` against `schema`.
///
/// Violations are sorted by location; union failures carry the failures of
/// each alternative sorted by schema path.
pub fn collect_violations(instance: &Value, schema: &Value) -> Result<Vec<Violation>, ValidationError> {
    let validator = build_validator(schema, "payload")?;

    let mut violations: Vec<Violation> = validator
        .iter_errors(instance)
        .map(|error| {
            let pointer = error.instance_path.to_string();
            let kind = classify(&error.kind);
            let sub_errors = if kind.is_union_failure() {
                let target = instance.pointer(&pointer).unwrap_or(instance);
                union_sub_errors(schema, &error.schema_path.to_string(), target)
            } else {
                Vec::new()
            };
            Violation {
                path: pointer_segments(instance, &pointer),
                kind,
                message: error.to_string(),
                sub_errors,
            }
        })
        .collect();

    violations.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(violations)
}

/// Validates one instance and turns violations into issues for `stage`.
///
/// A schema that does not compile is reported as a single issue.
pub fn validate_payload(stage: Stage, instance: &Value, schema: &Value, base: &str) -> Vec<ValidationIssue> {
    match collect_violations(instance, schema) {
        Ok(violations) => violations
            .into_iter()
            .map(|violation| violation.into_issue(stage, base))
            .collect(),
        Err(e) => vec![ValidationIssue::new(stage, IssueKind::InvalidSchema, base, e.to_string())],
    }
}

/// Renders issues as one aggregated block of text
pub fn format_issues(issues: &[ValidationIssue]) -> String {
    issues.iter().map(ValidationIssue::to_string).collect()
}

/// Renders `[Key("data"), Index(2)]` as `.data[2]`
pub fn render_path(path: &[PathSegment]) -> String {
    path.iter()
        .map(|segment| match segment {
            PathSegment::Key(key) => format!(".{}", key),
            PathSegment::Index(idx) => format!("[{}]", idx),
        })
        .collect()
}

/// Splits a JSON pointer, using the instance to tell array indexes from keys
fn pointer_segments(instance: &Value, pointer: &str) -> Vec<PathSegment> {
    let mut current = Some(instance);
    pointer_tokens(pointer)
        .map(|token| {
            let segment = match (current, token.parse::<usize>()) {
                (Some(Value::Array(_)), Ok(idx)) => PathSegment::Index(idx),
                _ => PathSegment::Key(token.clone()),
            };
            current = current.and_then(|value| match &segment {
                PathSegment::Index(idx) => value.get(*idx),
                PathSegment::Key(key) => value.get(key.as_str()),
            });
            segment
        })
        .collect()
}

fn pointer_tokens(pointer: &str) -> impl Iterator<Item = String> + '_ {
    pointer
        .split('/')
        .skip(1)
        .map(|token| token.replace("~1", "/").replace("~0", "~"))
}

/// Orders schema paths so that `/anyOf/2` sorts before `/anyOf/10`
fn schema_path_key(pointer: &str) -> Vec<PathSegment> {
    pointer_tokens(pointer)
        .map(|token| match token.parse::<usize>() {
            Ok(idx) => PathSegment::Index(idx),
            Err(_) => PathSegment::Key(token),
        })
        .collect()
}

fn union_sub_errors(root: &Value, schema_path: &str, instance: &Value) -> Vec<SubViolation> {
    // the error may point at the keyword itself or at the schema holding it
    let (schema_path, alternatives) = match schema_at(root, schema_path) {
        Some(Value::Array(alternatives)) => (schema_path.to_string(), alternatives),
        Some(Value::Object(node)) => match ["anyOf", "oneOf"]
            .into_iter()
            .find_map(|keyword| node.get(keyword).and_then(Value::as_array).map(|a| (keyword, a)))
        {
            Some((keyword, alternatives)) => (format!("{}/{}", schema_path, keyword), alternatives),
            None => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    let mut sub_errors = Vec::new();
    for (idx, alternative) in alternatives.iter().enumerate() {
        let alternative = with_root_definitions(root, alternative);
        let validator = match build_validator(&alternative, "union alternative") {
            Ok(validator) => validator,
            Err(e) => {
                sub_errors.push(SubViolation {
                    schema_path: format!("{}/{}", schema_path, idx),
                    message: e.to_string(),
                });
                continue;
            }
        };
        sub_errors.extend(validator.iter_errors(instance).map(|error| SubViolation {
            schema_path: format!("{}/{}{}", schema_path, idx, error.schema_path),
            message: error.to_string(),
        }));
    }

    sub_errors.sort_by_key(|sub| schema_path_key(&sub.schema_path));
    sub_errors
}

/// Walks a schema path, following local `$ref`s whether or not the path
/// names them
fn schema_at<'s>(root: &'s Value, pointer: &str) -> Option<&'s Value> {
    let mut current = root;
    for token in pointer_tokens(pointer) {
        current = match current {
            Value::Object(map) if token == "$ref" => local_ref(root, map.get("$ref")?.as_str()?)?,
            Value::Object(map) => match map.get(&token) {
                Some(child) => child,
                None => follow_refs(root, current)?.get(&token)?,
            },
            Value::Array(items) => items.get(token.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    follow_refs(root, current)
}

/// Resolves chains of `{"$ref": "#/..."}` nodes
fn follow_refs<'s>(root: &'s Value, node: &'s Value) -> Option<&'s Value> {
    let mut current = node;
    for _ in 0..32 {
        match current.get("$ref").and_then(Value::as_str) {
            Some(reference) => current = local_ref(root, reference)?,
            None => return Some(current),
        }
    }
    None
}

fn local_ref<'s>(root: &'s Value, reference: &str) -> Option<&'s Value> {
    match reference.strip_prefix('#')? {
        "" => Some(root),
        pointer => root.pointer(pointer),
    }
}

/// Alternatives validated on their own still need the root's `definitions`
fn with_root_definitions<'a>(root: &Value, alternative: &'a Value) -> Cow<'a, Value> {
    match (root.get("definitions"), alternative) {
        (Some(definitions), Value::Object(map)) if !map.contains_key("definitions") => {
            let mut map = map.clone();
            map.insert("definitions".to_string(), definitions.clone());
            Cow::Owned(Value::Object(map))
        }
        _ => Cow::Borrowed(alternative),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "x": {"type": "string"},
                "y": {
                    "type": "array",
                    "items": {"anyOf": [
                        {"type": "object", "required": ["z"]},
                        {"type": "string"}
                    ]}
                }
            },
            "required": ["x"]
        })
    }

    #[test]
    fn valid_instance_has_no_violations() {
        let violations = collect_violations(&json!({"x": "data", "y": ["a", {"z": 1}]}), &body_schema()).unwrap();
        assert!(violations.is_empty());
    }

    #[test]
    fn single_type_error_is_located_at_its_field() {
        let issues = validate_payload(Stage::RequestBody, &json!({"x": 1}), &body_schema(), "");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].location, ".x");
        assert_eq!(issues[0].kind, IssueKind::TypeMismatch);
    }

    #[test]
    fn union_failures_carry_sorted_sub_errors() {
        let violations = collect_violations(&json!({"x": "ok", "y": [{}, 3, "foo"]}), &body_schema()).unwrap();
        assert_eq!(violations.len(), 2);
        assert_eq!(violations[0].path, vec![PathSegment::Key("y".into()), PathSegment::Index(0)]);
        assert_eq!(violations[1].path, vec![PathSegment::Key("y".into()), PathSegment::Index(1)]);
        for violation in &violations {
            assert_eq!(violation.kind, IssueKind::AnyOfNoMatch);
            assert_eq!(violation.sub_errors.len(), 2);
            assert!(violation.sub_errors[0].schema_path.contains("/anyOf/0"));
            assert!(violation.sub_errors[1].schema_path.contains("/anyOf/1"));
        }

        let text = format_issues(&validate_payload(
            Stage::RequestBody,
            &json!({"x": "ok", "y": [{}, 3]}),
            &body_schema(),
            "",
        ));
        assert!(text.contains(" - .y[0]: "));
        assert!(text.contains("     > Schema path: "));
    }

    #[test]
    fn unions_behind_local_refs_carry_sub_errors() {
        let schema = json!({
            "type": "object",
            "properties": {"a": {"$ref": "#/definitions/u"}},
            "definitions": {"u": {"anyOf": [{"type": "string"}, {"type": "integer"}]}}
        });
        let violations = collect_violations(&json!({"a": 1.5}), &schema).unwrap();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].kind, IssueKind::AnyOfNoMatch);
        assert_eq!(violations[0].location(""), ".a");
        assert_eq!(violations[0].sub_errors.len(), 2);
    }

    #[test]
    fn schema_paths_follow_refs() {
        let schema = json!({
            "properties": {"a": {"$ref": "#/definitions/u"}},
            "definitions": {"u": {"$ref": "#/definitions/v"}, "v": {"oneOf": [{"type": "string"}]}}
        });
        let expected = json!([{"type": "string"}]);
        assert_eq!(schema_at(&schema, "/properties/a/$ref/oneOf"), Some(&expected));
        assert_eq!(schema_at(&schema, "/properties/a/oneOf"), Some(&expected));
        assert!(schema_at(&schema, "/properties/missing").is_none());
    }

    #[test]
    fn violations_are_sorted_by_location() {
        let schema = json!({
            "type": "object",
            "properties": {"b": {"type": "string"}, "a": {"type": "string"}}
        });
        let violations = collect_violations(&json!({"b": 1, "a": 2}), &schema).unwrap();
        let locations: Vec<String> = violations.iter().map(|v| v.location("")).collect();
        assert_eq!(locations, vec![".a", ".b"]);
    }

    #[test]
    fn numeric_object_keys_stay_keys() {
        let schema = json!({"type": "object", "properties": {"0": {"type": "string"}}});
        let violations = collect_violations(&json!({"0": 1}), &schema).unwrap();
        assert_eq!(violations[0].location(""), ".0");
    }

    #[test]
    fn root_violation_uses_base_or_root_marker() {
        let violations = collect_violations(&json!(1), &json!({"type": "string"})).unwrap();
        assert_eq!(violations[0].location(""), "(root)");
        assert_eq!(violations[0].location("page"), "page");
    }

    #[test]
    fn uncompilable_schema_becomes_one_issue() {
        let issues = validate_payload(Stage::Query, &json!(1), &json!({"type": "file"}), "upload");
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::InvalidSchema);
        assert_eq!(issues[0].location, "upload");
    }

    #[test]
    fn decodes_string_schemas_without_touching_objects() {
        let encoded = json!("{\"type\": \"string\"}");
        assert_eq!(decode_schema(&encoded, "body").unwrap().into_owned(), json!({"type": "string"}));

        let inline = json!({"type": "number"});
        assert!(matches!(decode_schema(&inline, "body").unwrap(), Cow::Borrowed(_)));

        let broken = json!("{not json");
        assert!(matches!(
            decode_schema(&broken, "body"),
            Err(ValidationError::InvalidSchema { .. })
        ));
    }
}
