use crate::contract::model::{Contract, ContractResource, MethodSpec, ParameterSchema};
use crate::error::ValidationError;
use crate::query::parse_literal;
use crate::validators::check_parameter;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

/// The contract entry matched by a (path, method) pair
#[derive(Debug)]
pub struct Resolution<'c> {
    pub resource: &'c ContractResource,
    pub method: &'c MethodSpec,
    /// Values bound to `{name}` template segments along the way
    pub uri_parameters: IndexMap<String, Value>,
}

/// Walks the resource tree to find the method spec for `path` and `method`
pub fn resolve_method<'c>(
    contract: &'c Contract,
    path: &str,
    method: &str,
) -> Result<Resolution<'c>, ValidationError> {
    let segments = split_segments(path);
    let mut uri_parameters = IndexMap::new();

    let resource = find_resource(&contract.resources, &segments, &mut uri_parameters)
        .ok_or_else(|| ValidationError::ResourceNotFound {
            path: path.to_string(),
        })?;

    let spec = resource
        .method(method)
        .ok_or_else(|| ValidationError::MethodNotFound {
            method: method.to_lowercase(),
            path: path.to_string(),
        })?;

    debug!(
        path,
        method = %spec.method,
        bound = uri_parameters.len(),
        "resolved contract method"
    );

    Ok(Resolution {
        resource,
        method: spec,
        uri_parameters,
    })
}

/// Splits a path into segments that each begin with `/`.
///
/// `/api/v5/test/` becomes `["/api", "/v5", "/test", "/"]`.
pub fn split_segments(path: &str) -> Vec<&str> {
    let starts: Vec<usize> = path.match_indices('/').map(|(idx, _)| idx).collect();
    starts
        .iter()
        .enumerate()
        .map(|(n, &start)| {
            let end = starts.get(n + 1).copied().unwrap_or(path.len());
            &path[start..end]
        })
        .collect()
}

/// First candidate whose template prefix matches wins; no backtracking once
/// a candidate has consumed segments.
fn find_resource<'c>(
    candidates: &'c [ContractResource],
    remaining: &[&str],
    bound: &mut IndexMap<String, Value>,
) -> Option<&'c ContractResource> {
    for resource in candidates {
        let template = split_segments(&resource.relative_uri);
        if remaining.len() < template.len() {
            continue;
        }
        let Some(parameters) = match_template(resource, &template, remaining) else {
            continue;
        };
        bound.extend(parameters);

        let rest = &remaining[template.len()..];
        if rest.is_empty() {
            return Some(resource);
        }
        return find_resource(&resource.resources, rest, bound);
    }
    None
}

fn match_template(
    resource: &ContractResource,
    template: &[&str],
    incoming: &[&str],
) -> Option<Vec<(String, Value)>> {
    let mut parameters = Vec::new();

    for (pattern, segment) in template.iter().zip(incoming) {
        if pattern == segment {
            continue;
        }
        let name = template_parameter(pattern)?;
        let raw = segment.trim_start_matches('/');
        let schema = resource.uri_parameters.get(name);
        let value = segment_value(raw, schema);

        if let Some(schema) = schema {
            let accepted = matches!(
                check_parameter(name, &value, schema),
                Ok(issues) if issues.is_empty()
            );
            if !accepted {
                debug!(parameter = name, value = raw, "uri parameter rejected candidate");
                return None;
            }
        }
        parameters.push((name.to_string(), value));
    }

    Some(parameters)
}

/// Segments bind as text; numeric and boolean parameters get typed values
/// when the text spells one.
fn segment_value(raw: &str, schema: Option<&ParameterSchema>) -> Value {
    let typed = match schema {
        Some(schema) if schema.is_numeric() => Some(parse_literal(raw)).filter(Value::is_number),
        Some(schema) if schema.is_boolean() => Some(parse_literal(raw)).filter(Value::is_boolean),
        _ => None,
    };
    typed.unwrap_or_else(|| Value::String(raw.to_string()))
}

/// `"/{id}"` yields `"id"`; literal segments yield `None`
fn template_parameter(pattern: &str) -> Option<&str> {
    let open = pattern.find('{')?;
    let close = pattern.rfind('}')?;
    (close > open).then(|| &pattern[open + 1..close])
}
