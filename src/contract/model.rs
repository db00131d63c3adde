use crate::error::ValidationError;
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Root of the contract tree, as emitted by the RAML-to-JSON converter
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub version: Option<Value>,
    #[serde(default)]
    pub base_uri: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resources: Vec<ContractResource>,
}

impl Contract {
    /// Builds the typed tree from an already-parsed JSON document
    pub fn from_value(document: Value) -> Result<Self, ValidationError> {
        serde_json::from_value(document).map_err(|e| {
            ValidationError::ContractLoad(format!("Failed to parse contract document: {}", e))
        })
    }

    /// Total number of resources in the tree
    pub fn resource_count(&self) -> usize {
        fn count(resources: &[ContractResource]) -> usize {
            resources.iter().map(|r| 1 + count(&r.resources)).sum()
        }
        count(&self.resources)
    }
}

/// One node of the resource tree
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractResource {
    #[serde(default)]
    pub relative_uri: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub resources: Vec<ContractResource>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub methods: Vec<MethodSpec>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub uri_parameters: IndexMap<String, ParameterSchema>,
}

impl ContractResource {
    /// Case-insensitive lookup of a declared method
    pub fn method(&self, name: &str) -> Option<&MethodSpec> {
        self.methods
            .iter()
            .find(|spec| spec.method.eq_ignore_ascii_case(name))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodSpec {
    pub method: String,
    /// `None` when the contract declares no `queryParameters` block at all
    #[serde(default)]
    pub query_parameters: Option<IndexMap<String, ParameterSchema>>,
    #[serde(default, deserialize_with = "nullable_values")]
    pub body: IndexMap<String, BodySpec>,
    #[serde(default, deserialize_with = "nullable_values")]
    pub responses: IndexMap<String, ResponseSpec>,
}

impl MethodSpec {
    pub fn json_body_schema(&self) -> Option<&Value> {
        json_schema(&self.body)
    }

    pub fn response(&self, status_code: u16) -> Option<&ResponseSpec> {
        self.responses.get(&status_code.to_string())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BodySpec {
    /// Either an inline schema object or a JSON-encoded schema string
    #[serde(default)]
    pub schema: Option<Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ResponseSpec {
    #[serde(default, deserialize_with = "nullable_values")]
    pub body: IndexMap<String, BodySpec>,
}

impl ResponseSpec {
    pub fn json_body_schema(&self) -> Option<&Value> {
        json_schema(&self.body)
    }
}

/// A query or URI parameter declaration.
///
/// The contract's `required` marker is lifted out of the fragment on load, so
/// `schema` can go straight to a draft-4 validator.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "Value")]
pub struct ParameterSchema {
    pub param_type: Option<String>,
    pub required: bool,
    pub schema: Value,
}

impl ParameterSchema {
    pub fn is_date(&self) -> bool {
        self.param_type.as_deref() == Some("date")
    }

    pub fn is_string(&self) -> bool {
        self.param_type.as_deref() == Some("string")
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.param_type.as_deref(), Some("number" | "integer"))
    }

    pub fn is_boolean(&self) -> bool {
        self.param_type.as_deref() == Some("boolean")
    }
}

impl From<Value> for ParameterSchema {
    fn from(raw: Value) -> Self {
        let mut fragment = match raw {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        let required = matches!(fragment.remove("required"), Some(Value::Bool(true)));
        let param_type = fragment
            .get("type")
            .and_then(Value::as_str)
            .map(str::to_owned);

        Self {
            param_type,
            required,
            schema: Value::Object(fragment),
        }
    }
}

fn json_schema(body: &IndexMap<String, BodySpec>) -> Option<&Value> {
    body.get(JSON_MEDIA_TYPE)
        .and_then(|media| media.schema.as_ref())
        .filter(|schema| match schema {
            Value::Null => false,
            Value::String(text) => !text.trim().is_empty(),
            _ => true,
        })
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn nullable_values<'de, D, T>(deserializer: D) -> Result<IndexMap<String, T>, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    let raw: Option<IndexMap<String, Option<T>>> = Option::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| (key, value.unwrap_or_default()))
        .collect())
}
