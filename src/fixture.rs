use crate::error::ValidationError;
use crate::query::{parse_query_string, QueryParams};
use crate::whitelist::RouteContext;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A recorded request/response pair submitted for validation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    #[serde(rename = "path_info", alias = "path", default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(alias = "request_method", default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_string: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<Value>,
    /// Number or numeric string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_code: Option<Value>,
}

impl Fixture {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            method: Some(method.into()),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query_string: impl Into<String>) -> Self {
        self.query_string = Some(query_string.into());
        self
    }

    pub fn with_request(mut self, body: Value) -> Self {
        self.request = Some(body);
        self
    }

    pub fn with_response(mut self, status_code: u16, body: Value) -> Self {
        self.status_code = Some(Value::from(status_code));
        self.response = Some(body);
        self
    }
}

/// Request half of a parsed fixture
#[derive(Debug, Clone)]
pub struct RequestPart<'f> {
    pub body: Option<&'f Value>,
    pub query: QueryParams,
}

/// Response half of a parsed fixture
#[derive(Debug, Clone, Copy)]
pub struct ResponsePart<'f> {
    pub body: &'f Value,
    pub status_code: u16,
}

/// Fixture view that lives for a single validation call
#[derive(Debug, Clone)]
pub struct ParsedFixture<'f> {
    pub path: &'f str,
    pub method: &'f str,
    pub request: Option<RequestPart<'f>>,
    pub response: Option<ResponsePart<'f>>,
}

impl<'f> ParsedFixture<'f> {
    /// Checks the correlation fields and request/response pairing
    pub fn parse(fixture: &'f Fixture) -> Result<Self, ValidationError> {
        let path = non_blank(fixture.path.as_deref());
        let method = non_blank(fixture.method.as_deref());
        let (Some(path), Some(method)) = (path, method) else {
            return Err(malformed("The following fields are required: path_info, method"));
        };

        let query_string = non_blank(fixture.query_string.as_deref());
        if fixture.request.is_none() && fixture.response.is_none() && query_string.is_none() {
            return Err(malformed(
                "One or more of the following fields are required: request, response, query_string",
            ));
        }

        let response = match (&fixture.response, &fixture.status_code) {
            (Some(body), Some(code)) => Some(ResponsePart {
                body,
                status_code: parse_status_code(code)?,
            }),
            (Some(_), None) => {
                return Err(malformed("A `response` must be accompanied by a value in `status_code`."))
            }
            (None, Some(_)) => return Err(malformed("A `response` must not be empty.")),
            (None, None) => None,
        };

        if !path.starts_with('/') {
            return Err(malformed("Path info must begin with `/`."));
        }

        let request = (fixture.request.is_some() || query_string.is_some()).then(|| RequestPart {
            body: fixture.request.as_ref(),
            query: query_string.map(parse_query_string).unwrap_or_default(),
        });

        Ok(Self {
            path,
            method,
            request,
            response,
        })
    }

    /// Route facts the whitelist matches on
    pub fn route_context(&self) -> RouteContext<'f> {
        match self.response {
            Some(response) => RouteContext::Response {
                path: self.path,
                method: self.method,
                status_code: response.status_code,
            },
            None => RouteContext::Request {
                path: self.path,
                method: self.method,
            },
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

fn malformed(message: &str) -> ValidationError {
    ValidationError::MalformedFixture(message.to_string())
}

fn parse_status_code(raw: &Value) -> Result<u16, ValidationError> {
    let code = match raw {
        Value::Number(n) => n.as_u64().and_then(|n| u16::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<u16>().ok(),
        _ => None,
    };
    code.ok_or_else(|| {
        ValidationError::MalformedFixture(format!("`status_code` must be an HTTP status, got {}", raw))
    })
}
