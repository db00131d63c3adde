use crate::error::ValidationError;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One exemption rule as written in the whitelist document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    /// Regular expression matched against the start of the fixture path
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    /// Status code, as a number or a numeric string
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<Value>,
}

impl WhitelistEntry {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            method: None,
            code: None,
        }
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    pub fn with_code(mut self, code: u16) -> Self {
        self.code = Some(Value::from(code));
        self
    }
}

/// What the whitelist knows about the route being validated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteContext<'a> {
    Request {
        path: &'a str,
        method: &'a str,
    },
    Response {
        path: &'a str,
        method: &'a str,
        status_code: u16,
    },
}

impl<'a> RouteContext<'a> {
    pub fn path(&self) -> &'a str {
        match self {
            Self::Request { path, .. } | Self::Response { path, .. } => path,
        }
    }

    pub fn method(&self) -> &'a str {
        match self {
            Self::Request { method, .. } | Self::Response { method, .. } => method,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Request { .. } => None,
            Self::Response { status_code, .. } => Some(*status_code),
        }
    }
}

#[derive(Debug, Clone)]
struct WhitelistRule {
    entry: WhitelistEntry,
    pattern: Regex,
}

impl WhitelistRule {
    fn exempts(&self, context: &RouteContext<'_>) -> bool {
        if !self.pattern.is_match(context.path()) {
            return false;
        }
        match (&self.entry.code, &self.entry.method) {
            (Some(code), method) => context.status_code().is_some_and(|status| {
                code_matches(code, status) && method.as_deref() == Some(context.method())
            }),
            (None, Some(method)) => method == context.method(),
            (None, None) => true,
        }
    }
}

fn code_matches(code: &Value, status: u16) -> bool {
    match code {
        Value::Number(n) => n.as_u64() == Some(u64::from(status)),
        Value::String(s) => s.trim().parse::<u16>().ok() == Some(status),
        _ => false,
    }
}

/// Ordered exemption list, compiled once and never mutated
#[derive(Debug, Clone, Default)]
pub struct Whitelist {
    rules: Vec<WhitelistRule>,
}

impl Whitelist {
    pub fn new(entries: Vec<WhitelistEntry>) -> Result<Self, ValidationError> {
        let rules = entries
            .into_iter()
            .map(|entry| {
                // prefix match: anchored at the start only
                let pattern = Regex::new(&format!("^(?:{})", entry.path)).map_err(|e| {
                    ValidationError::WhitelistLoad(format!("Invalid path pattern '{}': {}", entry.path, e))
                })?;
                Ok(WhitelistRule { entry, pattern })
            })
            .collect::<Result<Vec<_>, ValidationError>>()?;

        Ok(Self { rules })
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Parses a whitelist from a JSON array of entries
    pub fn from_value(document: Value) -> Result<Self, ValidationError> {
        let entries: Vec<WhitelistEntry> = serde_json::from_value(document).map_err(|e| {
            ValidationError::WhitelistLoad(format!("Failed to parse whitelist document: {}", e))
        })?;
        Self::new(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// First entry exempting `context`, if any
    pub fn matching_entry(&self, context: &RouteContext<'_>) -> Option<&WhitelistEntry> {
        self.rules
            .iter()
            .find(|rule| rule.exempts(context))
            .map(|rule| &rule.entry)
    }
}

pub fn is_whitelisted(whitelist: &Whitelist, context: &RouteContext<'_>) -> bool {
    whitelist.matching_entry(context).is_some()
}
