use crate::contract::{resolve_method, Contract};
use crate::error::ValidationError;
use crate::fixture::{Fixture, ParsedFixture};
use crate::loader::{load_contract, load_whitelist};
use crate::report::ValidationReport;
use crate::validators::{validate_request, validate_response};
use crate::whitelist::Whitelist;
use std::path::Path;
use tracing::{debug, instrument, warn};

pub const VALID_MESSAGE: &str = "All is well with the world (and your fixture).";

/// Successful outcome of validating one fixture
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Valid,
    /// The route is not in the contract but the whitelist exempts it
    Whitelisted { path: String },
}

impl Verdict {
    pub fn is_exempt(&self) -> bool {
        matches!(self, Self::Whitelisted { .. })
    }

    pub fn message(&self) -> String {
        match self {
            Self::Valid => VALID_MESSAGE.to_string(),
            Self::Whitelisted { path } => {
                format!("Requested endpoint `{}` is whitelisted against validation.", path)
            }
        }
    }
}

/// Resolves and validates fixtures against one immutable contract and whitelist
#[derive(Debug, Clone)]
pub struct ValidationEngine {
    contract: Contract,
    whitelist: Whitelist,
}

impl ValidationEngine {
    pub fn new(contract: Contract, whitelist: Whitelist) -> Self {
        Self { contract, whitelist }
    }

    /// Loads the contract and the optional whitelist from disk
    pub fn from_files(contract: &Path, whitelist: Option<&Path>) -> Result<Self, ValidationError> {
        let contract = load_contract(contract)?;
        let whitelist = match whitelist {
            Some(path) => load_whitelist(path)?,
            None => Whitelist::empty(),
        };
        Ok(Self::new(contract, whitelist))
    }

    pub fn contract(&self) -> &Contract {
        &self.contract
    }

    pub fn whitelist(&self) -> &Whitelist {
        &self.whitelist
    }

    /// Resolve, validate, report.
    ///
    /// Request and response issues are gathered into one report; the whitelist
    /// is consulted only when the route cannot be resolved.
    #[instrument(level = "debug", skip_all, fields(path = ?fixture.path, method = ?fixture.method))]
    pub fn validate(&self, fixture: &Fixture) -> Result<Verdict, ValidationError> {
        let parsed = ParsedFixture::parse(fixture)?;

        let resolution = match resolve_method(&self.contract, parsed.path, parsed.method) {
            Ok(resolution) => resolution,
            Err(e) if e.is_resolution_failure() => {
                if let Some(entry) = self.whitelist.matching_entry(&parsed.route_context()) {
                    warn!(path = parsed.path, pattern = %entry.path, "route exempted by whitelist");
                    return Ok(Verdict::Whitelisted {
                        path: parsed.path.to_string(),
                    });
                }
                return Err(e);
            }
            Err(e) => return Err(e),
        };
        let spec = resolution.method;

        let mut report = ValidationReport::new(serde_json::to_value(fixture).unwrap_or_default());
        if let Some(request) = &parsed.request {
            report.extend(validate_request(request, spec)?);
        }
        if let Some(response) = &parsed.response {
            report.extend(validate_response(response, spec, parsed.method, parsed.path)?);
        }

        if report.is_empty() {
            debug!("fixture conforms to contract");
            Ok(Verdict::Valid)
        } else {
            debug!(issues = report.len(), "fixture violates contract");
            Err(ValidationError::ValidationFailed(Box::new(report)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::whitelist::WhitelistEntry;
    use serde_json::json;

    fn engine() -> ValidationEngine {
        let contract = Contract::from_value(json!({
            "resources": [{
                "relativeUri": "/items",
                "methods": [{
                    "method": "get",
                    "queryParameters": {"page": {"type": "integer"}},
                    "responses": {"200": {"body": {"application/json": {"schema": {"type": "array"}}}}}
                }]
            }]
        }))
        .unwrap();
        let whitelist = Whitelist::new(vec![
            WhitelistEntry::path("/items"),
            WhitelistEntry::path("/legacy/"),
        ])
        .unwrap();
        ValidationEngine::new(contract, whitelist)
    }

    #[test]
    fn resolvable_route_is_validated_even_if_whitelisted() {
        let fixture = Fixture::new("GET", "/items").with_response(200, json!({"not": "an array"}));
        let err = engine().validate(&fixture).unwrap_err();
        assert_eq!(err.report().unwrap().response_issues().count(), 1);
    }

    #[test]
    fn unresolvable_method_can_be_exempt() {
        let fixture = Fixture::new("DELETE", "/items").with_request(json!({"a": 1}));
        assert_eq!(
            engine().validate(&fixture).unwrap(),
            Verdict::Whitelisted { path: "/items".to_string() }
        );
    }

    #[test]
    fn unresolvable_route_without_exemption_is_an_error() {
        let fixture = Fixture::new("GET", "/nowhere").with_request(json!({"a": 1}));
        let err = engine().validate(&fixture).unwrap_err();
        assert!(matches!(err, ValidationError::ResourceNotFound { .. }));
    }

    #[test]
    fn request_and_response_issues_share_one_report() {
        let fixture = Fixture::new("GET", "/items")
            .with_query("page=first")
            .with_response(200, json!({}));
        let err = engine().validate(&fixture).unwrap_err();
        let report = err.report().unwrap();
        assert_eq!(report.request_issues().count(), 1);
        assert_eq!(report.response_issues().count(), 1);
        assert_eq!(report.fixture()["query_string"], json!("page=first"));
    }

    #[test]
    fn engine_is_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ValidationEngine>();
    }

    #[test]
    fn verdict_messages() {
        assert_eq!(Verdict::Valid.message(), VALID_MESSAGE);
        assert!(Verdict::Whitelisted { path: "/x".into() }.message().contains("whitelisted"));
    }
}
