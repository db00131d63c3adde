pub mod contract;
pub mod engine;
pub mod error;
pub mod fixture;
pub mod issue_kind;
pub mod loader;
pub mod query;
pub mod report;
pub mod validation_helpers;
pub mod validators;
pub mod whitelist;

pub use contract::{resolve_method, Contract, ContractResource, MethodSpec, ParameterSchema, Resolution, ResponseSpec};
pub use engine::{ValidationEngine, Verdict, VALID_MESSAGE};
pub use error::ValidationError;
pub use fixture::{Fixture, ParsedFixture};
pub use issue_kind::IssueKind;
pub use loader::{load_contract, load_fixtures, load_whitelist};
pub use query::{parse_query_string, QueryParams};
pub use report::{Stage, ValidationIssue, ValidationReport};
pub use validation_helpers::{build_validator, collect_violations, format_issues, validate_payload};
pub use whitelist::{is_whitelisted, RouteContext, Whitelist, WhitelistEntry};
