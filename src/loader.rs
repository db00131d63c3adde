use crate::contract::Contract;
use crate::error::ValidationError;
use crate::fixture::Fixture;
use crate::whitelist::{Whitelist, WhitelistEntry};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

/// Loads a contract document (JSON, or YAML for `.yaml`/`.yml` files)
pub fn load_contract(path: &Path) -> Result<Contract, ValidationError> {
    let contract: Contract = read_document(path).map_err(ValidationError::ContractLoad)?;
    info!(
        path = %path.display(),
        title = contract.title.as_deref().unwrap_or("untitled"),
        resources = contract.resource_count(),
        "loaded contract"
    );
    Ok(contract)
}

/// Loads an ordered whitelist and compiles its path patterns
pub fn load_whitelist(path: &Path) -> Result<Whitelist, ValidationError> {
    let entries: Vec<WhitelistEntry> = read_document(path).map_err(ValidationError::WhitelistLoad)?;
    let whitelist = Whitelist::new(entries)?;
    info!(path = %path.display(), entries = whitelist.len(), "loaded whitelist");
    Ok(whitelist)
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FixtureDocument {
    Many(Vec<Fixture>),
    One(Fixture),
}

/// Loads a file holding one fixture object or an array of them
pub fn load_fixtures(path: &Path) -> Result<Vec<Fixture>, ValidationError> {
    let document: FixtureDocument = read_document(path).map_err(ValidationError::MalformedFixture)?;
    Ok(match document {
        FixtureDocument::Many(fixtures) => fixtures,
        FixtureDocument::One(fixture) => vec![fixture],
    })
}

fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, String> {
    let file = File::open(path).map_err(|e| format!("Failed to open {}: {}", path.display(), e))?;

    let is_yaml = matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml" | "yml")
    );
    if is_yaml {
        serde_yaml::from_reader(file).map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
    } else {
        serde_json::from_reader(BufReader::new(file))
            .map_err(|e| format!("Failed to parse {}: {}", path.display(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::whitelist::RouteContext;
    use std::io::Write;
    use tempfile::Builder;

    fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_json_contract() {
        let file = write_temp(
            ".json",
            r#"{"title": "Test API", "resources": [{"relativeUri": "/a", "methods": [{"method": "get"}]}]}"#,
        );
        let contract = load_contract(file.path()).unwrap();
        assert_eq!(contract.title.as_deref(), Some("Test API"));
        assert_eq!(contract.resources[0].methods[0].method, "get");
    }

    #[test]
    fn loads_yaml_contract() {
        let file = write_temp(
            ".yaml",
            "title: Test API\nresources:\n  - relativeUri: /a\n    methods:\n      - method: get\n        queryParameters:\n          page:\n            type: integer\n            required: true\n",
        );
        let contract = load_contract(file.path()).unwrap();
        let page = &contract.resources[0].methods[0].query_parameters.as_ref().unwrap()["page"];
        assert!(page.required);
        assert_eq!(page.param_type.as_deref(), Some("integer"));
    }

    #[test]
    fn reports_unreadable_and_unparseable_files() {
        let missing = load_contract(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(missing, ValidationError::ContractLoad(_)));

        let garbage = write_temp(".json", "{not json");
        assert!(matches!(load_contract(garbage.path()), Err(ValidationError::ContractLoad(_))));
    }

    #[test]
    fn loads_whitelist_in_order() {
        let file = write_temp(".json", r#"[{"path": "/a/"}, {"path": "/b/", "method": "GET", "code": 200}]"#);
        let whitelist = load_whitelist(file.path()).unwrap();
        assert_eq!(whitelist.len(), 2);
        let context = RouteContext::Response { path: "/b/c", method: "GET", status_code: 200 };
        assert_eq!(whitelist.matching_entry(&context).unwrap().path, "/b/");
    }

    #[test]
    fn loads_single_and_multiple_fixtures() {
        let one = write_temp(".json", r#"{"path_info": "/a", "method": "GET", "request": {}}"#);
        assert_eq!(load_fixtures(one.path()).unwrap().len(), 1);

        let many = write_temp(
            ".json",
            r#"[{"path_info": "/a", "method": "GET"}, {"path": "/b", "request_method": "POST"}]"#,
        );
        let fixtures = load_fixtures(many.path()).unwrap();
        assert_eq!(fixtures[1].path.as_deref(), Some("/b"));
        assert_eq!(fixtures[1].method.as_deref(), Some("POST"));
    }
}
