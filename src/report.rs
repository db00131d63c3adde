use crate::issue_kind::IssueKind;
use serde::Serialize;
use serde_json::Value;
use std::fmt;

/// Validation stage an issue was raised in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Query,
    RequestBody,
    ResponseBody,
}

impl Stage {
    pub fn is_request(&self) -> bool {
        matches!(self, Self::Query | Self::RequestBody)
    }

    fn banner(&self) -> &'static str {
        match self {
            Self::Query => "Request query param validation errors...",
            Self::RequestBody => "Found during request validation...",
            Self::ResponseBody => "Found during response validation...",
        }
    }
}

/// One diagnostic, located precisely enough to find the offending field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub stage: Stage,
    pub kind: IssueKind,
    /// Human path such as `.data.items[2]` or a query parameter name
    pub location: String,
    pub message: String,
    /// Sub-schema failures of an `anyOf`/`oneOf`, already rendered
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub details: Vec<String>,
}

impl ValidationIssue {
    pub fn new(
        stage: Stage,
        kind: IssueKind,
        location: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            stage,
            kind,
            location: location.into(),
            message: message.into(),
            details: Vec::new(),
        }
    }

    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.details = details;
        self
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.location.is_empty() {
            writeln!(f, " - {}", self.message)?;
        } else {
            writeln!(f, " - {}: {}", self.location, self.message)?;
        }
        for detail in &self.details {
            writeln!(f, "     > {}", detail)?;
        }
        Ok(())
    }
}

/// Ordered issues of one fixture validation, grouped by stage when rendered
#[derive(Debug, Clone, Serialize)]
pub struct ValidationReport {
    issues: Vec<ValidationIssue>,
    fixture: Value,
}

impl ValidationReport {
    /// `fixture` is echoed back when the report is rendered
    pub fn new(fixture: Value) -> Self {
        Self {
            issues: Vec::new(),
            fixture,
        }
    }

    pub fn push(&mut self, issue: ValidationIssue) {
        self.issues.push(issue);
    }

    pub fn extend(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        self.issues.extend(issues);
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.issues
    }

    pub fn stage(&self, stage: Stage) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(move |issue| issue.stage == stage)
    }

    pub fn request_issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|issue| issue.stage.is_request())
    }

    pub fn response_issues(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.stage(Stage::ResponseBody)
    }

    pub fn fixture(&self) -> &Value {
        &self.fixture
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for stage in [Stage::Query, Stage::RequestBody, Stage::ResponseBody] {
            let mut issues = self.stage(stage).peekable();
            if issues.peek().is_none() {
                continue;
            }
            writeln!(f, "\n{}\n", stage.banner())?;
            for issue in issues {
                write!(f, "{}", issue)?;
            }
        }
        if !self.is_empty() {
            writeln!(f, "\nFixture detail:\n\n{}", self.fixture)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_report() -> ValidationReport {
        let mut report = ValidationReport::new(json!({"path_info": "/a"}));
        report.push(ValidationIssue::new(
            Stage::ResponseBody,
            IssueKind::TypeMismatch,
            ".data",
            "[] is not of type \"object\"",
        ));
        report.push(ValidationIssue::new(
            Stage::Query,
            IssueKind::MissingQueryParameter,
            "",
            "Missing required query param: 'q'",
        ));
        report
    }

    #[test]
    fn renders_stages_in_fixed_order_with_banners() {
        let rendered = sample_report().to_string();
        let query = rendered.find("Request query param validation errors...").unwrap();
        let response = rendered.find("Found during response validation...").unwrap();
        assert!(query < response);
        assert!(!rendered.contains("Found during request validation"));
        assert!(rendered.contains(" - Missing required query param: 'q'\n"));
        assert!(rendered.contains(" - .data: [] is not of type \"object\"\n"));
        assert!(rendered.contains("Fixture detail:"));
    }

    #[test]
    fn splits_request_and_response_issues() {
        let report = sample_report();
        assert_eq!(report.request_issues().count(), 1);
        assert_eq!(report.response_issues().count(), 1);
        assert_eq!(report.len(), 2);
    }

    #[test]
    fn renders_sub_errors_with_marker() {
        let issue = ValidationIssue::new(Stage::RequestBody, IssueKind::AnyOfNoMatch, ".y[0]", "no match")
            .with_details(vec!["Schema path: /anyOf/0/type Error: bad".to_string()]);
        assert_eq!(
            issue.to_string(),
            " - .y[0]: no match\n     > Schema path: /anyOf/0/type Error: bad\n"
        );
    }
}
