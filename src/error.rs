use crate::report::ValidationReport;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Malformed fixture: {0}")]
    MalformedFixture(String),

    #[error("The requested resource '{path}' was not found in spec.")]
    ResourceNotFound { path: String },

    #[error("The requested method '{method}' for '{path}' was not found in spec.")]
    MethodNotFound { method: String, path: String },

    #[error(
        "The status code '{status_code}' for method '{method}' and path '{path}' is not defined by the specification."
    )]
    ResponseNotDefined {
        status_code: u16,
        method: String,
        path: String,
    },

    #[error("{0}")]
    ValidationFailed(Box<ValidationReport>),

    #[error("Failed to parse date '{value}': {reason}")]
    UnparseableDate { value: String, reason: String },

    #[error("Invalid schema for {context}: {message}")]
    InvalidSchema { context: String, message: String },

    #[error("Failed to load contract: {0}")]
    ContractLoad(String),

    #[error("Failed to load whitelist: {0}")]
    WhitelistLoad(String),
}

impl ValidationError {
    /// No contract entry matched the fixture's route
    pub fn is_resolution_failure(&self) -> bool {
        matches!(self, Self::ResourceNotFound { .. } | Self::MethodNotFound { .. })
    }

    pub fn report(&self) -> Option<&ValidationReport> {
        match self {
            Self::ValidationFailed(report) => Some(report),
            _ => None,
        }
    }
}
