use jsonschema::error::ValidationErrorKind;
use serde::Serialize;

/// Machine-readable category attached to every reported issue
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueKind {
    TypeMismatch,
    MissingRequired,
    EnumViolation,
    OneOfNoMatch,
    OneOfAmbiguous,
    AnyOfNoMatch,
    UnexpectedProperty,
    ConstraintViolation,
    MissingQueryParameter,
    UndefinedQueryParameter,
    QueryParametersUndeclared,
    UnknownDateFormat,
    InvalidSchema,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TypeMismatch => "TYPE_MISMATCH",
            Self::MissingRequired => "MISSING_REQUIRED",
            Self::EnumViolation => "ENUM_VIOLATION",
            Self::OneOfNoMatch => "ONE_OF_NO_MATCH",
            Self::OneOfAmbiguous => "ONE_OF_AMBIGUOUS",
            Self::AnyOfNoMatch => "ANY_OF_NO_MATCH",
            Self::UnexpectedProperty => "UNEXPECTED_PROPERTY",
            Self::ConstraintViolation => "CONSTRAINT_VIOLATION",
            Self::MissingQueryParameter => "MISSING_QUERY_PARAMETER",
            Self::UndefinedQueryParameter => "UNDEFINED_QUERY_PARAMETER",
            Self::QueryParametersUndeclared => "QUERY_PARAMETERS_UNDECLARED",
            Self::UnknownDateFormat => "UNKNOWN_DATE_FORMAT",
            Self::InvalidSchema => "INVALID_SCHEMA",
        }
    }

    /// Whether this kind carries per-alternative sub-errors
    pub fn is_union_failure(&self) -> bool {
        matches!(self, Self::OneOfNoMatch | Self::AnyOfNoMatch)
    }
}

/// Maps a draft-4 validator error onto an issue category
pub fn classify(kind: &ValidationErrorKind) -> IssueKind {
    match kind {
        ValidationErrorKind::Type { .. } => IssueKind::TypeMismatch,
        ValidationErrorKind::Required { .. } => IssueKind::MissingRequired,
        ValidationErrorKind::Enum { .. } => IssueKind::EnumViolation,
        ValidationErrorKind::OneOfNotValid { .. } => IssueKind::OneOfNoMatch,
        ValidationErrorKind::OneOfMultipleValid { .. } => IssueKind::OneOfAmbiguous,
        ValidationErrorKind::AnyOf { .. } => IssueKind::AnyOfNoMatch,
        ValidationErrorKind::AdditionalProperties { .. } => IssueKind::UnexpectedProperty,
        _ => IssueKind::ConstraintViolation,
    }
}
