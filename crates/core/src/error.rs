use thiserror::Error;

use crate::password::RuleViolation;
use crate::record::RecordKind;

/// Local, pre-submission validation failures. These never reach a store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// Required fields with no value, in schema order.
    #[error("missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<String>),

    /// Two fields that must be equal are not.
    #[error("{field} does not match {other}")]
    Mismatch { field: String, other: String },

    /// The password fails one or more policy rules.
    #[error("password must contain: {}", join_violations(.0))]
    PasswordPolicy(Vec<RuleViolation>),

    /// A cross-field constraint on a single field failed.
    #[error("{field}: {message}")]
    Invalid { field: String, message: String },
}

impl ValidationError {
    /// The field this error should be displayed next to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            ValidationError::MissingFields(_) => None,
            ValidationError::Mismatch { field, .. } => Some(field),
            ValidationError::PasswordPolicy(_) => Some("password"),
            ValidationError::Invalid { field, .. } => Some(field),
        }
    }
}

fn join_violations(violations: &[RuleViolation]) -> String {
    violations
        .iter()
        .map(|v| v.message())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors from editing a draft field by name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldAccessError {
    #[error("unknown field '{field}' for {kind} records")]
    UnknownField { kind: RecordKind, field: String },

    #[error("field '{field}' expects {expected}, got {got}")]
    WrongType {
        field: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("field '{field}' is derived and cannot be edited")]
    Derived { field: String },

    #[error("invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },
}
