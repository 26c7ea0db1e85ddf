//! # Engine Errors
//!
//! Unified error taxonomy for every public operation.
//!
//! Policy:
//! - Coercion and duplicate-check failures are collected and returned as one
//!   aggregated `Validation` error listing every offending field.
//! - `AccessDenied` carries no detail beyond a generic message, to avoid
//!   leaking resource existence.
//! - Ledger-append failures after a successful data write never convert the
//!   operation into a failure; they are logged as a degraded condition.

use serde::Serialize;
use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Per-field validation detail, structured for direct form display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    /// Internal column name (camelCase)
    pub field: String,
    /// Offending value, where safe to echo back
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// Human-readable reason
    pub reason: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, value: Option<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            value,
            reason: reason.into(),
        }
    }

    /// A required column with no usable value.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(field, None, "value is required")
    }
}

impl std::fmt::Display for FieldError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.value {
            Some(v) => write!(f, "field '{}': {} (got '{}')", self.field, self.reason, v),
            None => write!(f, "field '{}': {}", self.field, self.reason),
        }
    }
}

/// Engine errors
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// Bad, missing, or wrong-typed input; carries every offending field
    #[error("validation failed: {}", format_fields(.0))]
    Validation(Vec<FieldError>),

    /// Authorization failure; intentionally generic
    #[error("access denied")]
    AccessDenied,

    /// Table / column / row / module / type absent
    #[error("not found: {0}")]
    NotFound(String),

    /// Duplicate-name or duplicate-value constraint violation
    #[error("conflict: {0}")]
    Conflict(String),

    /// Storage or unexpected failure
    #[error("internal error: {0}")]
    Internal(String),
}

impl EngineError {
    /// Single-field validation failure.
    pub fn validation(err: FieldError) -> Self {
        Self::Validation(vec![err])
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Status category for transport layers.
    pub fn status(&self) -> StatusCategory {
        match self {
            Self::Validation(_) => StatusCategory::ValidationFailed,
            Self::AccessDenied => StatusCategory::AccessDenied,
            Self::NotFound(_) => StatusCategory::NotFound,
            Self::Conflict(_) => StatusCategory::Conflict,
            Self::Internal(_) => StatusCategory::Internal,
        }
    }

    /// The per-field details, when this is a validation failure.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            Self::Validation(errs) => errs,
            _ => &[],
        }
    }
}

fn format_fields(errs: &[FieldError]) -> String {
    errs.iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Status categories produced for transport collaborators.
///
/// Callers map these to their own transport; the numeric codes are the
/// conventional HTTP mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusCategory {
    Ok,
    Created,
    ValidationFailed,
    AccessDenied,
    NotFound,
    Conflict,
    Internal,
}

impl StatusCategory {
    /// Conventional HTTP status code for this category.
    pub fn code(&self) -> u16 {
        match self {
            StatusCategory::Ok => 200,
            StatusCategory::Created => 201,
            StatusCategory::ValidationFailed => 400,
            StatusCategory::AccessDenied => 403,
            StatusCategory::NotFound => 404,
            StatusCategory::Conflict => 409,
            StatusCategory::Internal => 500,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_lists_every_field() {
        let err = EngineError::Validation(vec![
            FieldError::missing("price"),
            FieldError::new("quantity", Some("abc".into()), "not a number"),
        ]);
        let msg = err.to_string();
        assert!(msg.contains("price"));
        assert!(msg.contains("quantity"));
        assert!(msg.contains("abc"));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(EngineError::AccessDenied.status().code(), 403);
        assert_eq!(EngineError::not_found("table").status().code(), 404);
        assert_eq!(EngineError::conflict("dup").status().code(), 409);
        assert_eq!(EngineError::internal("io").status().code(), 500);
        assert_eq!(EngineError::Validation(vec![]).status().code(), 400);
        assert_eq!(StatusCategory::Created.code(), 201);
    }

    #[test]
    fn test_access_denied_is_generic() {
        assert_eq!(EngineError::AccessDenied.to_string(), "access denied");
    }
}
