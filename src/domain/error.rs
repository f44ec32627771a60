//! Domain-level errors (no external dependencies)

use thiserror::Error;

use crate::domain::entities::EmployeeId;

/// Domain errors represent business logic violations.
/// These are independent of infrastructure concerns.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("employee not found: {0}")]
    NotFound(EmployeeId),

    #[error("not allowed: {0}")]
    InvariantViolation(String),

    #[error("cycle detected in reporting lines: {0}")]
    CycleDetected(EmployeeId),
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn violation(message: impl Into<String>) -> Self {
        Self::InvariantViolation(message.into())
    }
}

/// Result type for graph operations.
pub type DomainResult<T> = Result<T, DomainError>;
