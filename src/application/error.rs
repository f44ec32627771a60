//! Application-level errors (wraps domain errors)

use thiserror::Error;

use crate::domain::DomainError;

/// Application errors wrap domain errors and add application-level context.
#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("{0}")]
    Domain(#[from] DomainError),

    #[error("no employee matches: {0}")]
    UnknownEmployee(String),

    #[error("ambiguous employee reference: {query} ({matches} matches)")]
    AmbiguousEmployee { query: String, matches: usize },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("persistence failed: {context}: {source}")]
    Persistence {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for application layer operations.
pub type ApplicationResult<T> = Result<T, ApplicationError>;
