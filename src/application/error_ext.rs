//! Error conversion helpers for backend calls
//!
//! Provides extension traits for cleaner error handling with operation context.

use std::io;

use crate::application::{ApplicationError, ApplicationResult};

/// Extension trait for converting `io::Result` to `ApplicationResult` with context.
pub trait PersistResultExt<T> {
    /// Name the operation that failed against the backend.
    ///
    /// # Example
    /// ```ignore
    /// repo.fetch_all(owner)
    ///     .persist_context("fetch records", owner)?;
    /// ```
    fn persist_context(self, action: &str, subject: &str) -> ApplicationResult<T>;
}

impl<T> PersistResultExt<T> for io::Result<T> {
    fn persist_context(self, action: &str, subject: &str) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::Persistence {
            context: format!("{}: {}", action, subject),
            source: e,
        })
    }
}
