//! Shared primitives for all Rust crates in Enermina.

#![forbid(unsafe_code)]

/// Authentication primitives shared across services.
pub mod auth;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use auth::UserIdentity;

/// Result type used across Enermina crates.
pub type AppResult<T> = Result<T, AppError>;

/// A validated non-empty UTF-8 string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NonEmptyString(String);

impl NonEmptyString {
    /// Creates a validated non-empty string.
    pub fn new(value: impl Into<String>) -> AppResult<Self> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(AppError::Validation(
                "value must not be empty or whitespace".to_owned(),
            ));
        }

        Ok(Self(value))
    }

    /// Returns the underlying string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl From<NonEmptyString> for String {
    fn from(value: NonEmptyString) -> Self {
        value.0
    }
}

/// Common application error categories.
///
/// Every variant is propagated to the caller as-is. Nothing in the platform
/// turns an error into a fallback record.
#[derive(Debug, Error)]
pub enum AppError {
    /// No access rule grants the operation to the subject.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// The operation is disabled for the entity regardless of subject.
    #[error("operation disabled: {0}")]
    OperationDisabled(String),

    /// Invalid input or violated local invariant.
    #[error("validation error: {0}")]
    Validation(String),

    /// A non-null foreign key does not resolve to a stored record.
    #[error("dangling reference: {0}")]
    DanglingReference(String),

    /// A lifecycle event is not legal from the current state.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// A record with the same identifier already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A guard evaluated against current state failed.
    #[error("precondition failed: {0}")]
    PreconditionFailed(String),

    /// Payload or tag does not match the declared schema.
    #[error("schema violation: {0}")]
    SchemaViolation(String),

    /// Requested record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Caller could not be authenticated at the boundary.
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}
