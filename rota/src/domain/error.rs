//! Errors returned by the rota services.
//!
//! Services build these from validation failures and port errors; the
//! terminal adapter prints the message. Nothing here knows about HTTP.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Failure category, stable across adapters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorCode {
    /// Editor or form input failed validation.
    InvalidRequest,
    /// No session, or the backend refused the token.
    Unauthorized,
    /// The employee or shift no longer exists.
    NotFound,
    /// The hosted backend could not be reached.
    ServiceUnavailable,
    /// The backend answered with something we could not use.
    InternalError,
}

impl ErrorCode {
    /// Snake-case name used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::InvalidRequest => "invalid_request",
            Self::Unauthorized => "unauthorized",
            Self::NotFound => "not_found",
            Self::ServiceUnavailable => "service_unavailable",
            Self::InternalError => "internal_error",
        }
    }

    /// Whether repeating the same action later may succeed.
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::ServiceUnavailable)
    }

    fn fallback_message(self) -> &'static str {
        match self {
            Self::InvalidRequest => "The input is not valid.",
            Self::Unauthorized => "Sign in to continue.",
            Self::NotFound => "That record no longer exists.",
            Self::ServiceUnavailable => "The rota service is unavailable.",
            Self::InternalError => "Something went wrong.",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejected by [`DomainError::try_new`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomainErrorValidationError {
    #[error("error message must not be empty")]
    EmptyMessage,
}

/// A service failure: category, manager-facing message, optional context.
///
/// # Examples
/// ```
/// use rota::domain::{DomainError, ErrorCode};
/// use serde_json::json;
///
/// let err = DomainError::invalid_request("Break cannot be negative.")
///     .with_details(json!({ "field": "shift" }));
/// assert_eq!(err.code(), ErrorCode::InvalidRequest);
/// assert_eq!(err.to_string(), "Break cannot be negative.");
/// ```
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{message}")]
pub struct DomainError {
    code: ErrorCode,
    message: String,
    details: Option<Value>,
}

impl DomainError {
    /// Build an error; a blank message is replaced by the category default.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        let message = message.into();
        let message = if message.trim().is_empty() {
            code.fallback_message().to_owned()
        } else {
            message
        };
        Self {
            code,
            message,
            details: None,
        }
    }

    /// Build an error, refusing a blank message.
    pub fn try_new(
        code: ErrorCode,
        message: impl Into<String>,
    ) -> Result<Self, DomainErrorValidationError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(DomainErrorValidationError::EmptyMessage);
        }
        Ok(Self::new(code, message))
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        self.message.as_str()
    }

    /// Structured context such as the field or shift that failed.
    pub fn details(&self) -> Option<&Value> {
        self.details.as_ref()
    }

    /// One entry of the structured context.
    pub fn detail(&self, key: &str) -> Option<&Value> {
        self.details.as_ref().and_then(|details| details.get(key))
    }

    #[must_use]
    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Unauthorized, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ServiceUnavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

#[cfg(test)]
mod tests;
