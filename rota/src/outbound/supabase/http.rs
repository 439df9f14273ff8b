//! HTTP helpers shared by the Supabase adapters.

use reqwest::StatusCode;

use crate::domain::ports::{EmployeeRepositoryError, ShiftRepositoryError};

/// Collapse a response body into a short single-line preview.
pub(super) fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}

/// Data-API failure before it is narrowed to one repository's error type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum RestFailure {
    Unauthorized(String),
    Connection(String),
    Query(String),
}

impl RestFailure {
    pub(super) fn from_transport(error: &reqwest::Error) -> Self {
        Self::Connection(error.to_string())
    }

    pub(super) fn from_status(status: StatusCode, body: &[u8]) -> Self {
        let preview = body_preview(body);
        let message = if preview.is_empty() {
            format!("status {}", status.as_u16())
        } else {
            format!("status {}: {preview}", status.as_u16())
        };
        match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Self::Unauthorized(message),
            StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => Self::Connection(message),
            _ if status.is_server_error() => Self::Connection(message),
            _ => Self::Query(message),
        }
    }
}

impl From<RestFailure> for EmployeeRepositoryError {
    fn from(value: RestFailure) -> Self {
        match value {
            RestFailure::Unauthorized(message) => Self::unauthorized(message),
            RestFailure::Connection(message) => Self::connection(message),
            RestFailure::Query(message) => Self::query(message),
        }
    }
}

impl From<RestFailure> for ShiftRepositoryError {
    fn from(value: RestFailure) -> Self {
        match value {
            RestFailure::Unauthorized(message) => Self::unauthorized(message),
            RestFailure::Connection(message) => Self::connection(message),
            RestFailure::Query(message) => Self::query(message),
        }
    }
}
