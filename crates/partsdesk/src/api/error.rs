//! API client error types.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::FieldError;

/// Errors returned by [`crate::api::ApiClient`] calls.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Structured, field-level rejection of the request.
    #[error("Validation failed: {}", join_fields(.0))]
    Validation(Vec<FieldError>),

    /// The service refused or failed a request.
    #[error("{operation} failed{}: {message}", status_suffix(.status))]
    OperationFailed {
        operation: String,
        status: Option<u16>,
        message: String,
    },

    /// A bulk export could not be retrieved in full.
    #[error("Download of {what} failed: {reason}")]
    DownloadFailed { what: String, reason: String },

    /// Connection, TLS or timeout failure below the HTTP layer.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// A success response whose body did not match the expected shape.
    #[error("Failed to decode {operation} response: {reason}")]
    Decode { operation: String, reason: String },

    #[error("Failed to read upload file '{path}': {source}")]
    ReadUpload {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    ClientBuild(String),
}

fn join_fields(fields: &[FieldError]) -> String {
    fields
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

fn status_suffix(status: &Option<u16>) -> String {
    status.map(|s| format!(" ({})", s)).unwrap_or_default()
}

impl ApiError {
    pub fn operation_failed(operation: &str, status: Option<u16>, message: impl Into<String>) -> Self {
        ApiError::OperationFailed {
            operation: operation.to_string(),
            status,
            message: message.into(),
        }
    }

    /// Field errors when this is a validation failure.
    pub fn field_errors(&self) -> &[FieldError] {
        match self {
            ApiError::Validation(fields) => fields,
            _ => &[],
        }
    }

    /// HTTP status of a rejected request, when the service answered.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Validation(_) => Some(422),
            ApiError::OperationFailed { status, .. } => *status,
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Re-labels a failure of a bulk export as [`ApiError::DownloadFailed`].
    pub(crate) fn into_download_failure(self, what: &str) -> Self {
        match self {
            ApiError::DownloadFailed { .. } => self,
            other => ApiError::DownloadFailed {
                what: what.to_string(),
                reason: other.to_string(),
            },
        }
    }
}
