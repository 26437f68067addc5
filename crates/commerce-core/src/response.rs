//! Model-or-error envelope returned by write endpoints.

use serde::{Deserialize, Serialize};

/// Error body returned by the backend on a rejected request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    /// Human-readable error message.
    #[serde(default)]
    pub message: String,
}

/// Result of a write call: either the decoded model or the server's error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceResponse<T> {
    pub model: Option<T>,
    pub error: Option<ErrorResponse>,
    /// HTTP status code of the response.
    pub status: u16,
}

impl<T> ServiceResponse<T> {
    /// Successful response carrying a model.
    pub fn ok(model: T, status: u16) -> Self {
        Self {
            model: Some(model),
            error: None,
            status,
        }
    }

    /// Failed response carrying the server's error message.
    pub fn failed(message: impl Into<String>, status: u16) -> Self {
        Self {
            model: None,
            error: Some(ErrorResponse {
                message: message.into(),
            }),
            status,
        }
    }

    #[must_use]
    pub fn is_success(&self) -> bool {
        self.error.is_none() && (200..300).contains(&self.status)
    }

    /// Error message, if any.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(|e| e.message.as_str())
    }
}
