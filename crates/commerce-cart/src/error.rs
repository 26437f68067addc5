//! Cart submission error types.

use thiserror::Error;

/// Errors that `CartLineSubmitter::submit` can return.
///
/// Transport failures never appear here; they are reported to the
/// tracking sink and surface as `SubmissionOutcome::Failed`. Lines are not
/// validated locally: a line the backend refuses fails like any other
/// request.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("Add-to-cart request already in flight: {0}")]
    DuplicateRequest(String),
}

pub type SubmitResult<T> = Result<T, SubmitError>;

/// Errors produced by a `CartTransport`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("Request canceled")]
    Canceled,
}

impl TransportError {
    /// Short label for metrics and logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Http(_) => "http",
            Self::Rejected { .. } => "rejected",
            Self::Decode(_) => "decode",
            Self::Canceled => "canceled",
        }
    }

    #[must_use]
    pub fn is_canceled(&self) -> bool {
        matches!(self, Self::Canceled)
    }
}

pub type TransportResult<T> = Result<T, TransportError>;
