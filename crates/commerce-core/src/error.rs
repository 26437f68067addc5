//! Error types for commerce-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
