//! Demo error types.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DemoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Client error: {0}")]
    Client(#[from] commerce_client::ClientError),
}

pub type DemoResult<T> = Result<T, DemoError>;
