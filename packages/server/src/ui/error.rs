//! UI layer error types.

use thiserror::Error;

use crate::domain::{CodecError, RepositoryError};

/// Fatal startup errors
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Store error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl From<CodecError> for ServerError {
    fn from(e: CodecError) -> Self {
        ServerError::Config(e.to_string())
    }
}
