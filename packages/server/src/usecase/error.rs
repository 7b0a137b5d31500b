//! UseCase layer error types.

use thiserror::Error;

use crate::domain::RepositoryError;

/// Auth Gateway errors. The `Display` text is the reply sent to the client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("User already exists")]
    UserAlreadyExists,

    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Internal error")]
    Repository(#[from] RepositoryError),
}

/// Room Directory errors. The `Display` text is the private reply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomDirectoryError {
    #[error("User '{0}' not found")]
    CreatorNotFound(String),

    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    #[error("Only the creator can delete room '{0}'")]
    NotCreator(String),

    #[error("Could not allocate a room id, try again")]
    RoomIdExhausted,

    #[error("{0}")]
    InvalidInput(String),

    #[error("Internal error")]
    Repository(#[from] RepositoryError),
}
