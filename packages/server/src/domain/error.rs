//! Domain error types.

use thiserror::Error;

/// Validation failures of value objects
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueObjectError {
    #[error("Nickname must not be empty")]
    NicknameEmpty,

    #[error("Nickname must be at most {0} characters")]
    NicknameTooLong(usize),

    #[error("Nickname must not contain whitespace or '|'")]
    NicknameInvalidCharacter,

    #[error("Invalid room id '{0}'")]
    RoomIdInvalid(String),

    #[error("Room name must not be empty")]
    RoomNameEmpty,

    #[error("Room name must be at most {0} characters")]
    RoomNameTooLong(usize),

    #[error("Room description must be at most {0} characters")]
    RoomDescriptionTooLong(usize),
}

/// Connection Registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The connection is already registered; entries are never overwritten
    #[error("Connection '{0}' is already registered")]
    DuplicateOrInvalidState(String),

    /// Another live connection is bound to the same nickname
    #[error("User '{0}' is already connected")]
    NicknameInUse(String),
}

/// Persistence store errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    #[error("User '{0}' already exists")]
    UserAlreadyExists(String),

    #[error("Room '{0}' already exists")]
    RoomAlreadyExists(String),

    #[error("Room '{0}' not found")]
    RoomNotFound(String),

    #[error("Storage I/O error: {0}")]
    Io(String),

    #[error("Storage serialization error: {0}")]
    Serialization(String),
}

/// Outbound delivery errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MessagePushError {
    #[error("Client '{0}' not found")]
    ClientNotFound(String),

    #[error("Push failed: {0}")]
    PushFailed(String),
}

/// Message codec errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("Unsupported codec '{0}'")]
    Unsupported(String),

    #[error("Invalid codec key: {0}")]
    InvalidKey(String),

    #[error("Malformed frame: {0}")]
    MalformedFrame(String),
}

/// Session protocol errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    #[error("Invalid format")]
    InvalidFormat,

    #[error("Invalid action")]
    InvalidAction,
}
