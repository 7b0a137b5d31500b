//! Error types for the terminal client.

use thiserror::Error;

use tertulia_server::domain::CodecError;

#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered the handshake with something other than `OK`
    #[error("Server rejected login: {0}")]
    AuthRejected(String),

    /// Connection error
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Input error: {0}")]
    Input(String),
}

impl From<std::io::Error> for ClientError {
    fn from(e: std::io::Error) -> Self {
        ClientError::ConnectionError(e.to_string())
    }
}
