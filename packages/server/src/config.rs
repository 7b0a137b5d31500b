//! Server configuration, independent of the CLI so tests can build it.

use std::{path::PathBuf, time::Duration};

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_AUTH_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_FRAME_LEN: usize = 8192;

/// Per-connection limits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Deadline for writing one outbound frame
    pub send_timeout: Duration,
    /// Deadline for the whole auth handshake
    pub auth_timeout: Duration,
    /// Longest inbound frame, newline excluded
    pub max_frame_len: usize,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            send_timeout: DEFAULT_SEND_TIMEOUT,
            auth_timeout: DEFAULT_AUTH_TIMEOUT,
            max_frame_len: DEFAULT_MAX_FRAME_LEN,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Admin API port; the API is off when `None`
    pub http_port: Option<u16>,
    /// JSON store path; in-memory store when `None`
    pub data_file: Option<PathBuf>,
    /// Hex key enabling the sealed codec
    pub codec_key: Option<String>,
    pub session: SessionSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            http_port: None,
            data_file: None,
            codec_key: None,
            session: SessionSettings::default(),
        }
    }
}
