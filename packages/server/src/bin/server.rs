//! Tertulia chat server.
//!
//! Accepts TCP clients, authenticates them and relays chat between the
//! global lobby and rooms.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tertulia-server
//! cargo run --bin tertulia-server -- --host 0.0.0.0 --port 5000 --http-port 8080
//! cargo run --bin tertulia-server -- --data-file tertulia.json --codec-key <64 hex chars>
//! ```

use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Parser;
use tertulia_server::{
    ServerConfig, SessionSettings,
    config::{DEFAULT_AUTH_TIMEOUT, DEFAULT_MAX_FRAME_LEN, DEFAULT_SEND_TIMEOUT},
    ui::{AppState, Server},
};
use tertulia_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tertulia-server")]
#[command(about = "TCP chat server with a lobby and rooms", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number for chat clients
    #[arg(short = 'p', long, default_value = "5000")]
    port: u16,

    /// Port number for the read-only admin API (disabled when omitted)
    #[arg(long)]
    http_port: Option<u16>,

    /// JSON file persisting users and rooms (in-memory when omitted)
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// 64 hex characters enabling the sealed codec
    #[arg(long, env = "TERTULIA_CODEC_KEY", hide_env_values = true)]
    codec_key: Option<String>,

    /// Seconds allowed for writing one frame to a client
    #[arg(long, default_value_t = DEFAULT_SEND_TIMEOUT.as_secs())]
    send_timeout_secs: u64,

    /// Seconds allowed for the auth handshake
    #[arg(long, default_value_t = DEFAULT_AUTH_TIMEOUT.as_secs())]
    auth_timeout_secs: u64,

    /// Longest accepted inbound frame in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_LEN)]
    max_frame_len: usize,
}

impl From<Args> for ServerConfig {
    fn from(args: Args) -> Self {
        Self {
            host: args.host,
            port: args.port,
            http_port: args.http_port,
            data_file: args.data_file,
            codec_key: args.codec_key,
            session: SessionSettings {
                send_timeout: Duration::from_secs(args.send_timeout_secs),
                auth_timeout: Duration::from_secs(args.auth_timeout_secs),
                max_frame_len: args.max_frame_len,
            },
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let config = ServerConfig::from(Args::parse());

    let state = match AppState::from_config(&config).await {
        Ok(state) => Arc::new(state),
        Err(e) => {
            tracing::error!("Failed to initialize server: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!(
        codecs = ?state.codecs.offered(),
        persistent = config.data_file.is_some(),
        "Server initialized"
    );

    if let Err(e) = Server::new(state).run(&config).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
