//! Tertulia terminal chat client.
//!
//! Logs in (or registers) over TCP, then sends each input line as a chat
//! message or command. Lost connections are retried with LOGIN up to 5
//! times, 5 seconds apart; a rejected login exits immediately.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tertulia-client -- --username alice --register
//! cargo run --bin tertulia-client -- -u bob --codec sealed --codec-key <64 hex chars>
//! ```

use clap::Parser;
use tertulia_client::{ClientOptions, error::ClientError, run_client, ui::read_password};
use tertulia_server::infrastructure::codec::{CodecCatalog, CodecKind, parse_codec_key};
use tertulia_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tertulia-client")]
#[command(about = "Terminal client for the Tertulia chat server", long_about = None)]
struct Args {
    /// Server host
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(short = 'p', long, default_value = "5000")]
    port: u16,

    /// Username, also shown as your nickname
    #[arg(short = 'u', long)]
    username: String,

    /// Create the account instead of logging in
    #[arg(long)]
    register: bool,

    /// Password; prompted for with masked input when omitted
    #[arg(long, env = "TERTULIA_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Frame codec: plain or sealed
    #[arg(long, default_value = "plain")]
    codec: CodecKind,

    /// 64 hex characters, required for the sealed codec
    #[arg(long, env = "TERTULIA_CODEC_KEY", hide_env_values = true)]
    codec_key: Option<String>,
}

fn build_options(args: Args) -> Result<ClientOptions, ClientError> {
    let key = args
        .codec_key
        .as_deref()
        .map(parse_codec_key)
        .transpose()?;
    let codec = CodecCatalog::new(key).resolve(Some(args.codec.as_str()))?;
    let password = match args.password {
        Some(password) => password,
        None => read_password("Password: ")?,
    };

    Ok(ClientOptions {
        host: args.host,
        port: args.port,
        username: args.username,
        password,
        register: args.register,
        codec_kind: args.codec,
        codec,
    })
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let options = match build_options(Args::parse()) {
        Ok(options) => options,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };

    // Run the client
    if let Err(e) = run_client(options).await {
        tracing::error!("Client error: {}", e);
        std::process::exit(1);
    }
}
