//! Client execution logic with reconnection support.

use std::{sync::Arc, time::Duration};

use rustyline::{DefaultEditor, error::ReadlineError};
use tokio::sync::mpsc;

use tertulia_server::{domain::MessageCodec, infrastructure::codec::CodecKind};

use crate::{
    domain::{action_for_attempt, should_attempt_reconnect, should_exit_immediately},
    error::ClientError,
    session::run_client_session,
};

const MAX_RECONNECT_ATTEMPTS: u32 = 5;
const RECONNECT_INTERVAL_SECS: u64 = 5;

pub struct ClientOptions {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    /// Register on the first connection instead of logging in
    pub register: bool,
    pub codec_kind: CodecKind,
    pub codec: Arc<dyn MessageCodec>,
}

/// Spawn a blocking thread for rustyline (synchronous readline).
///
/// The thread outlives individual sessions so reconnects keep the same
/// prompt and history. Dropping `input_tx` on Ctrl+C / Ctrl+D ends input.
fn spawn_readline(username: String, input_tx: mpsc::UnboundedSender<String>) {
    std::thread::spawn(move || {
        let mut rl = match DefaultEditor::new() {
            Ok(rl) => rl,
            Err(e) => {
                eprintln!("Failed to initialize readline: {}", e);
                return;
            }
        };

        let prompt = format!("{}> ", username);

        loop {
            match rl.readline(&prompt) {
                Ok(line) => {
                    let line = line.trim();
                    if !line.is_empty() {
                        rl.add_history_entry(line).ok();
                        if input_tx.send(line.to_string()).is_err() {
                            break;
                        }
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    tracing::info!("Interrupted");
                    break;
                }
                Err(ReadlineError::Eof) => {
                    tracing::info!("EOF");
                    break;
                }
                Err(err) => {
                    tracing::error!("Readline error: {}", err);
                    break;
                }
            }
        }
    });
}

/// Run the client, reconnecting with LOGIN after a lost connection
pub async fn run_client(options: ClientOptions) -> Result<(), ClientError> {
    let (input_tx, mut input_rx) = mpsc::unbounded_channel();
    spawn_readline(options.username.clone(), input_tx);

    let mut connections = 0;
    let mut reconnect_count = 0;

    loop {
        tracing::info!(
            "Attempting to connect to {}:{} as '{}' (attempt {}/{})",
            options.host,
            options.port,
            options.username,
            reconnect_count + 1,
            MAX_RECONNECT_ATTEMPTS
        );

        let action = action_for_attempt(options.register, connections);
        connections += 1;

        match run_client_session(&options, action, &mut input_rx).await {
            Ok(end) => {
                tracing::info!("Client session ended: {:?}", end);
                return Ok(());
            }
            Err(e) if should_exit_immediately(&e) => {
                tracing::error!("{}", e);
                return Err(e);
            }
            Err(e) => {
                tracing::warn!("Connection lost: {}", e);
                reconnect_count += 1;

                if !should_attempt_reconnect(&e, reconnect_count, MAX_RECONNECT_ATTEMPTS) {
                    tracing::error!(
                        "Failed to reconnect after {} attempts. Exiting.",
                        MAX_RECONNECT_ATTEMPTS
                    );
                    return Err(e);
                }

                tracing::info!(
                    "Reconnecting in {} seconds... (attempt {}/{})",
                    RECONNECT_INTERVAL_SECS,
                    reconnect_count + 1,
                    MAX_RECONNECT_ATTEMPTS
                );
                tokio::time::sleep(Duration::from_secs(RECONNECT_INTERVAL_SECS)).await;
            }
        }
    }
}
