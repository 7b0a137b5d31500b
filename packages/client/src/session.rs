//! One connection to the chat server: handshake, then relay until the
//! user quits or the connection drops.

use std::sync::Arc;

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
    sync::mpsc,
};

use tertulia_server::domain::{AuthAction, MessageCodec, protocol::AUTH_OK};

use crate::{domain::auth_request, error::ClientError, runner::ClientOptions, ui::print_incoming};

/// How a session ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The user typed `/quit`
    Quit,
    /// Terminal input closed (Ctrl+C / Ctrl+D)
    InputClosed,
}

const QUIT_COMMAND: &str = "/quit";

async fn send_frame(
    writer: &mut tokio::net::tcp::OwnedWriteHalf,
    codec: &dyn MessageCodec,
    line: &str,
) -> Result<(), ClientError> {
    let mut frame = codec.encode(line)?;
    frame.push(b'\n');
    writer.write_all(&frame).await?;
    Ok(())
}

/// Run one client session
pub async fn run_client_session(
    options: &ClientOptions,
    action: AuthAction,
    input_rx: &mut mpsc::UnboundedReceiver<String>,
) -> Result<SessionEnd, ClientError> {
    let addr = format!("{}:{}", options.host, options.port);
    let stream = TcpStream::connect(&addr)
        .await
        .map_err(|e| ClientError::ConnectionError(format!("{addr}: {e}")))?;
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    // Handshake, in the clear
    let request = auth_request(
        action,
        &options.username,
        &options.password,
        options.codec_kind,
    );
    write_half
        .write_all(format!("{}\n", request.to_frame()).as_bytes())
        .await?;

    let mut reply = String::new();
    if reader.read_line(&mut reply).await? == 0 {
        return Err(ClientError::ConnectionError(
            "Server closed the connection during login".to_string(),
        ));
    }
    let reply = reply.trim_end();
    if reply != AUTH_OK {
        return Err(ClientError::AuthRejected(reply.to_string()));
    }

    tracing::info!("Connected to chat server!");
    println!(
        "\nYou are '{}'. Type /ayuda for commands, /quit to exit.\n",
        options.username
    );

    // Spawn a task to handle incoming frames
    let codec: Arc<dyn MessageCodec> = options.codec.clone();
    let username = options.username.clone();
    let read_codec = codec.clone();
    let mut read_task = tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => match read_codec.decode(line.as_bytes()) {
                    Ok(text) => print_incoming(&text, &username),
                    Err(e) => tracing::warn!("Dropped undecodable frame: {}", e),
                },
                Ok(None) => {
                    tracing::info!("Server closed the connection");
                    break;
                }
                Err(e) => {
                    tracing::warn!("Read error: {}", e);
                    break;
                }
            }
        }
    });

    loop {
        tokio::select! {
            _ = &mut read_task => {
                return Err(ClientError::ConnectionError("Connection lost".to_string()));
            }
            line = input_rx.recv() => {
                let Some(line) = line else {
                    // best effort: let the server announce a clean departure
                    let _ = send_frame(&mut write_half, codec.as_ref(), QUIT_COMMAND).await;
                    read_task.abort();
                    return Ok(SessionEnd::InputClosed);
                };

                if let Err(e) = send_frame(&mut write_half, codec.as_ref(), &line).await {
                    read_task.abort();
                    return Err(e);
                }
                if line.trim() == QUIT_COMMAND {
                    read_task.abort();
                    return Ok(SessionEnd::Quit);
                }
            }
        }
    }
}
