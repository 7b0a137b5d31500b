//! Shared helpers for the in-process server tests.
#![allow(dead_code)]

use std::{net::SocketAddr, sync::Arc, time::Duration};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{
        TcpListener, TcpStream,
        tcp::{OwnedReadHalf, OwnedWriteHalf},
    },
    sync::oneshot,
};

use tertulia_server::{
    domain::MessageCodec,
    infrastructure::codec::{CodecCatalog, PlainCodec},
    ui::{AppState, Server},
};

pub const READ_TIMEOUT: Duration = Duration::from_secs(3);

/// Drop ANSI color sequences (`ESC [ ... m`) from a rendered line
pub fn strip_ansi(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\x1b' && chars.peek() == Some(&'[') {
            for next in chars.by_ref() {
                if next == 'm' {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Chat server running on an ephemeral port inside the test runtime
pub struct TestServer {
    pub addr: SocketAddr,
    pub state: Arc<AppState>,
    shutdown: Option<oneshot::Sender<()>>,
}

impl TestServer {
    pub async fn start() -> Self {
        Self::start_with(CodecCatalog::plain_only()).await
    }

    pub async fn start_with(codecs: CodecCatalog) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(AppState::in_memory(codecs));

        let (tx, rx) = oneshot::channel::<()>();
        let server = Server::new(state.clone());
        tokio::spawn(async move {
            let _ = server
                .serve(listener, async {
                    let _ = rx.await;
                })
                .await;
        });

        TestServer {
            addr,
            state,
            shutdown: Some(tx),
        }
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
    }
}

/// Raw TCP client speaking the line protocol
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    codec: Arc<dyn MessageCodec>,
}

impl TestClient {
    pub async fn connect(addr: SocketAddr) -> Self {
        Self::connect_with(addr, Arc::new(PlainCodec)).await
    }

    pub async fn connect_with(addr: SocketAddr, codec: Arc<dyn MessageCodec>) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, writer) = stream.into_split();
        TestClient {
            reader: BufReader::new(read_half),
            writer,
            codec,
        }
    }

    /// Connect, send one auth frame and assert the reply is `OK`
    pub async fn login(addr: SocketAddr, frame: &str) -> Self {
        let mut client = Self::connect(addr).await;
        let reply = client.handshake(frame).await;
        assert_eq!(reply.as_deref(), Some("OK"), "auth frame {frame:?}");
        client
    }

    /// Register `name` with password `pw` and wait for the welcome line
    pub async fn register(addr: SocketAddr, name: &str) -> Self {
        let mut client = Self::login(addr, &format!("REGISTER|{name}|pw")).await;
        client.expect(|line| line.contains("Welcome")).await;
        client
    }

    /// Send the auth frame in the clear and read the raw reply line
    pub async fn handshake(&mut self, frame: &str) -> Option<String> {
        self.send_raw(frame.as_bytes()).await;
        self.read_raw_line().await
    }

    pub fn use_codec(&mut self, codec: Arc<dyn MessageCodec>) {
        self.codec = codec;
    }

    pub async fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).await.unwrap();
        self.writer.write_all(b"\n").await.unwrap();
    }

    /// Encode with the session codec and send one frame
    pub async fn send(&mut self, text: &str) {
        let frame = self.codec.encode(text).unwrap();
        self.send_raw(&frame).await;
    }

    async fn read_raw_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match tokio::time::timeout(READ_TIMEOUT, self.reader.read_line(&mut line)).await {
            Ok(Ok(0)) => None,
            Ok(Ok(_)) => Some(line.trim_end_matches(['\n', '\r']).to_string()),
            Ok(Err(_)) => None,
            Err(_) => panic!("timed out waiting for a line"),
        }
    }

    /// Next decoded line with colors stripped; `None` once the server closes
    pub async fn next_line(&mut self) -> Option<String> {
        let raw = self.read_raw_line().await?;
        let text = self.codec.decode(raw.as_bytes()).unwrap();
        Some(strip_ansi(&text))
    }

    /// Read until a line matches, returning every line read on the way
    pub async fn read_until(&mut self, pred: impl Fn(&str) -> bool) -> Vec<String> {
        let mut seen = Vec::new();
        loop {
            match self.next_line().await {
                Some(line) => {
                    let done = pred(&line);
                    seen.push(line);
                    if done {
                        return seen;
                    }
                }
                None => panic!("connection closed before expected line; saw {seen:?}"),
            }
        }
    }

    /// Read until a line matches and return it
    pub async fn expect(&mut self, pred: impl Fn(&str) -> bool) -> String {
        let mut seen = self.read_until(pred).await;
        seen.pop().unwrap_or_default()
    }

    /// The server closed the connection
    pub async fn expect_closed(&mut self) {
        while let Some(line) = self.read_raw_line().await {
            let _ = line;
        }
    }

    /// Create a room and return its id
    pub async fn create_room(&mut self, name: &str) -> String {
        self.send(&format!("/crear_sala {name}")).await;
        let line = self.expect(|l| l.contains("created with id")).await;
        line.rsplit(' ').next().unwrap().to_string()
    }
}
