//! Session Handler: one task per accepted TCP connection.
//!
//! States: `Authenticating -> Active -> Closed`.
//!
//! - Authenticating: one plain-text `ACTION|username|password[|codec]`
//!   frame, answered with `OK` or an error line. On failure the connection
//!   closes without ever being admitted.
//! - Active: frames are decoded with the negotiated codec and dispatched as
//!   commands or chat. Everything sent to the client goes through the
//!   connection's pusher queue and its writer task.
//! - Closed: the connection is evicted and its departure announced, once.

use std::{io, net::SocketAddr, ops::ControlFlow, sync::Arc, time::Duration};

use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    net::{TcpStream, tcp::OwnedWriteHalf},
    sync::mpsc,
    task::JoinHandle,
};

use crate::{
    domain::{
        AttachOutcome, Audience, AuthRequest, Command, ConnectionId, Envelope, MessageCodec,
        Nickname, RegistryError, RoomId,
        protocol::{AUTH_OK, HELP_TEXT},
    },
    ui::state::AppState,
    usecase::{DepartureReason, EnteredRoom},
};

pub const REPLY_INVALID_FORMAT: &str = "Invalid format";
pub const REPLY_UNSUPPORTED_CODEC: &str = "Unsupported codec";
pub const REPLY_ALREADY_CONNECTED: &str = "User already connected";
pub const REPLY_FRAME_TOO_LONG: &str = "Frame too long";
pub const REPLY_MALFORMED_FRAME: &str = "Malformed frame";

/// One inbound frame
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Frame {
    Line(Vec<u8>),
    /// Longer than the limit; the rest of the line was discarded
    TooLong,
    Eof,
}

/// Read one newline-terminated frame of at most `max_len` bytes.
///
/// The newline and a trailing `\r` are stripped. A final frame without a
/// newline is returned as is.
pub(crate) async fn read_frame<R>(reader: &mut R, max_len: usize) -> io::Result<Frame>
where
    R: AsyncBufRead + Unpin,
{
    let mut buf = Vec::new();
    let limit = u64::try_from(max_len).unwrap_or(u64::MAX).saturating_add(1);
    let read = (&mut *reader).take(limit).read_until(b'\n', &mut buf).await?;
    if read == 0 {
        return Ok(Frame::Eof);
    }

    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
        return Ok(Frame::Line(buf));
    }

    if buf.len() > max_len {
        discard_line(reader).await?;
        return Ok(Frame::TooLong);
    }

    Ok(Frame::Line(buf))
}

async fn discard_line<R>(reader: &mut R) -> io::Result<()>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        let available = reader.fill_buf().await?;
        if available.is_empty() {
            return Ok(());
        }
        match available.iter().position(|b| *b == b'\n') {
            Some(pos) => {
                reader.consume(pos + 1);
                return Ok(());
            }
            None => {
                let len = available.len();
                reader.consume(len);
            }
        }
    }
}

async fn write_line<W>(writer: &mut W, line: &str) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await
}

/// Spawns a task that drains the connection's pusher queue into the socket.
///
/// Each frame is encoded with the connection's codec and written under
/// `send_timeout`. The task ends on the first failed or timed-out write,
/// dropping the receiver so later pushes fail, or when the queue closes.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut writer: OwnedWriteHalf,
    codec: Arc<dyn MessageCodec>,
    send_timeout: Duration,
    connection_id: ConnectionId,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            let mut frame = match codec.encode(&msg) {
                Ok(frame) => frame,
                Err(e) => {
                    tracing::warn!(%connection_id, "Failed to encode frame: {}", e);
                    continue;
                }
            };
            frame.push(b'\n');

            match tokio::time::timeout(send_timeout, writer.write_all(&frame)).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::debug!(%connection_id, "Write failed: {}", e);
                    break;
                }
                Err(_) => {
                    tracing::warn!(%connection_id, "Write timed out after {:?}", send_timeout);
                    break;
                }
            }
        }
        let _ = writer.shutdown().await;
    })
}

/// Credentials checked, connection not yet admitted
struct Credentials {
    nickname: Nickname,
    codec: Arc<dyn MessageCodec>,
}

/// Result of a successful admission
struct Admission {
    nickname: Nickname,
    codec: Arc<dyn MessageCodec>,
    rx: mpsc::UnboundedReceiver<String>,
}

/// Read and verify the auth frame. `Err` carries the reply for a rejected
/// connection; `Ok(None)` means the peer went away first.
///
/// Touches no shared state, so the auth timeout may cancel it anywhere.
async fn authenticate<R>(
    app: &AppState,
    reader: &mut R,
    connection_id: ConnectionId,
) -> Result<Option<Credentials>, String>
where
    R: AsyncBufRead + Unpin,
{
    let line = match read_frame(reader, app.settings.max_frame_len).await {
        Ok(Frame::Line(line)) => line,
        Ok(Frame::TooLong) => return Err(REPLY_INVALID_FORMAT.to_string()),
        Ok(Frame::Eof) => return Ok(None),
        Err(e) => {
            tracing::debug!(%connection_id, "Read failed during auth: {}", e);
            return Ok(None);
        }
    };
    let line = String::from_utf8(line).map_err(|_| REPLY_INVALID_FORMAT.to_string())?;

    let request = AuthRequest::parse(&line).map_err(|e| e.to_string())?;
    let codec = app
        .codecs
        .resolve(request.codec.as_deref())
        .map_err(|_| REPLY_UNSUPPORTED_CODEC.to_string())?;
    let nickname = app.auth.handle(&request).await.map_err(|e| {
        tracing::info!(
            %connection_id,
            username = %request.username,
            action = request.action.as_str(),
            "Authentication rejected: {}",
            e
        );
        e.to_string()
    })?;

    Ok(Some(Credentials { nickname, codec }))
}

/// Register the outbound queue and admit the connection.
///
/// Runs outside the auth timeout: a queue registered here is always either
/// admitted or unregistered again.
async fn admit(
    app: &AppState,
    connection_id: ConnectionId,
    credentials: Credentials,
) -> Result<Admission, String> {
    let Credentials { nickname, codec } = credentials;

    // The queue is registered before admission so no broadcast can target
    // an admitted connection that has no queue yet.
    let (tx, rx) = mpsc::unbounded_channel();
    app.pusher.register_client(connection_id, tx).await;

    let admitted = app
        .state
        .lock()
        .await
        .registry
        .admit(connection_id, nickname.clone());
    if let Err(e) = admitted {
        app.pusher.unregister_client(&connection_id).await;
        tracing::info!(%connection_id, nickname = %nickname, "Admission refused: {}", e);
        return Err(match e {
            RegistryError::NicknameInUse(_) => REPLY_ALREADY_CONNECTED.to_string(),
            RegistryError::DuplicateOrInvalidState(_) => e.to_string(),
        });
    }

    Ok(Admission {
        nickname,
        codec,
        rx,
    })
}

/// Send the rejection reply and close the write side
async fn reject(write_half: &mut OwnedWriteHalf, connection_id: ConnectionId, reply: &str) {
    if let Err(e) = write_line(write_half, reply).await {
        tracing::debug!(%connection_id, "Failed to send auth rejection: {}", e);
    }
    let _ = write_half.shutdown().await;
}

/// Drive one accepted connection to completion
pub async fn handle_connection(app: Arc<AppState>, stream: TcpStream, peer: SocketAddr) {
    let connection_id = ConnectionId::generate();
    tracing::debug!(%connection_id, %peer, "Connection accepted");

    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    // Authenticating
    let handshake = tokio::time::timeout(
        app.settings.auth_timeout,
        authenticate(&app, &mut reader, connection_id),
    )
    .await;
    let credentials = match handshake {
        Ok(Ok(Some(credentials))) => credentials,
        Ok(Ok(None)) => {
            tracing::debug!(%connection_id, "Peer left before authenticating");
            return;
        }
        Ok(Err(reply)) => {
            reject(&mut write_half, connection_id, &reply).await;
            return;
        }
        Err(_) => {
            tracing::info!(%connection_id, %peer, "Authentication timed out");
            return;
        }
    };
    let admission = match admit(&app, connection_id, credentials).await {
        Ok(admission) => admission,
        Err(reply) => {
            reject(&mut write_half, connection_id, &reply).await;
            return;
        }
    };

    if let Err(e) = write_line(&mut write_half, AUTH_OK).await {
        tracing::debug!(%connection_id, "Failed to send auth reply: {}", e);
        app.broadcast
            .depart(&connection_id, DepartureReason::LostConnection)
            .await;
        return;
    }

    let Admission {
        nickname,
        codec,
        rx,
    } = admission;
    tracing::info!(
        %connection_id,
        %peer,
        nickname = %nickname,
        codec = codec.name(),
        "Client admitted"
    );

    let mut writer = pusher_loop(
        rx,
        write_half,
        codec.clone(),
        app.settings.send_timeout,
        connection_id,
    );

    // Active
    let session = Session {
        app: &app,
        connection_id,
        nickname,
        codec,
    };
    session.greet().await;

    let (reason, writer_done) = tokio::select! {
        reason = session.run(&mut reader) => (reason, false),
        _ = &mut writer => (DepartureReason::LostConnection, true),
    };

    // Closed
    session.close(reason).await;
    if !writer_done {
        // the queue is unregistered, so the writer flushes and exits
        if let Err(e) = writer.await {
            tracing::debug!(%connection_id, "Writer task failed: {}", e);
        }
    }
}

struct Session<'a> {
    app: &'a AppState,
    connection_id: ConnectionId,
    nickname: Nickname,
    codec: Arc<dyn MessageCodec>,
}

impl Session<'_> {
    async fn greet(&self) {
        self.app
            .broadcast
            .deliver(&Envelope::system(
                format!("{} joined the chat.", self.nickname),
                Audience::Global { excluding: None },
            ))
            .await;
        self.reply(&format!(
            "Welcome, {}! Type /ayuda for the list of commands.",
            self.nickname
        ))
        .await;
    }

    async fn run<R>(&self, reader: &mut R) -> DepartureReason
    where
        R: AsyncBufRead + Unpin,
    {
        loop {
            let frame = match read_frame(reader, self.app.settings.max_frame_len).await {
                Ok(Frame::Line(frame)) => frame,
                Ok(Frame::TooLong) => {
                    self.reply(REPLY_FRAME_TOO_LONG).await;
                    continue;
                }
                Ok(Frame::Eof) => return DepartureReason::Unexpected,
                Err(e) => {
                    tracing::debug!(connection_id = %self.connection_id, "Read failed: {}", e);
                    return DepartureReason::Unexpected;
                }
            };
            if frame.trim_ascii().is_empty() {
                continue;
            }

            let text = match self.codec.decode(&frame) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!(connection_id = %self.connection_id, "Undecodable frame: {}", e);
                    self.reply(REPLY_MALFORMED_FRAME).await;
                    continue;
                }
            };

            if let ControlFlow::Break(reason) = self.dispatch(Command::parse(&text)).await {
                return reason;
            }
        }
    }

    /// Idempotent: a connection already evicted by a failed broadcast is
    /// not announced again.
    async fn close(&self, reason: DepartureReason) {
        if self
            .app
            .broadcast
            .depart(&self.connection_id, reason)
            .await
            .is_none()
        {
            tracing::debug!(connection_id = %self.connection_id, "Connection was already evicted");
        }
    }

    async fn dispatch(&self, command: Command) -> ControlFlow<DepartureReason> {
        match command {
            Command::Empty => {}
            Command::Quit => return ControlFlow::Break(DepartureReason::Quit),
            Command::Help => self.reply(HELP_TEXT).await,
            Command::ListUsers => self.list_users().await,
            Command::MyRooms => self.my_rooms().await,
            Command::CreateRoom {
                name: Some(name),
                description,
            } => self.create_room(&name, description.as_deref()).await,
            Command::CreateRoom { name: None, .. } => {
                self.reply("Usage: /crear_sala <name> [description]").await
            }
            Command::JoinRoom {
                room_id: Some(room_id),
            } => self.join_room(&room_id).await,
            Command::JoinRoom { room_id: None } => self.reply("Usage: /unirse <room_id>").await,
            Command::DeleteRoom {
                room_id: Some(room_id),
            } => self.delete_room(&room_id).await,
            Command::DeleteRoom { room_id: None } => {
                self.reply("Usage: /eliminar_sala <room_id>").await
            }
            Command::LeaveRoom => self.leave_room().await,
            Command::Chat(text) => self.chat(text).await,
        }
        ControlFlow::Continue(())
    }

    async fn reply(&self, body: &str) {
        self.app
            .broadcast
            .deliver(&Envelope::system(body, Audience::Direct(self.connection_id)))
            .await;
    }

    async fn announce_to_room(&self, room_id: &RoomId, body: String) {
        self.app
            .broadcast
            .deliver(&Envelope::system(
                body,
                Audience::Room {
                    room_id: room_id.clone(),
                    excluding: Some(self.connection_id),
                },
            ))
            .await;
    }

    async fn list_users(&self) {
        let users = self.app.connected_users().await;
        if users.is_empty() {
            self.reply("No users connected").await;
        } else {
            let names: Vec<&str> = users.iter().map(Nickname::as_str).collect();
            self.reply(&format!("Users: {}", names.join(", "))).await;
        }
    }

    async fn my_rooms(&self) {
        let rooms = match self.app.rooms.list_user_rooms(&self.nickname).await {
            Ok(rooms) => rooms,
            Err(e) => return self.reply(&e.to_string()).await,
        };
        if rooms.is_empty() {
            return self.reply("You have no rooms yet.").await;
        }

        let mut lines = vec!["Your rooms:".to_string()];
        for room in rooms {
            let mut line = format!("[{}] {}", room.id, room.name);
            if let Some(description) = &room.description {
                line.push_str(&format!(" - {description}"));
            }
            if room.is_creator {
                line.push_str(" (owner)");
            }
            lines.push(line);
        }
        self.reply(&lines.join("\n")).await;
    }

    async fn create_room(&self, name: &str, description: Option<&str>) {
        let room = match self
            .app
            .rooms
            .create_room(name, &self.nickname, description)
            .await
        {
            Ok(room) => room,
            Err(e) => return self.reply(&e.to_string()).await,
        };

        match self
            .app
            .rooms
            .enter_room(self.connection_id, &self.nickname, room.id.as_str())
            .await
        {
            Ok(entered) => self.announce_entry(&entered).await,
            Err(e) => {
                tracing::warn!(room_id = %room.id, "Created room vanished before entry: {}", e)
            }
        }
        self.reply(&format!("Room '{}' created with id {}", room.name, room.id))
            .await;
    }

    async fn join_room(&self, room_id: &str) {
        let entered = match self
            .app
            .rooms
            .enter_room(self.connection_id, &self.nickname, room_id)
            .await
        {
            Ok(entered) => entered,
            Err(e) => return self.reply(&e.to_string()).await,
        };

        if entered.outcome == AttachOutcome::AlreadyMember {
            return self
                .reply(&format!("You are already in room '{}'.", entered.room.name))
                .await;
        }
        self.announce_entry(&entered).await;
        self.reply(&format!(
            "You joined room '{}' [{}].",
            entered.room.name, entered.room.id
        ))
        .await;
    }

    /// Leave notice to the previous room, arrival notice to the new one
    async fn announce_entry(&self, entered: &EnteredRoom) {
        if let AttachOutcome::Attached {
            previous: Some(previous),
        } = &entered.outcome
        {
            self.announce_to_room(previous, format!("{} left the room.", self.nickname))
                .await;
        }
        if let AttachOutcome::Attached { .. } = entered.outcome {
            self.announce_to_room(
                &entered.room.id,
                format!("{} joined room '{}'.", self.nickname, entered.room.name),
            )
            .await;
        }
    }

    async fn delete_room(&self, room_id: &str) {
        let deleted = match self.app.rooms.delete_room(room_id, &self.nickname).await {
            Ok(deleted) => deleted,
            Err(e) => return self.reply(&e.to_string()).await,
        };

        let notice = format!("Room '{}' was deleted by its owner.", deleted.room.name);
        for member in deleted
            .evicted
            .iter()
            .filter(|id| **id != self.connection_id)
        {
            self.app
                .broadcast
                .deliver(&Envelope::system(notice.clone(), Audience::Direct(*member)))
                .await;
        }
        self.reply(&format!("Room '{}' deleted.", deleted.room.name))
            .await;
    }

    async fn leave_room(&self) {
        match self.app.rooms.leave_room(&self.connection_id).await {
            Some(left) => {
                self.announce_to_room(&left.id, format!("{} left the room.", self.nickname))
                    .await;
                self.reply(&format!("You left room '{}'.", left.name)).await;
            }
            None => self.reply("You are not in a room.").await,
        }
    }

    async fn chat(&self, text: String) {
        let audience = match self.app.rooms.current_room(&self.connection_id).await {
            Some(room_id) => Audience::Room {
                room_id,
                excluding: None,
            },
            None => Audience::Global { excluding: None },
        };
        self.app
            .broadcast
            .deliver(&Envelope::chat(self.nickname.clone(), text, audience))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use tokio::net::TcpListener;

    use crate::infrastructure::codec::CodecCatalog;

    async fn frames(input: &[u8], max_len: usize) -> Vec<Frame> {
        let mut reader = BufReader::with_capacity(4, input);
        let mut frames = Vec::new();
        loop {
            let frame = read_frame(&mut reader, max_len).await.unwrap();
            let done = frame == Frame::Eof;
            frames.push(frame);
            if done {
                return frames;
            }
        }
    }

    #[tokio::test]
    async fn test_read_frame_splits_lines_and_strips_cr() {
        // テスト項目: 改行区切りでフレームが分割され、末尾の \r が除去される
        // given (前提条件):
        let input = b"hola\r\n/lista\n\nfin";

        // when (操作):
        let frames = frames(input, 64).await;

        // then (期待する結果):
        assert_eq!(
            frames,
            vec![
                Frame::Line(b"hola".to_vec()),
                Frame::Line(b"/lista".to_vec()),
                Frame::Line(Vec::new()),
                Frame::Line(b"fin".to_vec()),
                Frame::Eof,
            ]
        );
    }

    #[tokio::test]
    async fn test_read_frame_discards_overlong_line() {
        // テスト項目: 上限を超えるフレームは破棄され、次の行から読み直される
        // given (前提条件):
        let input = b"0123456789abcdef\nok\n";

        // when (操作):
        let frames = frames(input, 8).await;

        // then (期待する結果):
        assert_eq!(
            frames,
            vec![Frame::TooLong, Frame::Line(b"ok".to_vec()), Frame::Eof]
        );
    }

    #[tokio::test]
    async fn test_read_frame_accepts_exact_limit() {
        // テスト項目: 上限ちょうどの長さのフレームは受け付けられる
        // given (前提条件):
        let input = b"12345678\n";

        // when (操作):
        let frames = frames(input, 8).await;

        // then (期待する結果):
        assert_eq!(
            frames,
            vec![Frame::Line(b"12345678".to_vec()), Frame::Eof]
        );
    }

    #[tokio::test]
    async fn test_admission_waiting_on_state_lock_outlives_auth_timeout() {
        // テスト項目: 認証済みの接続は共有状態のロック待ちで認証タイムアウトを過ぎても受け入れられる
        // given (前提条件):
        let mut app = AppState::in_memory(CodecCatalog::plain_only());
        app.settings.auth_timeout = Duration::from_millis(50);
        app.auth.register_user("ana", "pw").await.unwrap();
        let app = Arc::new(app);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server_app = app.clone();
        tokio::spawn(async move {
            let (stream, peer) = listener.accept().await.unwrap();
            handle_connection(server_app, stream, peer).await;
        });

        let guard = app.state.lock().await;
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read_half, mut write_half) = stream.into_split();
        let mut reader = BufReader::new(read_half);

        // when (操作):
        write_half.write_all(b"LOGIN|ana|pw\n").await.unwrap();
        tokio::time::sleep(Duration::from_millis(200)).await;
        drop(guard);

        // then (期待する結果):
        let mut reply = String::new();
        reader.read_line(&mut reply).await.unwrap();
        assert_eq!(reply, "OK\n");
        let users = app.connected_users().await;
        assert_eq!(users, vec![Nickname::new("ana").unwrap()]);

        drop(write_half);
        drop(reader);
        for _ in 0..50 {
            if app.connected_users().await.is_empty() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("connection was not evicted after close");
    }
}
