//! Session protocol: the auth handshake frame and post-auth commands.

use super::error::ProtocolError;

/// Field separator of the auth frame
pub const AUTH_FIELD_SEPARATOR: char = '|';

/// Reply token for a successful handshake
pub const AUTH_OK: &str = "OK";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthAction {
    Login,
    Register,
}

impl AuthAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthAction::Login => "LOGIN",
            AuthAction::Register => "REGISTER",
        }
    }
}

/// Parsed `ACTION|username|password[|codec]` frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthRequest {
    pub action: AuthAction,
    pub username: String,
    pub password: String,
    /// Codec requested for the rest of the session; `None` means plain
    pub codec: Option<String>,
}

impl AuthRequest {
    /// Parse the first frame of a connection.
    ///
    /// Field count is checked before the action, so a frame with the wrong
    /// number of fields is `InvalidFormat` even if its action is unknown.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        let fields: Vec<&str> = frame.trim().split(AUTH_FIELD_SEPARATOR).collect();

        let (action, username, password, codec) = match fields.as_slice() {
            [action, username, password] => (*action, *username, *password, None),
            [action, username, password, codec] => {
                (*action, *username, *password, Some(codec.trim().to_string()))
            }
            _ => return Err(ProtocolError::InvalidFormat),
        };

        let action = match action.trim() {
            "LOGIN" => AuthAction::Login,
            "REGISTER" => AuthAction::Register,
            _ => return Err(ProtocolError::InvalidAction),
        };

        Ok(Self {
            action,
            username: username.to_string(),
            password: password.to_string(),
            codec: codec.filter(|c| !c.is_empty()),
        })
    }

    /// Render the frame a client sends
    pub fn to_frame(&self) -> String {
        let mut frame = format!(
            "{}{sep}{}{sep}{}",
            self.action.as_str(),
            self.username,
            self.password,
            sep = AUTH_FIELD_SEPARATOR
        );
        if let Some(codec) = &self.codec {
            frame.push(AUTH_FIELD_SEPARATOR);
            frame.push_str(codec);
        }
        frame
    }
}

/// A post-auth frame, classified
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/crear_sala <name> [description]`
    CreateRoom {
        name: Option<String>,
        description: Option<String>,
    },
    /// `/unirse <roomId>`
    JoinRoom { room_id: Option<String> },
    /// `/mis_salas`
    MyRooms,
    /// `/eliminar_sala <roomId>`
    DeleteRoom { room_id: Option<String> },
    /// `/salir_sala`
    LeaveRoom,
    /// `/lista`
    ListUsers,
    /// `/ayuda`
    Help,
    /// `/quit`
    Quit,
    /// Anything else
    Chat(String),
    /// Blank frame
    Empty,
}

impl Command {
    pub fn parse(frame: &str) -> Self {
        let trimmed = frame.trim();
        if trimmed.is_empty() {
            return Command::Empty;
        }

        let (head, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (trimmed, ""),
        };
        let argument = || Some(rest).filter(|r| !r.is_empty()).map(str::to_string);

        match head {
            "/crear_sala" => {
                let (name, description) = match rest.split_once(char::is_whitespace) {
                    Some((name, description)) => (name, Some(description.trim())),
                    None => (rest, None),
                };
                Command::CreateRoom {
                    name: Some(name).filter(|n| !n.is_empty()).map(str::to_string),
                    description: description.filter(|d| !d.is_empty()).map(str::to_string),
                }
            }
            "/unirse" => Command::JoinRoom { room_id: argument() },
            "/mis_salas" => Command::MyRooms,
            "/eliminar_sala" => Command::DeleteRoom { room_id: argument() },
            "/salir_sala" => Command::LeaveRoom,
            "/lista" => Command::ListUsers,
            "/ayuda" => Command::Help,
            "/quit" => Command::Quit,
            _ => Command::Chat(trimmed.to_string()),
        }
    }
}

pub const HELP_TEXT: &str = "Commands:
  /crear_sala <name> [description]  create a room and enter it
  /unirse <room_id>                 join a room by its id
  /mis_salas                        list the rooms you belong to
  /eliminar_sala <room_id>          delete a room you created
  /salir_sala                       leave the current room
  /lista                            list connected users
  /ayuda                            show this help
  /quit                             disconnect
Anything else is sent as a chat message to your current room, or to everyone when you are in no room.";
