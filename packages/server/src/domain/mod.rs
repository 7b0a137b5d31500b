//! Domain layer
//!
//! Pure types and rules of the broker, plus the traits its collaborators
//! implement. Nothing here performs I/O.

pub mod codec;
pub mod entity;
pub mod error;
pub mod live_rooms;
pub mod message;
pub mod message_pusher;
pub mod password;
pub mod protocol;
pub mod registry;
pub mod repository;
pub mod value_object;

pub use codec::MessageCodec;
pub use entity::{Membership, RoomRecord, UserRecord, UserRoom};
pub use error::{
    CodecError, MessagePushError, ProtocolError, RegistryError, RepositoryError,
    ValueObjectError,
};
pub use live_rooms::{AttachOutcome, LiveRoomTable};
pub use message::{Audience, Envelope, format_message};
pub use message_pusher::{MessagePusher, PusherChannel};
pub use password::PasswordHasher;
pub use protocol::{AuthAction, AuthRequest, Command};
pub use registry::ConnectionRegistry;
pub use repository::{RoomRepository, UserRepository};
pub use value_object::{ConnectionId, Nickname, RoomId, RoomIdFactory, RoomName, Timestamp};

#[cfg(test)]
pub use repository::{MockRoomRepository, MockUserRepository};
