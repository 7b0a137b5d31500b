//! Domain entities held by the persistence store.

use super::value_object::{Nickname, RoomId, RoomName, Timestamp};

/// A registered user and its password digest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub username: Nickname,
    pub password_hash: String,
    pub created_at: Timestamp,
}

/// Persisted identity of a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomRecord {
    pub id: RoomId,
    pub name: RoomName,
    pub description: Option<String>,
    pub creator: Nickname,
    pub created_at: Timestamp,
}

/// Persisted entitlement of a user to (re)join a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Membership {
    pub room_id: RoomId,
    pub username: Nickname,
    pub joined_at: Timestamp,
}

/// One entry of a user's room list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRoom {
    pub id: RoomId,
    pub name: RoomName,
    pub description: Option<String>,
    pub is_creator: bool,
}

impl UserRoom {
    /// Project a room record for the given user
    pub fn from_record(record: RoomRecord, username: &Nickname) -> Self {
        let is_creator = &record.creator == username;
        Self {
            id: record.id,
            name: record.name,
            description: record.description,
            is_creator,
        }
    }
}
