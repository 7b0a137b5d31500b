//! JSON store snapshot format.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRow {
    pub username: String,
    pub password_hash: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomRow {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub creator: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRow {
    pub room_id: String,
    pub username: String,
    pub joined_at: i64,
}

/// Whole-store snapshot written after every mutation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    #[serde(default)]
    pub users: Vec<UserRow>,
    #[serde(default)]
    pub rooms: Vec<RoomRow>,
    #[serde(default)]
    pub memberships: Vec<MembershipRow>,
    /// Ids of deleted rooms; never reissued
    #[serde(default)]
    pub retired_room_ids: Vec<String>,
}
