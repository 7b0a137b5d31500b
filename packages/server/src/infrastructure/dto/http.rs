//! Admin API response bodies.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthDto {
    pub status: String,
}

/// Connected users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsersDto {
    pub users: Vec<String>,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomSummaryDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub creator: String,
    pub created_at: Option<String>,
    pub live_member_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomDetailDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub creator: String,
    pub created_at: Option<String>,
    /// Entitled usernames
    pub members: Vec<String>,
    /// Nicknames currently attached to the room
    pub live_members: Vec<String>,
}
