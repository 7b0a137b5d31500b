//! Repository traits
//!
//! The persisted side of the broker: credentials, rooms and entitlements.
//! The domain declares what it needs; `infrastructure::repository` provides
//! the implementations.

use async_trait::async_trait;

use super::{
    entity::{Membership, RoomRecord, UserRecord},
    error::RepositoryError,
    value_object::{Nickname, RoomId},
};

/// Credential store backing the Auth Gateway
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_user(&self, username: &Nickname) -> Result<Option<UserRecord>, RepositoryError>;

    /// Insert a new user; fails with `UserAlreadyExists` if the name is taken
    async fn insert_user(&self, user: UserRecord) -> Result<(), RepositoryError>;

    /// All registered users, ordered by username
    async fn list_users(&self) -> Result<Vec<UserRecord>, RepositoryError>;
}

/// Room and entitlement store backing the Room Directory
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RoomRepository: Send + Sync {
    /// Whether the id was ever issued, including deleted rooms
    async fn is_room_id_taken(&self, room_id: &RoomId) -> Result<bool, RepositoryError>;

    /// Persist a room together with the creator's membership
    async fn insert_room(
        &self,
        room: RoomRecord,
        creator_membership: Membership,
    ) -> Result<(), RepositoryError>;

    async fn find_room(&self, room_id: &RoomId) -> Result<Option<RoomRecord>, RepositoryError>;

    /// All rooms, ordered by creation time
    async fn list_rooms(&self) -> Result<Vec<RoomRecord>, RepositoryError>;

    /// Record an entitlement. Returns `false` if it already existed.
    async fn add_membership(&self, membership: Membership) -> Result<bool, RepositoryError>;

    /// Usernames entitled to the room, ordered
    async fn list_members(&self, room_id: &RoomId) -> Result<Vec<Nickname>, RepositoryError>;

    /// Rooms the user is entitled to, ordered by creation time
    async fn list_rooms_for_user(
        &self,
        username: &Nickname,
    ) -> Result<Vec<RoomRecord>, RepositoryError>;

    /// Remove the room row and every membership row, retiring the id.
    ///
    /// Returns the number of membership rows removed; fails with
    /// `RoomNotFound` if the room does not exist.
    async fn delete_room(&self, room_id: &RoomId) -> Result<usize, RepositoryError>;
}
