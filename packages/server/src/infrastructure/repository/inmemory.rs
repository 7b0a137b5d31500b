//! InMemory store
//!
//! Implements both repository traits over a `StoreData` behind a mutex.
//! Contents live for the process lifetime.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Membership, Nickname, RepositoryError, RoomId, RoomRecord, RoomRepository, UserRecord,
    UserRepository,
};

use super::StoreData;

#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    data: Arc<Mutex<StoreData>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for InMemoryStore {
    async fn find_user(&self, username: &Nickname) -> Result<Option<UserRecord>, RepositoryError> {
        Ok(self.data.lock().await.find_user(username))
    }

    async fn insert_user(&self, user: UserRecord) -> Result<(), RepositoryError> {
        self.data.lock().await.insert_user(user)
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, RepositoryError> {
        Ok(self.data.lock().await.list_users())
    }
}

#[async_trait]
impl RoomRepository for InMemoryStore {
    async fn is_room_id_taken(&self, room_id: &RoomId) -> Result<bool, RepositoryError> {
        Ok(self.data.lock().await.is_room_id_taken(room_id))
    }

    async fn insert_room(
        &self,
        room: RoomRecord,
        creator_membership: Membership,
    ) -> Result<(), RepositoryError> {
        self.data.lock().await.insert_room(room, creator_membership)
    }

    async fn find_room(&self, room_id: &RoomId) -> Result<Option<RoomRecord>, RepositoryError> {
        Ok(self.data.lock().await.find_room(room_id))
    }

    async fn list_rooms(&self) -> Result<Vec<RoomRecord>, RepositoryError> {
        Ok(self.data.lock().await.list_rooms())
    }

    async fn add_membership(&self, membership: Membership) -> Result<bool, RepositoryError> {
        self.data.lock().await.add_membership(membership)
    }

    async fn list_members(&self, room_id: &RoomId) -> Result<Vec<Nickname>, RepositoryError> {
        Ok(self.data.lock().await.list_members(room_id))
    }

    async fn list_rooms_for_user(
        &self,
        username: &Nickname,
    ) -> Result<Vec<RoomRecord>, RepositoryError> {
        Ok(self.data.lock().await.list_rooms_for_user(username))
    }

    async fn delete_room(&self, room_id: &RoomId) -> Result<usize, RepositoryError> {
        self.data.lock().await.delete_room(room_id)
    }
}
