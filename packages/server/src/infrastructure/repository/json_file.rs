//! JSON file store
//!
//! Same contents as the in-memory store, persisted as one JSON snapshot.
//! A mutation is applied to a copy, written to `<path>.tmp`, renamed over
//! `<path>`, and only then committed in memory, so the file and the
//! in-memory state never diverge.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{
    Membership, Nickname, RepositoryError, RoomId, RoomRecord, RoomRepository, UserRecord,
    UserRepository,
};
use crate::infrastructure::dto::persistence::StoreSnapshot;

use super::StoreData;

pub struct JsonFileStore {
    path: PathBuf,
    data: Mutex<StoreData>,
}

impl JsonFileStore {
    /// Open the store at `path`, loading the snapshot if the file exists
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, RepositoryError> {
        let path = path.as_ref().to_path_buf();

        let data = match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let snapshot: StoreSnapshot = serde_json::from_slice(&bytes)
                    .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
                StoreData::from_snapshot(snapshot)?
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => StoreData::default(),
            Err(e) => return Err(RepositoryError::Io(e.to_string())),
        };

        tracing::info!(path = %path.display(), "JSON store opened");
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn mutate<T>(
        &self,
        apply: impl FnOnce(&mut StoreData) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        self.mutate_if(apply, |_| true).await
    }

    /// Like `mutate`, but only writes and commits when `changed` holds for
    /// the result.
    async fn mutate_if<T>(
        &self,
        apply: impl FnOnce(&mut StoreData) -> Result<T, RepositoryError>,
        changed: impl FnOnce(&T) -> bool,
    ) -> Result<T, RepositoryError> {
        let mut data = self.data.lock().await;
        let mut next = data.clone();
        let result = apply(&mut next)?;
        if !changed(&result) {
            return Ok(result);
        }
        self.write_snapshot(&next.to_snapshot()).await?;
        *data = next;
        Ok(result)
    }

    async fn write_snapshot(&self, snapshot: &StoreSnapshot) -> Result<(), RepositoryError> {
        let bytes = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        tokio::fs::write(&tmp, bytes)
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| RepositoryError::Io(e.to_string()))?;

        tracing::debug!(path = %self.path.display(), "JSON store snapshot written");
        Ok(())
    }
}

#[async_trait]
impl UserRepository for JsonFileStore {
    async fn find_user(&self, username: &Nickname) -> Result<Option<UserRecord>, RepositoryError> {
        Ok(self.data.lock().await.find_user(username))
    }

    async fn insert_user(&self, user: UserRecord) -> Result<(), RepositoryError> {
        self.mutate(|data| data.insert_user(user)).await
    }

    async fn list_users(&self) -> Result<Vec<UserRecord>, RepositoryError> {
        Ok(self.data.lock().await.list_users())
    }
}

#[async_trait]
impl RoomRepository for JsonFileStore {
    async fn is_room_id_taken(&self, room_id: &RoomId) -> Result<bool, RepositoryError> {
        Ok(self.data.lock().await.is_room_id_taken(room_id))
    }

    async fn insert_room(
        &self,
        room: RoomRecord,
        creator_membership: Membership,
    ) -> Result<(), RepositoryError> {
        self.mutate(|data| data.insert_room(room, creator_membership))
            .await
    }

    async fn find_room(&self, room_id: &RoomId) -> Result<Option<RoomRecord>, RepositoryError> {
        Ok(self.data.lock().await.find_room(room_id))
    }

    async fn list_rooms(&self) -> Result<Vec<RoomRecord>, RepositoryError> {
        Ok(self.data.lock().await.list_rooms())
    }

    async fn add_membership(&self, membership: Membership) -> Result<bool, RepositoryError> {
        // an existing entitlement needs no write
        self.mutate_if(|data| data.add_membership(membership), |added| *added)
            .await
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
        self.mutate(|data| data.delete_room(room_id)).await
    }
}
