//! Store contents and the rules every store implementation shares.

use std::collections::{BTreeMap, HashMap, HashSet};

use crate::domain::{Membership, Nickname, RepositoryError, RoomId, RoomRecord, UserRecord};
use crate::infrastructure::dto::persistence::StoreSnapshot;

#[derive(Debug, Clone, Default)]
pub struct StoreData {
    users: BTreeMap<Nickname, UserRecord>,
    rooms: HashMap<RoomId, RoomRecord>,
    /// Entitlements keyed by room, then username
    memberships: HashMap<RoomId, BTreeMap<Nickname, Membership>>,
    retired_room_ids: HashSet<RoomId>,
}

impl StoreData {
    pub fn find_user(&self, username: &Nickname) -> Option<UserRecord> {
        self.users.get(username).cloned()
    }

    pub fn insert_user(&mut self, user: UserRecord) -> Result<(), RepositoryError> {
        if self.users.contains_key(&user.username) {
            return Err(RepositoryError::UserAlreadyExists(
                user.username.as_str().to_string(),
            ));
        }
        self.users.insert(user.username.clone(), user);
        Ok(())
    }

    pub fn list_users(&self) -> Vec<UserRecord> {
        self.users.values().cloned().collect()
    }

    pub fn is_room_id_taken(&self, room_id: &RoomId) -> bool {
        self.rooms.contains_key(room_id) || self.retired_room_ids.contains(room_id)
    }

    pub fn insert_room(
        &mut self,
        room: RoomRecord,
        creator_membership: Membership,
    ) -> Result<(), RepositoryError> {
        if self.is_room_id_taken(&room.id) {
            return Err(RepositoryError::RoomAlreadyExists(room.id.as_str().to_string()));
        }
        let room_id = room.id.clone();
        self.rooms.insert(room_id.clone(), room);
        self.memberships.entry(room_id).or_default().insert(
            creator_membership.username.clone(),
            creator_membership,
        );
        Ok(())
    }

    pub fn find_room(&self, room_id: &RoomId) -> Option<RoomRecord> {
        self.rooms.get(room_id).cloned()
    }

    pub fn list_rooms(&self) -> Vec<RoomRecord> {
        let mut rooms: Vec<RoomRecord> = self.rooms.values().cloned().collect();
        rooms.sort_by(|a, b| (a.created_at, &a.id).cmp(&(b.created_at, &b.id)));
        rooms
    }

    pub fn add_membership(&mut self, membership: Membership) -> Result<bool, RepositoryError> {
        if !self.rooms.contains_key(&membership.room_id) {
            return Err(RepositoryError::RoomNotFound(
                membership.room_id.as_str().to_string(),
            ));
        }
        let members = self.memberships.entry(membership.room_id.clone()).or_default();
        if members.contains_key(&membership.username) {
            return Ok(false);
        }
        members.insert(membership.username.clone(), membership);
        Ok(true)
    }

    pub fn list_members(&self, room_id: &RoomId) -> Vec<Nickname> {
        self.memberships
            .get(room_id)
            .map(|members| members.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn list_rooms_for_user(&self, username: &Nickname) -> Vec<RoomRecord> {
        self.list_rooms()
            .into_iter()
            .filter(|room| {
                self.memberships
                    .get(&room.id)
                    .is_some_and(|members| members.contains_key(username))
            })
            .collect()
    }

    pub fn delete_room(&mut self, room_id: &RoomId) -> Result<usize, RepositoryError> {
        if self.rooms.remove(room_id).is_none() {
            return Err(RepositoryError::RoomNotFound(room_id.as_str().to_string()));
        }
        let removed = self
            .memberships
            .remove(room_id)
            .map(|members| members.len())
            .unwrap_or(0);
        self.retired_room_ids.insert(room_id.clone());
        Ok(removed)
    }

    pub fn to_snapshot(&self) -> StoreSnapshot {
        let mut retired_room_ids: Vec<String> = self
            .retired_room_ids
            .iter()
            .map(|id| id.as_str().to_string())
            .collect();
        retired_room_ids.sort();

        StoreSnapshot {
            users: self.users.values().map(Into::into).collect(),
            rooms: self.list_rooms().iter().map(Into::into).collect(),
            memberships: self
                .list_rooms()
                .iter()
                .filter_map(|room| self.memberships.get(&room.id))
                .flat_map(|members| members.values().map(Into::into))
                .collect(),
            retired_room_ids,
        }
    }

    /// Rebuild from a snapshot; memberships of unknown rooms are dropped.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, RepositoryError> {
        let mut data = Self::default();

        for row in snapshot.users {
            data.insert_user(row.try_into()?)?;
        }
        for row in snapshot.retired_room_ids {
            let id = RoomId::new(row)
                .map_err(|e| RepositoryError::Serialization(e.to_string()))?;
            data.retired_room_ids.insert(id);
        }
        for row in snapshot.rooms {
            let room: RoomRecord = row.try_into()?;
            data.rooms.insert(room.id.clone(), room);
        }
        for row in snapshot.memberships {
            let membership: Membership = row.try_into()?;
            if !data.rooms.contains_key(&membership.room_id) {
                tracing::warn!(
                    room_id = %membership.room_id,
                    "Dropping membership of unknown room"
                );
                continue;
            }
            data.memberships
                .entry(membership.room_id.clone())
                .or_default()
                .insert(membership.username.clone(), membership);
        }

        Ok(data)
    }
}
