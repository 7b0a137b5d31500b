//! Live room membership: which connected sockets are attached to which room.
//!
//! Invariant: a connection appears in the member set of exactly the room named
//! by its reverse pointer, and a connection without a reverse pointer appears
//! in no member set. Empty live rooms are dropped.

use std::collections::{HashMap, HashSet};

use super::value_object::{ConnectionId, RoomId, RoomName};

#[derive(Debug)]
struct LiveRoom {
    name: RoomName,
    members: HashSet<ConnectionId>,
}

/// Result of attaching a connection to a room
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttachOutcome {
    /// Newly attached, after leaving `previous` if any
    Attached { previous: Option<RoomId> },
    /// The connection was already a live member of this room
    AlreadyMember,
}

#[derive(Debug, Default)]
pub struct LiveRoomTable {
    rooms: HashMap<RoomId, LiveRoom>,
    current: HashMap<ConnectionId, RoomId>,
}

impl LiveRoomTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach `connection` to `room_id`, implicitly leaving its current room.
    pub fn attach(
        &mut self,
        connection: ConnectionId,
        room_id: &RoomId,
        name: &RoomName,
    ) -> AttachOutcome {
        if self.current.get(&connection) == Some(room_id) {
            return AttachOutcome::AlreadyMember;
        }

        let previous = self.detach(&connection);

        self.rooms
            .entry(room_id.clone())
            .or_insert_with(|| LiveRoom {
                name: name.clone(),
                members: HashSet::new(),
            })
            .members
            .insert(connection);
        self.current.insert(connection, room_id.clone());

        AttachOutcome::Attached { previous }
    }

    /// Detach `connection` from its current room.
    ///
    /// Returns the room it left; a connection in no room is a no-op.
    pub fn detach(&mut self, connection: &ConnectionId) -> Option<RoomId> {
        let room_id = self.current.remove(connection)?;

        if let Some(room) = self.rooms.get_mut(&room_id) {
            room.members.remove(connection);
            if room.members.is_empty() {
                self.rooms.remove(&room_id);
            }
        }

        Some(room_id)
    }

    /// Drop a room from the live table, returning every evicted member
    pub fn evict_room(&mut self, room_id: &RoomId) -> Vec<ConnectionId> {
        let Some(room) = self.rooms.remove(room_id) else {
            return Vec::new();
        };

        let evicted: Vec<ConnectionId> = room.members.into_iter().collect();
        for connection in &evicted {
            self.current.remove(connection);
        }
        evicted
    }

    pub fn current_room(&self, connection: &ConnectionId) -> Option<&RoomId> {
        self.current.get(connection)
    }

    /// Snapshot of a room's live members; unknown rooms have none
    pub fn members(&self, room_id: &RoomId) -> Vec<ConnectionId> {
        self.rooms
            .get(room_id)
            .map(|room| room.members.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn member_count(&self, room_id: &RoomId) -> usize {
        self.rooms
            .get(room_id)
            .map(|room| room.members.len())
            .unwrap_or(0)
    }

    pub fn room_name(&self, room_id: &RoomId) -> Option<&RoomName> {
        self.rooms.get(room_id).map(|room| &room.name)
    }
}
