//! Shared broker state
//!
//! The Connection Registry and the live-room table live together behind one
//! `tokio::sync::Mutex`, so every logical operation (admit, remove, attach,
//! detach, create, delete, audience snapshot) is atomic with respect to the
//! others.
//!
//! ## Lock discipline
//!
//! - The state lock is never held while pushing to a connection; broadcasts
//!   snapshot their audience and release the lock before sending.
//! - Room Directory operations hold the state lock across their store calls,
//!   which serializes joins against deletes.
//! - Lock order is state, then store. The message pusher's own lock is
//!   never taken while the state lock is held.

use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, ConnectionRegistry, LiveRoomTable, Nickname, RoomId};

#[derive(Debug, Default)]
pub struct BrokerState {
    pub registry: ConnectionRegistry,
    pub live_rooms: LiveRoomTable,
}

pub type SharedState = Arc<Mutex<BrokerState>>;

/// What a connection left behind when it was evicted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub nickname: Nickname,
    pub room: Option<RoomId>,
}

impl BrokerState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedState {
        Arc::new(Mutex::new(Self::new()))
    }

    /// Remove a connection from the live-room table and the registry.
    ///
    /// Only the first call for a connection returns `Some`; callers announce
    /// a departure only then, so it is announced exactly once.
    pub fn evict(&mut self, connection_id: &ConnectionId) -> Option<Departure> {
        let room = self.live_rooms.detach(connection_id);
        let nickname = self.registry.remove(connection_id)?;
        Some(Departure { nickname, room })
    }
}
