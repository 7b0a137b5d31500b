//! Connection Registry: live connections and the nickname bound to each.
//!
//! Pure data structure with no I/O. Callers serialize access through the
//! broker state lock (see `usecase::state`).

use std::collections::HashMap;

use super::{
    error::RegistryError,
    value_object::{ConnectionId, Nickname},
};

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Nickname>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a newly authenticated connection.
    ///
    /// Never overwrites: an already registered connection fails with
    /// `DuplicateOrInvalidState`, and a nickname already bound to another
    /// live connection fails with `NicknameInUse`.
    pub fn admit(&mut self, id: ConnectionId, nickname: Nickname) -> Result<(), RegistryError> {
        if self.connections.contains_key(&id) {
            return Err(RegistryError::DuplicateOrInvalidState(id.to_string()));
        }
        if self.is_nickname_active(&nickname) {
            return Err(RegistryError::NicknameInUse(nickname.as_str().to_string()));
        }

        self.connections.insert(id, nickname);
        Ok(())
    }

    /// Unregister a connection, returning its nickname if it was present.
    ///
    /// Idempotent: a second call returns `None`.
    pub fn remove(&mut self, id: &ConnectionId) -> Option<Nickname> {
        self.connections.remove(id)
    }

    /// Point-in-time snapshot of active nicknames, sorted for stable output
    pub fn list_nicknames(&self) -> Vec<Nickname> {
        let mut nicknames: Vec<Nickname> = self.connections.values().cloned().collect();
        nicknames.sort();
        nicknames
    }

    pub fn nickname_of(&self, id: &ConnectionId) -> Option<&Nickname> {
        self.connections.get(id)
    }

    pub fn contains(&self, id: &ConnectionId) -> bool {
        self.connections.contains_key(id)
    }

    pub fn is_nickname_active(&self, nickname: &Nickname) -> bool {
        self.connections.values().any(|n| n == nickname)
    }

    /// Broadcast audience: every registered connection except `excluding`
    pub fn connection_ids_except(&self, excluding: Option<&ConnectionId>) -> Vec<ConnectionId> {
        self.connections
            .keys()
            .filter(|id| Some(*id) != excluding)
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}
