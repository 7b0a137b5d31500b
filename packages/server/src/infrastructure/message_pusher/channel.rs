//! Channel-based MessagePusher implementation
//!
//! The Session Handler creates each connection's `PusherChannel` and the
//! writer task that drains it; this type only keeps the senders and queues
//! frames on them. A send fails once the writer task has dropped its
//! receiver, which is how a dead socket surfaces to the Broadcast Engine.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{ConnectionId, MessagePushError, MessagePusher, PusherChannel};

#[derive(Clone, Default)]
pub struct ChannelMessagePusher {
    clients: Arc<Mutex<HashMap<ConnectionId, PusherChannel>>>,
}

impl ChannelMessagePusher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn client_count(&self) -> usize {
        self.clients.lock().await.len()
    }
}

#[async_trait]
impl MessagePusher for ChannelMessagePusher {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut clients = self.clients.lock().await;
        clients.insert(connection_id, sender);
        tracing::debug!(%connection_id, "Client registered to MessagePusher");
    }

    async fn unregister_client(&self, connection_id: &ConnectionId) {
        let mut clients = self.clients.lock().await;
        clients.remove(connection_id);
        tracing::debug!(%connection_id, "Client unregistered from MessagePusher");
    }

    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError> {
        let clients = self.clients.lock().await;

        let sender = clients
            .get(connection_id)
            .ok_or_else(|| MessagePushError::ClientNotFound(connection_id.to_string()))?;
        sender
            .send(content.to_string())
            .map_err(|e| MessagePushError::PushFailed(e.to_string()))
    }

    async fn broadcast(
        &self,
        targets: &[ConnectionId],
        content: &str,
    ) -> Vec<(ConnectionId, MessagePushError)> {
        let clients = self.clients.lock().await;
        let mut failures = Vec::new();

        for target in targets {
            let result = match clients.get(target) {
                Some(sender) => sender
                    .send(content.to_string())
                    .map_err(|e| MessagePushError::PushFailed(e.to_string())),
                None => Err(MessagePushError::ClientNotFound(target.to_string())),
            };
            if let Err(e) = result {
                tracing::warn!(connection_id = %target, "Failed to push message: {}", e);
                failures.push((*target, e));
            }
        }

        failures
    }
}
