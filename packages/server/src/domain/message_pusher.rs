//! Outbound delivery trait
//!
//! The usecase layer addresses connections by `ConnectionId` only; how a
//! rendered frame reaches the socket belongs to the implementation.

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::{error::MessagePushError, value_object::ConnectionId};

/// Per-connection outbound queue, drained by the connection's writer task
pub type PusherChannel = mpsc::UnboundedSender<String>;

#[async_trait]
pub trait MessagePusher: Send + Sync {
    async fn register_client(&self, connection_id: ConnectionId, sender: PusherChannel);

    async fn unregister_client(&self, connection_id: &ConnectionId);

    /// Queue a frame for one connection.
    ///
    /// Fails with `ClientNotFound` for unregistered connections and
    /// `PushFailed` when the writer task is gone.
    async fn push_to(
        &self,
        connection_id: &ConnectionId,
        content: &str,
    ) -> Result<(), MessagePushError>;

    /// Queue a frame for every target, continuing past failures.
    ///
    /// Returns the targets that could not be reached.
    async fn broadcast(
        &self,
        targets: &[ConnectionId],
        content: &str,
    ) -> Vec<(ConnectionId, MessagePushError)>;
}
