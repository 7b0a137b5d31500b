//! UseCase: Broadcast Engine
//!
//! Renders messages and delivers them to an audience with per-recipient
//! fault isolation. The audience is snapshotted under the state lock and
//! the lock is released before any frame is pushed.
//!
//! A recipient whose push fails is evicted and the rest are told it "lost
//! connection". Those notices go out through `notify`, which only logs its
//! own failures, so eviction never recurses.

use std::sync::Arc;

use tertulia_shared::time::Clock;

use crate::domain::{
    Audience, ConnectionId, Envelope, MessagePusher, Nickname, RoomId, format_message,
};

use super::state::{Departure, SharedState};

/// Why a connection went away; selects the departure notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DepartureReason {
    /// `/quit`
    Quit,
    /// Peer closed the socket or a read failed
    Unexpected,
    /// Outbound delivery failed
    LostConnection,
}

impl DepartureReason {
    pub fn notice(&self, nickname: &Nickname) -> String {
        match self {
            DepartureReason::Quit => format!("{nickname} disconnected."),
            DepartureReason::Unexpected => format!("{nickname} left unexpectedly."),
            DepartureReason::LostConnection => format!("{nickname} lost connection."),
        }
    }
}

/// Outcome of one delivery
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    /// Recipients evicted because their push failed
    pub evicted: Vec<Nickname>,
}

pub struct BroadcastEngine {
    state: SharedState,
    pusher: Arc<dyn MessagePusher>,
    clock: Arc<dyn Clock>,
}

impl BroadcastEngine {
    pub fn new(state: SharedState, pusher: Arc<dyn MessagePusher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            state,
            pusher,
            clock,
        }
    }

    /// Render with the engine's clock
    pub fn format_message(&self, sender: &str, body: &str, is_system: bool) -> String {
        format_message(&self.clock.now(), sender, body, is_system)
    }

    pub async fn broadcast_global(
        &self,
        rendered: &str,
        excluding: Option<ConnectionId>,
    ) -> DeliveryReport {
        self.deliver_rendered(&Audience::Global { excluding }, rendered)
            .await
    }

    /// Deliver to a room's live members; an unknown room reaches nobody
    pub async fn broadcast_to_room(
        &self,
        rendered: &str,
        room_id: &RoomId,
        excluding: Option<ConnectionId>,
    ) -> DeliveryReport {
        let audience = Audience::Room {
            room_id: room_id.clone(),
            excluding,
        };
        self.deliver_rendered(&audience, rendered).await
    }

    pub async fn send_to(&self, connection_id: ConnectionId, rendered: &str) -> DeliveryReport {
        self.deliver_rendered(&Audience::Direct(connection_id), rendered)
            .await
    }

    pub async fn deliver(&self, envelope: &Envelope) -> DeliveryReport {
        let rendered = envelope.render(&self.clock.now());
        self.deliver_rendered(&envelope.audience, &rendered).await
    }

    /// Send a system notice without evicting anyone on failure
    pub async fn notify(&self, audience: &Audience, body: &str) {
        let targets = self.resolve(audience).await;
        let rendered = self.format_message("", body, true);
        for (connection_id, e) in self.pusher.broadcast(&targets, &rendered).await {
            tracing::debug!(%connection_id, "Dropped notice: {}", e);
        }
    }

    /// Evict a connection and announce its departure.
    ///
    /// Returns `None` when the connection was already gone, in which case
    /// nothing is announced.
    pub async fn depart(
        &self,
        connection_id: &ConnectionId,
        reason: DepartureReason,
    ) -> Option<Departure> {
        let departure = self.state.lock().await.evict(connection_id)?;
        self.pusher.unregister_client(connection_id).await;

        tracing::info!(
            %connection_id,
            nickname = %departure.nickname,
            ?reason,
            "Connection departed"
        );

        if let Some(room_id) = &departure.room {
            let audience = Audience::Room {
                room_id: room_id.clone(),
                excluding: None,
            };
            self.notify(&audience, &format!("{} left the room.", departure.nickname))
                .await;
        }
        self.notify(
            &Audience::Global { excluding: None },
            &reason.notice(&departure.nickname),
        )
        .await;

        Some(departure)
    }

    async fn deliver_rendered(&self, audience: &Audience, rendered: &str) -> DeliveryReport {
        let targets = self.resolve(audience).await;
        let failures = self.pusher.broadcast(&targets, rendered).await;

        let mut report = DeliveryReport {
            delivered: targets.len() - failures.len(),
            evicted: Vec::new(),
        };
        for (connection_id, e) in failures {
            tracing::warn!(%connection_id, "Delivery failed, evicting: {}", e);
            if let Some(departure) = self
                .depart(&connection_id, DepartureReason::LostConnection)
                .await
            {
                report.evicted.push(departure.nickname);
            }
        }
        report
    }

    /// Snapshot the audience under the state lock
    async fn resolve(&self, audience: &Audience) -> Vec<ConnectionId> {
        let state = self.state.lock().await;
        match audience {
            Audience::Global { excluding } => {
                state.registry.connection_ids_except(excluding.as_ref())
            }
            Audience::Room { room_id, excluding } => state
                .live_rooms
                .members(room_id)
                .into_iter()
                .filter(|id| Some(id) != excluding.as_ref())
                .collect(),
            Audience::Direct(connection_id) => vec![*connection_id],
        }
    }
}
