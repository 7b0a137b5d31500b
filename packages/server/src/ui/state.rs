//! Application state shared by every connection task and the admin API.

use std::sync::Arc;

use tertulia_shared::time::{Clock, SystemClock};

use crate::{
    config::{ServerConfig, SessionSettings},
    domain::{MessagePusher, Nickname, RoomRepository, UserRepository},
    infrastructure::{
        codec::{CodecCatalog, parse_codec_key},
        message_pusher::ChannelMessagePusher,
        password::Sha256PasswordHasher,
        repository::{InMemoryStore, JsonFileStore},
    },
    usecase::{AuthGateway, BroadcastEngine, BrokerState, RoomDirectory, SharedState},
};

use super::error::ServerError;

pub struct AppState {
    pub auth: AuthGateway,
    pub rooms: RoomDirectory,
    pub broadcast: BroadcastEngine,
    /// Outbound queues, one per admitted connection
    pub pusher: Arc<dyn MessagePusher>,
    pub state: SharedState,
    pub codecs: CodecCatalog,
    pub settings: SessionSettings,
}

impl AppState {
    /// Wire the usecases over the given stores
    pub fn new(
        users: Arc<dyn UserRepository>,
        rooms: Arc<dyn RoomRepository>,
        codecs: CodecCatalog,
        settings: SessionSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let state = BrokerState::shared();
        let pusher: Arc<dyn MessagePusher> = Arc::new(ChannelMessagePusher::new());

        Self {
            auth: AuthGateway::new(users.clone(), Arc::new(Sha256PasswordHasher), clock.clone()),
            rooms: RoomDirectory::new(state.clone(), users, rooms, clock.clone()),
            broadcast: BroadcastEngine::new(state.clone(), pusher.clone(), clock),
            pusher,
            state,
            codecs,
            settings,
        }
    }

    /// Build from configuration: open the store and load the codec key
    pub async fn from_config(config: &ServerConfig) -> Result<Self, ServerError> {
        let codecs = match &config.codec_key {
            Some(hex_key) => CodecCatalog::new(Some(parse_codec_key(hex_key)?)),
            None => CodecCatalog::plain_only(),
        };

        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let state = match &config.data_file {
            Some(path) => {
                let store = Arc::new(JsonFileStore::open(path).await?);
                Self::new(store.clone(), store, codecs, config.session, clock)
            }
            None => {
                let store = Arc::new(InMemoryStore::new());
                Self::new(store.clone(), store, codecs, config.session, clock)
            }
        };
        Ok(state)
    }

    /// In-memory state with default settings
    pub fn in_memory(codecs: CodecCatalog) -> Self {
        let store = Arc::new(InMemoryStore::new());
        Self::new(
            store.clone(),
            store,
            codecs,
            SessionSettings::default(),
            Arc::new(SystemClock),
        )
    }

    pub async fn connected_users(&self) -> Vec<Nickname> {
        self.state.lock().await.registry.list_nicknames()
    }
}
