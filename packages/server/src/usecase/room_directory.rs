//! UseCase: Room Directory
//!
//! Creates, joins, lists and deletes rooms. Persisted identity and
//! entitlements go through `RoomRepository`; live membership goes through
//! the shared `LiveRoomTable`. Every operation runs under the broker state
//! lock, including its store calls, so a join racing a delete either
//! completes first or fails with `RoomNotFound`.

use std::sync::Arc;

use tertulia_shared::time::Clock;

use crate::domain::{
    AttachOutcome, ConnectionId, Membership, Nickname, RepositoryError, RoomId, RoomIdFactory,
    RoomName, RoomRecord, RoomRepository, Timestamp, UserRepository, UserRoom,
    value_object::room_description,
};

use super::{error::RoomDirectoryError, state::SharedState};

/// Attempts at drawing an unused room id before giving up
pub const MAX_ROOM_ID_ATTEMPTS: usize = 16;

/// A connection entering a room, persisted and live
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnteredRoom {
    pub room: RoomRecord,
    pub outcome: AttachOutcome,
}

/// A connection leaving its current room
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeftRoom {
    pub id: RoomId,
    pub name: RoomName,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedRoom {
    pub room: RoomRecord,
    /// Connections that were live in the room, requester included
    pub evicted: Vec<ConnectionId>,
}

/// Persisted room with its live view, for the admin API
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomOverview {
    pub room: RoomRecord,
    pub members: Vec<Nickname>,
    pub live_members: Vec<Nickname>,
}

pub struct RoomDirectory {
    state: SharedState,
    users: Arc<dyn UserRepository>,
    rooms: Arc<dyn RoomRepository>,
    clock: Arc<dyn Clock>,
}

fn parse_room_id(raw: &str) -> Result<RoomId, RoomDirectoryError> {
    RoomId::new(raw).map_err(|_| RoomDirectoryError::RoomNotFound(raw.trim().to_string()))
}

impl RoomDirectory {
    pub fn new(
        state: SharedState,
        users: Arc<dyn UserRepository>,
        rooms: Arc<dyn RoomRepository>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            state,
            users,
            rooms,
            clock,
        }
    }

    /// Create a room owned by `creator` and record the creator's membership.
    ///
    /// The id is unique among every room ever created, deleted ones included.
    pub async fn create_room(
        &self,
        name: &str,
        creator: &Nickname,
        description: Option<&str>,
    ) -> Result<RoomRecord, RoomDirectoryError> {
        let name = RoomName::new(name).map_err(|e| RoomDirectoryError::InvalidInput(e.to_string()))?;
        let description =
            room_description(description).map_err(|e| RoomDirectoryError::InvalidInput(e.to_string()))?;

        let _state = self.state.lock().await;

        if self.users.find_user(creator).await?.is_none() {
            return Err(RoomDirectoryError::CreatorNotFound(creator.to_string()));
        }

        let now = Timestamp::new(self.clock.now_millis());
        for attempt in 1..=MAX_ROOM_ID_ATTEMPTS {
            let id = RoomIdFactory::generate();
            if self.rooms.is_room_id_taken(&id).await? {
                tracing::debug!(room_id = %id, attempt, "Room id collision, retrying");
                continue;
            }

            let room = RoomRecord {
                id: id.clone(),
                name: name.clone(),
                description: description.clone(),
                creator: creator.clone(),
                created_at: now,
            };
            let membership = Membership {
                room_id: id.clone(),
                username: creator.clone(),
                joined_at: now,
            };
            match self.rooms.insert_room(room.clone(), membership).await {
                Ok(()) => {
                    tracing::info!(room_id = %id, name = %room.name, creator = %creator, "Room created");
                    return Ok(room);
                }
                Err(RepositoryError::RoomAlreadyExists(_)) => continue,
                Err(e) => return Err(e.into()),
            }
        }

        tracing::warn!(creator = %creator, "Room id space exhausted");
        Err(RoomDirectoryError::RoomIdExhausted)
    }

    /// Record `nickname`'s entitlement to a room and return the room's name.
    ///
    /// Joining twice is a no-op success.
    pub async fn join_room(
        &self,
        room_id: &str,
        nickname: &Nickname,
    ) -> Result<RoomName, RoomDirectoryError> {
        let _state = self.state.lock().await;
        let room = self.join_locked(room_id, nickname).await?;
        Ok(room.name)
    }

    /// Attach a connection to a room's live membership
    pub async fn attach_live(
        &self,
        connection_id: ConnectionId,
        room_id: &str,
    ) -> Result<AttachOutcome, RoomDirectoryError> {
        let mut state = self.state.lock().await;
        let room = self.find_locked(room_id).await?;
        Ok(state
            .live_rooms
            .attach(connection_id, &room.id, &room.name))
    }

    /// Detach a connection from its current room; a no-op if it has none
    pub async fn detach_live(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.state.lock().await.live_rooms.detach(connection_id)
    }

    /// Join and attach in one step, as `/unirse` and `/crear_sala` need
    pub async fn enter_room(
        &self,
        connection_id: ConnectionId,
        nickname: &Nickname,
        room_id: &str,
    ) -> Result<EnteredRoom, RoomDirectoryError> {
        let mut state = self.state.lock().await;
        let room = self.join_locked(room_id, nickname).await?;
        let outcome = state
            .live_rooms
            .attach(connection_id, &room.id, &room.name);
        Ok(EnteredRoom { room, outcome })
    }

    /// Leave the current room, keeping the persisted entitlement
    pub async fn leave_room(&self, connection_id: &ConnectionId) -> Option<LeftRoom> {
        let mut state = self.state.lock().await;
        let id = state.live_rooms.current_room(connection_id)?.clone();
        let name = state.live_rooms.room_name(&id)?.clone();
        state.live_rooms.detach(connection_id);
        Some(LeftRoom { id, name })
    }

    pub async fn current_room(&self, connection_id: &ConnectionId) -> Option<RoomId> {
        self.state
            .lock()
            .await
            .live_rooms
            .current_room(connection_id)
            .cloned()
    }

    /// Rooms `nickname` is entitled to, oldest first
    pub async fn list_user_rooms(
        &self,
        nickname: &Nickname,
    ) -> Result<Vec<UserRoom>, RoomDirectoryError> {
        let rooms = self.rooms.list_rooms_for_user(nickname).await?;
        Ok(rooms
            .into_iter()
            .map(|room| UserRoom::from_record(room, nickname))
            .collect())
    }

    /// Delete a room. Only its creator may do so.
    ///
    /// Removes the persisted room and every entitlement, then evicts all
    /// live members from the live table.
    pub async fn delete_room(
        &self,
        room_id: &str,
        requester: &Nickname,
    ) -> Result<DeletedRoom, RoomDirectoryError> {
        let mut state = self.state.lock().await;
        let room = self.find_locked(room_id).await?;
        if &room.creator != requester {
            return Err(RoomDirectoryError::NotCreator(room.id.to_string()));
        }

        let removed = match self.rooms.delete_room(&room.id).await {
            Ok(removed) => removed,
            Err(RepositoryError::RoomNotFound(id)) => {
                return Err(RoomDirectoryError::RoomNotFound(id));
            }
            Err(e) => return Err(e.into()),
        };
        let evicted = state.live_rooms.evict_room(&room.id);

        tracing::info!(
            room_id = %room.id,
            memberships = removed,
            live = evicted.len(),
            "Room deleted"
        );
        Ok(DeletedRoom { room, evicted })
    }

    /// Every persisted room with its live member count
    pub async fn list_rooms(&self) -> Result<Vec<(RoomRecord, usize)>, RoomDirectoryError> {
        let state = self.state.lock().await;
        let rooms = self.rooms.list_rooms().await?;
        Ok(rooms
            .into_iter()
            .map(|room| {
                let live = state.live_rooms.member_count(&room.id);
                (room, live)
            })
            .collect())
    }

    pub async fn room_overview(&self, room_id: &str) -> Result<RoomOverview, RoomDirectoryError> {
        let state = self.state.lock().await;
        let room = self.find_locked(room_id).await?;
        let members = self.rooms.list_members(&room.id).await?;
        let mut live_members: Vec<Nickname> = state
            .live_rooms
            .members(&room.id)
            .iter()
            .filter_map(|id| state.registry.nickname_of(id).cloned())
            .collect();
        live_members.sort();
        Ok(RoomOverview {
            room,
            members,
            live_members,
        })
    }

    // callers hold the state lock

    async fn find_locked(&self, room_id: &str) -> Result<RoomRecord, RoomDirectoryError> {
        let id = parse_room_id(room_id)?;
        self.rooms
            .find_room(&id)
            .await?
            .ok_or_else(|| RoomDirectoryError::RoomNotFound(id.to_string()))
    }

    async fn join_locked(
        &self,
        room_id: &str,
        nickname: &Nickname,
    ) -> Result<RoomRecord, RoomDirectoryError> {
        let room = self.find_locked(room_id).await?;
        let membership = Membership {
            room_id: room.id.clone(),
            username: nickname.clone(),
            joined_at: Timestamp::new(self.clock.now_millis()),
        };
        if self.rooms.add_membership(membership).await? {
            tracing::info!(room_id = %room.id, username = %nickname, "Membership recorded");
        }
        Ok(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockRoomRepository, MockUserRepository, UserRecord};
    use crate::infrastructure::repository::InMemoryStore;
    use crate::usecase::state::BrokerState;
    use tertulia_shared::time::FixedClock;

    // ========================================
    // 【何をテストするか】
    // - create_room: ID 生成の衝突リトライ・作成者の検証・入力検証
    // - enter_room / join_room: 冪等な参加と暗黙の退出
    // - delete_room: 作成者チェック・永続データと生存メンバーの削除
    // - 参加と削除の競合がロックで直列化されること
    // ========================================

    fn nick(value: &str) -> Nickname {
        Nickname::new(value).unwrap()
    }

    async fn store_with_users(names: &[&str]) -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        for name in names {
            store
                .insert_user(UserRecord {
                    username: nick(name),
                    password_hash: "h".to_string(),
                    created_at: Timestamp::new(0),
                })
                .await
                .unwrap();
        }
        store
    }

    fn directory(store: Arc<InMemoryStore>) -> (RoomDirectory, SharedState) {
        let state = BrokerState::shared();
        let directory = RoomDirectory::new(
            state.clone(),
            store.clone(),
            store,
            Arc::new(FixedClock::from_millis(5_000)),
        );
        (directory, state)
    }

    async fn admitted(state: &SharedState, name: &str) -> ConnectionId {
        let id = ConnectionId::generate();
        state.lock().await.registry.admit(id, nick(name)).unwrap();
        id
    }

    #[tokio::test]
    async fn test_create_room_returns_fresh_id_and_membership() {
        // テスト項目: ルーム作成で 8 文字の ID が発行され、作成者のメンバーシップが記録される
        // given (前提条件):
        let store = store_with_users(&["alice"]).await;
        let (directory, _state) = directory(store.clone());

        // when (操作):
        let room = directory
            .create_room("Team", &nick("alice"), Some("weekly sync"))
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(room.id.as_str().len(), 8);
        assert_eq!(room.name.as_str(), "Team");
        assert_eq!(room.description.as_deref(), Some("weekly sync"));
        let rooms = directory.list_user_rooms(&nick("alice")).await.unwrap();
        assert_eq!(rooms.len(), 1);
        assert!(rooms[0].is_creator);
    }

    #[tokio::test]
    async fn test_create_room_unknown_creator() {
        // テスト項目: 永続化されていない作成者は CreatorNotFound になる
        // given (前提条件):
        let store = store_with_users(&[]).await;
        let (directory, _state) = directory(store);

        // when (操作):
        let result = directory.create_room("Team", &nick("ghost"), None).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RoomDirectoryError::CreatorNotFound("ghost".to_string()))
        );
    }

    #[tokio::test]
    async fn test_create_room_rejects_blank_name() {
        // テスト項目: 空のルーム名は InvalidInput になる
        // given (前提条件):
        let store = store_with_users(&["alice"]).await;
        let (directory, _state) = directory(store);

        // when (操作):
        let result = directory.create_room("  ", &nick("alice"), None).await;

        // then (期待する結果):
        assert!(matches!(result, Err(RoomDirectoryError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_create_room_retries_on_taken_id() {
        // テスト項目: 使用済み ID に当たった場合は別の ID で再試行される
        // given (前提条件):
        let mut users = MockUserRepository::new();
        users
            .expect_find_user()
            .returning(|_| Ok(Some(UserRecord {
                username: Nickname::new("alice").unwrap(),
                password_hash: "h".to_string(),
                created_at: Timestamp::new(0),
            })));
        let mut rooms = MockRoomRepository::new();
        let mut checks = 0;
        rooms.expect_is_room_id_taken().times(3).returning(move |_| {
            checks += 1;
            Ok(checks <= 2)
        });
        rooms.expect_insert_room().times(1).returning(|_, _| Ok(()));
        let directory = RoomDirectory::new(
            BrokerState::shared(),
            Arc::new(users),
            Arc::new(rooms),
            Arc::new(FixedClock::from_millis(0)),
        );

        // when (操作):
        let result = directory.create_room("Team", &nick("alice"), None).await;

        // then (期待する結果):
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_create_room_gives_up_when_ids_exhausted() {
        // テスト項目: 全ての試行で ID が使用済みなら RoomIdExhausted になる
        // given (前提条件):
        let mut users = MockUserRepository::new();
        users
            .expect_find_user()
            .returning(|_| Ok(Some(UserRecord {
                username: Nickname::new("alice").unwrap(),
                password_hash: "h".to_string(),
                created_at: Timestamp::new(0),
            })));
        let mut rooms = MockRoomRepository::new();
        rooms
            .expect_is_room_id_taken()
            .times(MAX_ROOM_ID_ATTEMPTS)
            .returning(|_| Ok(true));
        rooms.expect_insert_room().never();
        let directory = RoomDirectory::new(
            BrokerState::shared(),
            Arc::new(users),
            Arc::new(rooms),
            Arc::new(FixedClock::from_millis(0)),
        );

        // when (操作):
        let result = directory.create_room("Team", &nick("alice"), None).await;

        // then (期待する結果):
        assert_eq!(result, Err(RoomDirectoryError::RoomIdExhausted));
    }

    #[tokio::test]
    async fn test_join_unknown_room() {
        // テスト項目: 存在しないルームへの参加は RoomNotFound になる
        // given (前提条件):
        let store = store_with_users(&["bob"]).await;
        let (directory, _state) = directory(store);

        // when (操作):
        let unknown = directory.join_room("Nope0000", &nick("bob")).await;
        let malformed = directory.join_room("x", &nick("bob")).await;

        // then (期待する結果):
        assert_eq!(
            unknown,
            Err(RoomDirectoryError::RoomNotFound("Nope0000".to_string()))
        );
        assert_eq!(malformed, Err(RoomDirectoryError::RoomNotFound("x".to_string())));
    }

    #[tokio::test]
    async fn test_join_twice_is_noop_success() {
        // テスト項目: 同じルームへの二重参加は成功し、生存メンバー数は変わらない
        // given (前提条件):
        let store = store_with_users(&["alice", "bob"]).await;
        let (directory, state) = directory(store);
        let room = directory.create_room("Team", &nick("alice"), None).await.unwrap();
        let bob = admitted(&state, "bob").await;
        directory
            .enter_room(bob, &nick("bob"), room.id.as_str())
            .await
            .unwrap();

        // when (操作):
        let again = directory
            .enter_room(bob, &nick("bob"), room.id.as_str())
            .await
            .unwrap();
        let name = directory.join_room(room.id.as_str(), &nick("bob")).await.unwrap();

        // then (期待する結果):
        assert_eq!(again.outcome, AttachOutcome::AlreadyMember);
        assert_eq!(name.as_str(), "Team");
        assert_eq!(state.lock().await.live_rooms.member_count(&room.id), 1);
        assert_eq!(directory.list_user_rooms(&nick("bob")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_enter_room_leaves_previous_room() {
        // テスト項目: 別のルームに参加すると以前のルームから暗黙に退出する
        // given (前提条件):
        let store = store_with_users(&["alice"]).await;
        let (directory, state) = directory(store);
        let first = directory.create_room("One", &nick("alice"), None).await.unwrap();
        let second = directory.create_room("Two", &nick("alice"), None).await.unwrap();
        let alice = admitted(&state, "alice").await;
        directory
            .enter_room(alice, &nick("alice"), first.id.as_str())
            .await
            .unwrap();

        // when (操作):
        let entered = directory
            .enter_room(alice, &nick("alice"), second.id.as_str())
            .await
            .unwrap();

        // then (期待する結果):
        assert_eq!(
            entered.outcome,
            AttachOutcome::Attached {
                previous: Some(first.id.clone())
            }
        );
        assert_eq!(directory.current_room(&alice).await, Some(second.id.clone()));
        assert_eq!(state.lock().await.live_rooms.member_count(&first.id), 0);
    }

    #[tokio::test]
    async fn test_attach_and_detach_live() {
        // テスト項目: attach_live / detach_live が生存メンバーと逆参照を管理する
        // given (前提条件):
        let store = store_with_users(&["alice"]).await;
        let (directory, state) = directory(store);
        let room = directory.create_room("Team", &nick("alice"), None).await.unwrap();
        let alice = admitted(&state, "alice").await;

        // when (操作):
        let outcome = directory.attach_live(alice, room.id.as_str()).await.unwrap();
        let detached = directory.detach_live(&alice).await;
        let detached_again = directory.detach_live(&alice).await;

        // then (期待する結果):
        assert_eq!(outcome, AttachOutcome::Attached { previous: None });
        assert_eq!(detached, Some(room.id.clone()));
        assert_eq!(detached_again, None);
    }

    #[tokio::test]
    async fn test_leave_room_keeps_entitlement() {
        // テスト項目: ルーム退出後もメンバーシップは残り再参加できる
        // given (前提条件):
        let store = store_with_users(&["alice"]).await;
        let (directory, state) = directory(store);
        let room = directory.create_room("Team", &nick("alice"), None).await.unwrap();
        let alice = admitted(&state, "alice").await;
        directory
            .enter_room(alice, &nick("alice"), room.id.as_str())
            .await
            .unwrap();

        // when (操作):
        let left = directory.leave_room(&alice).await;
        let left_again = directory.leave_room(&alice).await;

        // then (期待する結果):
        assert_eq!(
            left,
            Some(LeftRoom {
                id: room.id.clone(),
                name: room.name.clone()
            })
        );
        assert_eq!(left_again, None);
        assert_eq!(directory.current_room(&alice).await, None);
        assert_eq!(directory.list_user_rooms(&nick("alice")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_room_by_non_creator() {
        // テスト項目: 作成者以外の削除は NotCreator になり、状態は変わらない
        // given (前提条件):
        let store = store_with_users(&["alice", "bob"]).await;
        let (directory, state) = directory(store);
        let room = directory.create_room("Team", &nick("alice"), None).await.unwrap();
        let bob = admitted(&state, "bob").await;
        directory
            .enter_room(bob, &nick("bob"), room.id.as_str())
            .await
            .unwrap();

        // when (操作):
        let result = directory.delete_room(room.id.as_str(), &nick("bob")).await;

        // then (期待する結果):
        assert_eq!(
            result,
            Err(RoomDirectoryError::NotCreator(room.id.to_string()))
        );
        assert_eq!(directory.current_room(&bob).await, Some(room.id.clone()));
        assert_eq!(directory.list_user_rooms(&nick("bob")).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_room_evicts_members_and_entitlements() {
        // テスト項目: ルーム削除で全メンバーのルーム一覧から消え、生存メンバーは追い出される
        // given (前提条件):
        let store = store_with_users(&["alice", "bob"]).await;
        let (directory, state) = directory(store);
        let room = directory.create_room("Team", &nick("alice"), None).await.unwrap();
        let alice = admitted(&state, "alice").await;
        let bob = admitted(&state, "bob").await;
        for (conn, name) in [(alice, "alice"), (bob, "bob")] {
            directory
                .enter_room(conn, &nick(name), room.id.as_str())
                .await
                .unwrap();
        }

        // when (操作):
        let deleted = directory
            .delete_room(room.id.as_str(), &nick("alice"))
            .await
            .unwrap();

        // then (期待する結果):
        let mut evicted = deleted.evicted.clone();
        evicted.sort();
        let mut expected = vec![alice, bob];
        expected.sort();
        assert_eq!(evicted, expected);
        assert_eq!(directory.current_room(&alice).await, None);
        assert_eq!(directory.current_room(&bob).await, None);
        assert!(directory.list_user_rooms(&nick("alice")).await.unwrap().is_empty());
        assert!(directory.list_user_rooms(&nick("bob")).await.unwrap().is_empty());
        assert_eq!(
            directory.join_room(room.id.as_str(), &nick("bob")).await,
            Err(RoomDirectoryError::RoomNotFound(room.id.to_string()))
        );
    }

    #[tokio::test]
    async fn test_join_racing_delete_is_serialized() {
        // テスト項目: 参加と削除が競合しても、参加は削除前に完了するか RoomNotFound になる
        // given (前提条件):
        let store = store_with_users(&["alice", "bob"]).await;
        let (directory, state) = directory(store);
        let directory = Arc::new(directory);
        let room = directory.create_room("Team", &nick("alice"), None).await.unwrap();
        let bob = admitted(&state, "bob").await;

        // when (操作):
        let joiner = {
            let directory = directory.clone();
            let room_id = room.id.to_string();
            tokio::spawn(async move { directory.enter_room(bob, &nick("bob"), &room_id).await })
        };
        let deleter = {
            let directory = directory.clone();
            let room_id = room.id.to_string();
            tokio::spawn(async move { directory.delete_room(&room_id, &nick("alice")).await })
        };
        let joined = joiner.await.unwrap();
        let deleted = deleter.await.unwrap().unwrap();

        // then (期待する結果):
        match joined {
            Ok(_) => assert!(deleted.evicted.contains(&bob)),
            Err(e) => assert_eq!(e, RoomDirectoryError::RoomNotFound(room.id.to_string())),
        }
        assert_eq!(directory.current_room(&bob).await, None);
        assert!(directory.list_user_rooms(&nick("bob")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_room_overview_lists_entitled_and_live_members() {
        // テスト項目: ルーム概要に登録メンバーと生存メンバーが含まれる
        // given (前提条件):
        let store = store_with_users(&["alice", "bob"]).await;
        let (directory, state) = directory(store);
        let room = directory.create_room("Team", &nick("alice"), None).await.unwrap();
        let bob = admitted(&state, "bob").await;
        directory
            .enter_room(bob, &nick("bob"), room.id.as_str())
            .await
            .unwrap();

        // when (操作):
        let overview = directory.room_overview(room.id.as_str()).await.unwrap();
        let listed = directory.list_rooms().await.unwrap();

        // then (期待する結果):
        assert_eq!(overview.members, vec![nick("alice"), nick("bob")]);
        assert_eq!(overview.live_members, vec![nick("bob")]);
        assert_eq!(listed, vec![(room, 1)]);
    }
}
