//! Value objects for the chat broker domain.
//!
//! Every value object validates its input on construction, so the rest of the
//! crate never has to re-check a nickname or a room id.

use std::fmt;

use rand::{Rng, distributions::Alphanumeric};
use uuid::Uuid;

use super::error::ValueObjectError;

/// Maximum nickname length (characters)
pub const NICKNAME_MAX_LEN: usize = 50;

/// Length of a generated room identifier
pub const ROOM_ID_LEN: usize = 8;

/// Maximum room name length (characters)
pub const ROOM_NAME_MAX_LEN: usize = 64;

/// Maximum room description length (characters)
pub const ROOM_DESCRIPTION_MAX_LEN: usize = 200;

/// Identity of one accepted TCP connection.
///
/// Two sessions of the same user are two different connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Generate a fresh connection identity
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Authenticated username, used as the display nickname.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Nickname(String);

impl Nickname {
    /// Create a nickname.
    ///
    /// Leading/trailing whitespace is trimmed. The result must be non-empty,
    /// at most [`NICKNAME_MAX_LEN`] characters, and contain neither
    /// whitespace nor the `|` field separator.
    pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(ValueObjectError::NicknameEmpty);
        }
        if trimmed.chars().count() > NICKNAME_MAX_LEN {
            return Err(ValueObjectError::NicknameTooLong(NICKNAME_MAX_LEN));
        }
        if trimmed.chars().any(|c| c.is_whitespace() || c == '|') {
            return Err(ValueObjectError::NicknameInvalidCharacter);
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Nickname {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Short alphanumeric room identity shared with other users to invite them.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RoomId(String);

impl RoomId {
    /// Parse a room id typed by a user.
    ///
    /// Must be exactly [`ROOM_ID_LEN`] ASCII alphanumeric characters.
    /// Room ids are case sensitive.
    pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.len() != ROOM_ID_LEN || !trimmed.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ValueObjectError::RoomIdInvalid(trimmed.to_string()));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomId {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Factory for random room identities.
///
/// Uniqueness is not checked here; callers retry against the store.
pub struct RoomIdFactory;

impl RoomIdFactory {
    pub fn generate() -> RoomId {
        let value: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(ROOM_ID_LEN)
            .map(char::from)
            .collect();
        RoomId(value)
    }
}

/// Display name of a room.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoomName(String);

impl RoomName {
    pub fn new(value: impl Into<String>) -> Result<Self, ValueObjectError> {
        let value = value.into();
        let trimmed = value.trim();

        if trimmed.is_empty() {
            return Err(ValueObjectError::RoomNameEmpty);
        }
        if trimmed.chars().count() > ROOM_NAME_MAX_LEN {
            return Err(ValueObjectError::RoomNameTooLong(ROOM_NAME_MAX_LEN));
        }

        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for RoomName {
    type Error = ValueObjectError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl fmt::Display for RoomName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Normalize an optional room description.
///
/// Blank descriptions become `None`.
pub fn room_description(value: Option<&str>) -> Result<Option<String>, ValueObjectError> {
    let Some(trimmed) = value.map(str::trim).filter(|d| !d.is_empty()) else {
        return Ok(None);
    };
    if trimmed.chars().count() > ROOM_DESCRIPTION_MAX_LEN {
        return Err(ValueObjectError::RoomDescriptionTooLong(
            ROOM_DESCRIPTION_MAX_LEN,
        ));
    }
    Ok(Some(trimmed.to_string()))
}

/// Unix timestamp in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn new(value: i64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> i64 {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nickname_trims_whitespace() {
        // テスト項目: ニックネームの前後の空白が除去される
        // given (前提条件):
        let raw = "  alice \n";

        // when (操作):
        let nickname = Nickname::new(raw);

        // then (期待する結果):
        assert_eq!(nickname.unwrap().as_str(), "alice");
    }

    #[test]
    fn test_nickname_rejects_empty_and_separator() {
        // テスト項目: 空文字や区切り文字を含むニックネームは拒否される
        // given (前提条件):
        let empty = "   ";
        let with_pipe = "al|ice";
        let with_space = "al ice";

        // when (操作):
        let results = [
            Nickname::new(empty),
            Nickname::new(with_pipe),
            Nickname::new(with_space),
        ];

        // then (期待する結果):
        assert_eq!(results[0], Err(ValueObjectError::NicknameEmpty));
        assert_eq!(results[1], Err(ValueObjectError::NicknameInvalidCharacter));
        assert_eq!(results[2], Err(ValueObjectError::NicknameInvalidCharacter));
    }

    #[test]
    fn test_nickname_rejects_too_long() {
        // テスト項目: 上限を超える長さのニックネームは拒否される
        // given (前提条件):
        let long = "a".repeat(NICKNAME_MAX_LEN + 1);

        // when (操作):
        let result = Nickname::new(long);

        // then (期待する結果):
        assert_eq!(
            result,
            Err(ValueObjectError::NicknameTooLong(NICKNAME_MAX_LEN))
        );
    }

    #[test]
    fn test_generated_room_id_is_eight_alphanumerics() {
        // テスト項目: 生成されたルーム ID が 8 文字の英数字である
        // given (前提条件):

        // when (操作):
        let ids: Vec<RoomId> = (0..50).map(|_| RoomIdFactory::generate()).collect();

        // then (期待する結果):
        for id in ids {
            assert_eq!(id.as_str().len(), ROOM_ID_LEN);
            assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
            // 生成した ID はパースし直しても同じ値になる
            assert_eq!(RoomId::new(id.as_str()).unwrap(), id);
        }
    }

    #[test]
    fn test_room_id_rejects_wrong_shape() {
        // テスト項目: 長さや文字種が不正なルーム ID は拒否される
        // given (前提条件):
        let inputs = ["abc", "abcdefghi", "abcd-fgh", ""];

        // when (操作) / then (期待する結果):
        for input in inputs {
            assert!(RoomId::new(input).is_err(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn test_room_description_blank_is_none() {
        // テスト項目: 空白のみの説明文は None として扱われる
        // given (前提条件):
        let blank = Some("   ");

        // when (操作):
        let result = room_description(blank);

        // then (期待する結果):
        assert_eq!(result, Ok(None));
    }

    #[test]
    fn test_connection_ids_are_unique() {
        // テスト項目: 接続 ID は毎回異なる値が生成される
        // given (前提条件):

        // when (操作):
        let a = ConnectionId::generate();
        let b = ConnectionId::generate();

        // then (期待する結果):
        assert_ne!(a, b);
    }
}
