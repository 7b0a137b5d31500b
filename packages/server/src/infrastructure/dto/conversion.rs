//! Conversion logic between DTOs and domain entities.

use crate::domain::{
    Membership, Nickname, RepositoryError, RoomId, RoomName, RoomRecord, Timestamp, UserRecord,
    ValueObjectError,
};
use crate::infrastructure::dto::persistence::{MembershipRow, RoomRow, UserRow};

use tertulia_shared::time::timestamp_to_rfc3339;

use super::http::RoomSummaryDto;

fn corrupt(e: ValueObjectError) -> RepositoryError {
    RepositoryError::Serialization(e.to_string())
}

// ========================================
// DTO → Domain Entity
// ========================================

impl TryFrom<UserRow> for UserRecord {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        Ok(Self {
            username: Nickname::new(row.username).map_err(corrupt)?,
            password_hash: row.password_hash,
            created_at: Timestamp::new(row.created_at),
        })
    }
}

impl TryFrom<RoomRow> for RoomRecord {
    type Error = RepositoryError;

    fn try_from(row: RoomRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: RoomId::new(row.id).map_err(corrupt)?,
            name: RoomName::new(row.name).map_err(corrupt)?,
            description: row.description,
            creator: Nickname::new(row.creator).map_err(corrupt)?,
            created_at: Timestamp::new(row.created_at),
        })
    }
}

impl TryFrom<MembershipRow> for Membership {
    type Error = RepositoryError;

    fn try_from(row: MembershipRow) -> Result<Self, Self::Error> {
        Ok(Self {
            room_id: RoomId::new(row.room_id).map_err(corrupt)?,
            username: Nickname::new(row.username).map_err(corrupt)?,
            joined_at: Timestamp::new(row.joined_at),
        })
    }
}

// ========================================
// Domain Entity → DTO
// ========================================

impl From<&UserRecord> for UserRow {
    fn from(model: &UserRecord) -> Self {
        Self {
            username: model.username.as_str().to_string(),
            password_hash: model.password_hash.clone(),
            created_at: model.created_at.value(),
        }
    }
}

impl From<&RoomRecord> for RoomRow {
    fn from(model: &RoomRecord) -> Self {
        Self {
            id: model.id.as_str().to_string(),
            name: model.name.as_str().to_string(),
            description: model.description.clone(),
            creator: model.creator.as_str().to_string(),
            created_at: model.created_at.value(),
        }
    }
}

impl From<&Membership> for MembershipRow {
    fn from(model: &Membership) -> Self {
        Self {
            room_id: model.room_id.as_str().to_string(),
            username: model.username.as_str().to_string(),
            joined_at: model.joined_at.value(),
        }
    }
}

impl RoomSummaryDto {
    pub fn from_record(record: &RoomRecord, live_member_count: usize) -> Self {
        Self {
            id: record.id.as_str().to_string(),
            name: record.name.as_str().to_string(),
            description: record.description.clone(),
            creator: record.creator.as_str().to_string(),
            created_at: timestamp_to_rfc3339(record.created_at.value()),
            live_member_count,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_row_to_domain() {
        // テスト項目: 永続化行の RoomRow がドメインエンティティに変換される
        // given (前提条件):
        let row = RoomRow {
            id: "AbCd1234".to_string(),
            name: "Team".to_string(),
            description: Some("weekly".to_string()),
            creator: "alice".to_string(),
            created_at: 1000,
        };

        // when (操作):
        let record = RoomRecord::try_from(row.clone()).unwrap();

        // then (期待する結果):
        assert_eq!(record.id.as_str(), "AbCd1234");
        assert_eq!(record.creator.as_str(), "alice");
        assert_eq!(RoomRow::from(&record), row);
    }

    #[test]
    fn test_corrupt_row_is_serialization_error() {
        // テスト項目: 不正な値を含む行は Serialization エラーになる
        // given (前提条件):
        let row = MembershipRow {
            room_id: "short".to_string(),
            username: "alice".to_string(),
            joined_at: 0,
        };

        // when (操作):
        let result = Membership::try_from(row);

        // then (期待する結果):
        assert!(matches!(result, Err(RepositoryError::Serialization(_))));
    }

    #[test]
    fn test_room_summary_from_record() {
        // テスト項目: RoomRecord と生存メンバー数から RoomSummaryDto が作られる
        // given (前提条件):
        let record = RoomRecord {
            id: RoomId::new("ZZZZ0000").unwrap(),
            name: RoomName::new("Lobby").unwrap(),
            description: None,
            creator: Nickname::new("bob").unwrap(),
            created_at: Timestamp::new(1_700_000_000_000),
        };

        // when (操作):
        let dto = RoomSummaryDto::from_record(&record, 3);

        // then (期待する結果):
        assert_eq!(dto.id, "ZZZZ0000");
        assert_eq!(dto.live_member_count, 3);
        assert!(dto.created_at.is_some());
    }
}
