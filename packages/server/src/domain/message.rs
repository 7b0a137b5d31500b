//! Message envelopes and their textual rendering.

use chrono::{DateTime, FixedOffset};
use sha2::{Digest, Sha256};

use super::value_object::{ConnectionId, Nickname, RoomId};

pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";

/// ANSI 256-color tags assigned to nicknames
pub const PALETTE: [&str; 8] = [
    "\x1b[38;5;196m",
    "\x1b[38;5;208m",
    "\x1b[38;5;226m",
    "\x1b[38;5;82m",
    "\x1b[38;5;39m",
    "\x1b[38;5;99m",
    "\x1b[38;5;51m",
    "\x1b[38;5;214m",
];

/// Tag used for system messages
pub const SYSTEM_TAG: &str = PALETTE[5];

/// Who receives a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// Every registered connection
    Global { excluding: Option<ConnectionId> },
    /// Live members of one room
    Room {
        room_id: RoomId,
        excluding: Option<ConnectionId>,
    },
    /// A single connection
    Direct(ConnectionId),
}

/// A message on its way out. Never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// `None` for system messages
    pub sender: Option<Nickname>,
    pub body: String,
    pub audience: Audience,
}

impl Envelope {
    pub fn chat(sender: Nickname, body: impl Into<String>, audience: Audience) -> Self {
        Self {
            sender: Some(sender),
            body: body.into(),
            audience,
        }
    }

    pub fn system(body: impl Into<String>, audience: Audience) -> Self {
        Self {
            sender: None,
            body: body.into(),
            audience,
        }
    }

    pub fn is_system(&self) -> bool {
        self.sender.is_none()
    }

    pub fn render(&self, now: &DateTime<FixedOffset>) -> String {
        match &self.sender {
            Some(sender) => format_message(now, sender.as_str(), &self.body, false),
            None => format_message(now, "", &self.body, true),
        }
    }
}

/// Stable color tag for a nickname.
///
/// Derived from SHA-256 so it is identical across sessions and restarts.
pub fn color_for_nickname(nickname: &str) -> &'static str {
    let digest = Sha256::digest(nickname.as_bytes());
    let bucket = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    PALETTE[bucket as usize % PALETTE.len()]
}

/// Render `[HH:MM] sender: body`; system messages drop the sender and use
/// the fixed system tag.
pub fn format_message(
    now: &DateTime<FixedOffset>,
    sender: &str,
    body: &str,
    is_system: bool,
) -> String {
    let ts = tertulia_shared::time::format_hour_minute(now);
    if is_system {
        format!("{BOLD}[{ts}]{RESET} {SYSTEM_TAG}* {body}{RESET}")
    } else {
        let color = color_for_nickname(sender);
        format!("{BOLD}[{ts}]{RESET} {color}{sender}{RESET}: {body}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_time() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2024, 3, 9, 21, 45, 30)
            .unwrap()
    }

    #[test]
    fn test_format_chat_message() {
        // テスト項目: チャットメッセージに時刻・送信者・本文が含まれる
        // given (前提条件):
        let now = fixed_time();

        // when (操作):
        let rendered = format_message(&now, "alice", "hola", false);

        // then (期待する結果):
        let color = color_for_nickname("alice");
        assert_eq!(
            rendered,
            format!("{BOLD}[21:45]{RESET} {color}alice{RESET}: hola")
        );
    }

    #[test]
    fn test_format_system_message_omits_sender() {
        // テスト項目: システムメッセージは送信者を含まず固定タグを使う
        // given (前提条件):
        let now = fixed_time();

        // when (操作):
        let rendered = format_message(&now, "alice", "bob joined the chat.", true);

        // then (期待する結果):
        assert_eq!(
            rendered,
            format!("{BOLD}[21:45]{RESET} {SYSTEM_TAG}* bob joined the chat.{RESET}")
        );
        assert!(!rendered.contains("alice"));
    }

    #[test]
    fn test_color_is_stable_per_nickname() {
        // テスト項目: 同じニックネームには常に同じ色が割り当てられる
        // given (前提条件):
        let names = ["alice", "bob", "charlie", "dave"];

        // when (操作) / then (期待する結果):
        for name in names {
            assert_eq!(color_for_nickname(name), color_for_nickname(name));
            assert!(PALETTE.contains(&color_for_nickname(name)));
        }
    }

    #[test]
    fn test_envelope_render_uses_sender() {
        // テスト項目: Envelope の描画は送信者の有無で書式が切り替わる
        // given (前提条件):
        let now = fixed_time();
        let alice = Nickname::new("alice").unwrap();
        let chat = Envelope::chat(alice, "hi", Audience::Global { excluding: None });
        let notice = Envelope::system("notice", Audience::Global { excluding: None });

        // when (操作):
        let chat_rendered = chat.render(&now);
        let notice_rendered = notice.render(&now);

        // then (期待する結果):
        assert!(!chat.is_system());
        assert!(notice.is_system());
        assert!(chat_rendered.contains("alice"));
        assert!(notice_rendered.contains("* notice"));
    }
}
