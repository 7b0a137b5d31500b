//! Domain logic for client-side operations.
//!
//! Pure functions, kept apart from the socket and terminal code.

use tertulia_server::{
    domain::{AuthAction, AuthRequest},
    infrastructure::codec::CodecKind,
};

use crate::error::ClientError;

/// Whether the error ends the client without any reconnect attempt
pub fn should_exit_immediately(error: &ClientError) -> bool {
    matches!(
        error,
        ClientError::AuthRejected(_) | ClientError::Codec(_) | ClientError::Input(_)
    )
}

/// Whether to try again after `error`, given attempts made so far
pub fn should_attempt_reconnect(
    error: &ClientError,
    current_attempt: u32,
    max_attempts: u32,
) -> bool {
    if should_exit_immediately(error) {
        return false;
    }

    current_attempt < max_attempts
}

/// Build the handshake frame.
///
/// Plain sessions send the three-field form; any other codec is named in
/// a fourth field.
pub fn auth_request(
    action: AuthAction,
    username: &str,
    password: &str,
    codec: CodecKind,
) -> AuthRequest {
    AuthRequest {
        action,
        username: username.to_string(),
        password: password.to_string(),
        codec: (codec != CodecKind::Plain).then(|| codec.as_str().to_string()),
    }
}

/// The action for a given attempt: reconnects always log in
pub fn action_for_attempt(register: bool, attempt: u32) -> AuthAction {
    if register && attempt == 0 {
        AuthAction::Register
    } else {
        AuthAction::Login
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_should_exit_immediately_with_auth_rejection() {
        // テスト項目: 認証拒否の場合、即座に終了すべきと判定される
        // given (前提条件):
        let error = ClientError::AuthRejected("Invalid username or password".to_string());

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(result);
    }

    #[test]
    fn test_should_exit_immediately_with_connection_error() {
        // テスト項目: ConnectionError の場合、即座に終了すべきではないと判定される
        // given (前提条件):
        let error = ClientError::ConnectionError("network error".to_string());

        // when (操作):
        let result = should_exit_immediately(&error);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_should_attempt_reconnect_within_limit() {
        // テスト項目: 接続エラーで試行回数が上限未満なら再接続する
        // given (前提条件):
        let error = ClientError::ConnectionError("reset".to_string());

        // when (操作) / then (期待する結果):
        assert!(should_attempt_reconnect(&error, 0, 5));
        assert!(should_attempt_reconnect(&error, 4, 5));
        assert!(!should_attempt_reconnect(&error, 5, 5));
    }

    #[test]
    fn test_should_not_reconnect_after_auth_rejection() {
        // テスト項目: 認証拒否の後は試行回数に関係なく再接続しない
        // given (前提条件):
        let error = ClientError::AuthRejected("User already connected".to_string());

        // when (操作):
        let result = should_attempt_reconnect(&error, 0, 5);

        // then (期待する結果):
        assert!(!result);
    }

    #[test]
    fn test_auth_request_plain_uses_three_fields() {
        // テスト項目: plain コーデックでは 3 フィールドの認証フレームになる
        // given (前提条件):
        let request = auth_request(AuthAction::Login, "alice", "pw", CodecKind::Plain);

        // when (操作):
        let frame = request.to_frame();

        // then (期待する結果):
        assert_eq!(frame, "LOGIN|alice|pw");
    }

    #[test]
    fn test_auth_request_sealed_names_codec() {
        // テスト項目: sealed コーデックでは 4 番目のフィールドにコーデック名が入る
        // given (前提条件):
        let request = auth_request(AuthAction::Register, "bob", "pw", CodecKind::Sealed);

        // when (操作):
        let frame = request.to_frame();

        // then (期待する結果):
        assert_eq!(frame, "REGISTER|bob|pw|sealed");
    }

    #[test]
    fn test_reconnect_attempts_log_in() {
        // テスト項目: 登録は最初の試行のみで、再接続はログインになる
        // given (前提条件):
        let register = true;

        // when (操作) / then (期待する結果):
        assert_eq!(action_for_attempt(register, 0), AuthAction::Register);
        assert_eq!(action_for_attempt(register, 1), AuthAction::Login);
        assert_eq!(action_for_attempt(false, 0), AuthAction::Login);
    }
}
