//! UI utilities for the client.

use std::{borrow::Cow, io::Write};

use rustyline::{
    ColorMode, Config, Editor, Helper, completion::Completer, highlight::Highlighter,
    hint::Hinter, history::DefaultHistory, validate::Validator,
};

use crate::error::ClientError;

/// Print a server frame, then redisplay the prompt
pub fn print_incoming(text: &str, username: &str) {
    print!("\r{}\n", text);
    redisplay_prompt(username);
}

/// Redisplay the prompt after receiving a message
pub fn redisplay_prompt(username: &str) {
    print!("{}> ", username);
    std::io::stdout().flush().ok();
}

/// Renders every typed character as `*`
pub struct MaskingHelper;

impl Highlighter for MaskingHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Owned("*".repeat(line.chars().count()))
    }

    fn highlight_char(&self, _line: &str, _pos: usize, _forced: bool) -> bool {
        true
    }
}

impl Completer for MaskingHelper {
    type Candidate = String;
}

impl Hinter for MaskingHelper {
    type Hint = String;
}

impl Validator for MaskingHelper {}

impl Helper for MaskingHelper {}

/// Prompt for a password without echoing it; nothing is kept in history
pub fn read_password(prompt: &str) -> Result<String, ClientError> {
    let config = Config::builder()
        .auto_add_history(false)
        .color_mode(ColorMode::Forced)
        .build();
    let mut rl: Editor<MaskingHelper, DefaultHistory> =
        Editor::with_config(config).map_err(|e| ClientError::Input(e.to_string()))?;
    rl.set_helper(Some(MaskingHelper));

    rl.readline(prompt)
        .map_err(|e| ClientError::Input(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masking_helper_hides_every_character() {
        // テスト項目: 入力中のパスワードは文字数分の * で表示される
        // given (前提条件):
        let helper = MaskingHelper;

        // when (操作):
        let shown = helper.highlight("contraseña", 3);

        // then (期待する結果):
        assert_eq!(shown, "**********");
    }
}
