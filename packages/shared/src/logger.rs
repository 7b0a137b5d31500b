//! Logging setup utilities for the Tertulia binaries.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Crates whose events are enabled by the default filter.
const WORKSPACE_CRATES: [&str; 3] = ["tertulia_server", "tertulia_client", "tertulia_shared"];

/// Build the default `EnvFilter` directive string.
///
/// Every workspace crate and the running binary get `default_log_level`.
pub fn default_directives(binary_name: &str, default_log_level: &str) -> String {
    let mut directives: Vec<String> = WORKSPACE_CRATES
        .iter()
        .map(|krate| format!("{}={}", krate, default_log_level))
        .collect();

    let binary_target = binary_name.replace('-', "_");
    if !WORKSPACE_CRATES.contains(&binary_target.as_str()) {
        directives.push(format!("{}={}", binary_target, default_log_level));
    }

    directives.join(",")
}

/// Initialize the tracing subscriber with the specified default log level.
///
/// The log level can be overridden using the `RUST_LOG` environment variable.
///
/// # Arguments
///
/// * `binary_name` - The name of the binary (e.g., "tertulia-server")
/// * `default_log_level` - The default log level (e.g., "debug", "info", "warn", "error")
///
/// # Examples
///
/// ```no_run
/// use tertulia_shared::logger::setup_logger;
///
/// setup_logger("tertulia-server", "debug");
/// ```
pub fn setup_logger(binary_name: &str, default_log_level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_directives(binary_name, default_log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_cover_workspace_crates() {
        // テスト項目: ワークスペースの全クレートにデフォルトレベルが設定される
        // given (前提条件):
        let binary_name = "tertulia-server";

        // when (操作):
        let directives = default_directives(binary_name, "debug");

        // then (期待する結果):
        assert_eq!(
            directives,
            "tertulia_server=debug,tertulia_client=debug,tertulia_shared=debug"
        );
    }

    #[test]
    fn test_default_directives_add_unknown_binary() {
        // テスト項目: ワークスペース外のバイナリ名は追加のディレクティブになる
        // given (前提条件):
        let binary_name = "load-tester";

        // when (操作):
        let directives = default_directives(binary_name, "info");

        // then (期待する結果):
        assert!(directives.ends_with(",load_tester=info"));
    }
}
