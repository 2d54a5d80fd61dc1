use std::path::PathBuf;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

// ── Logging bootstrap ──────────────────────────────────────────────────────────

/// Initialise the global `tracing` subscriber.
///
/// `log_level` is mapped to a [`tracing_subscriber::EnvFilter`] directive.
/// Falls back to `"info"` if the level string is not recognised.
pub fn setup_logging(log_level: &str) -> anyhow::Result<()> {
    // The CLI accepts Python-style level names; tracing uses lowercase.
    let upper = log_level.to_uppercase();
    let normalised = match upper.as_str() {
        "DEBUG" | "CRITICAL" => "debug",
        "INFO" => "info",
        "WARNING" => "warn",
        "ERROR" => "error",
        other => other,
    };

    let filter = EnvFilter::try_new(normalised).unwrap_or_else(|_| EnvFilter::new("info"));

    let subscriber = fmt::layer().with_target(false).with_thread_ids(false);

    tracing_subscriber::registry()
        .with(filter)
        .with(subscriber)
        .init();

    Ok(())
}

// ── Data-path discovery ────────────────────────────────────────────────────────

/// Attempt to locate the Claude Code log directory on the local system.
///
/// Checks the following paths in order and returns the first that exists:
/// 1. `~/.claude/projects/`
/// 2. `~/.config/claude/projects/`
///
/// Returns `None` when neither path exists.
pub fn discover_data_path() -> Option<PathBuf> {
    let home = dirs::home_dir()?;
    let candidates = [
        home.join(".claude").join("projects"),
        home.join(".config").join("claude").join("projects"),
    ];
    candidates.into_iter().find(|p| p.exists())
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    // One test covers all discovery cases: the scenarios share the HOME
    // override, and interleaving overrides across parallel tests would race.
    #[test]
    fn test_discover_data_path_candidates() {
        let tmp = TempDir::new().expect("tempdir");
        let original_home = std::env::var_os("HOME");
        std::env::set_var("HOME", tmp.path());

        // Neither candidate exists yet.
        let none = discover_data_path();

        // Only the XDG-style fallback exists.
        let config_projects = tmp.path().join(".config").join("claude").join("projects");
        std::fs::create_dir_all(&config_projects).expect("create fallback dir");
        let fallback = discover_data_path();

        // Once ~/.claude/projects exists it takes precedence.
        let claude_projects = tmp.path().join(".claude").join("projects");
        std::fs::create_dir_all(&claude_projects).expect("create primary dir");
        let primary = discover_data_path();

        match original_home {
            Some(v) => std::env::set_var("HOME", v),
            None => std::env::remove_var("HOME"),
        }

        assert!(none.is_none(), "no candidate should be found in a bare home");
        assert_eq!(fallback, Some(config_projects));
        assert_eq!(primary, Some(claude_projects));
    }
}
