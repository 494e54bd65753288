//! Platform-specific logging and data directory resolution.

use std::path::PathBuf;

const APP_NAME: &str = "stowbar";

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", APP_NAME)
}

/// Returns the platform-appropriate directory for log files.
///
/// | Platform | Directory |
/// |----------|-----------|
/// | macOS | `~/Library/Logs/stowbar` |
/// | Linux | `$XDG_STATE_HOME/stowbar/logs` or `~/.local/state/stowbar/logs` |
/// | Other | `<data_local_dir>/logs` |
///
/// Falls back to a directory under the system temp dir when no home
/// directory can be determined.
pub fn log_dir() -> PathBuf {
    let Some(base) = project_dirs() else {
        return std::env::temp_dir().join(APP_NAME).join("logs");
    };

    #[cfg(target_os = "macos")]
    {
        // data_local_dir → ~/Library/Application Support/stowbar
        // parent         → ~/Library/Application Support
        // parent         → ~/Library
        let library = base
            .data_local_dir()
            .parent()
            .and_then(|p| p.parent())
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| base.data_local_dir().to_path_buf());
        library.join("Logs").join(APP_NAME)
    }

    #[cfg(target_os = "linux")]
    {
        base.state_dir()
            .map(|p| p.to_path_buf())
            .unwrap_or_else(|| base.data_local_dir().join("state"))
            .join("logs")
    }

    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        base.data_local_dir().join("logs")
    }
}

/// Ensures the log directory exists, creating it if necessary.
pub fn ensure_log_dir() -> Result<PathBuf, std::io::Error> {
    let dir = log_dir();
    std::fs::create_dir_all(&dir)?;
    Ok(dir)
}

/// File name prefix for the rolling appender (e.g. `stowbar.2026-03-01.log`).
pub const LOG_FILE_PREFIX: &str = "stowbar.log";

/// Returns the directory holding persisted settings and layout data.
pub fn data_dir() -> PathBuf {
    project_dirs()
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
}

/// Returns the directory holding `config.json`.
pub fn config_dir() -> PathBuf {
    project_dirs()
        .map(|d| d.config_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join(APP_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_dir_mentions_app_name() {
        let dir = log_dir();
        assert!(dir.to_string_lossy().contains(APP_NAME));
    }

    #[test]
    fn test_data_and_config_dirs_are_absolute() {
        assert!(data_dir().is_absolute());
        assert!(config_dir().is_absolute());
    }
}
