mod config;
pub mod database;
pub mod migrations;

pub use config::{Config, PomodoroConfig, SettingKey, Settings, MOTIVATION_OFF};
pub use database::{Database, USER_STATS_KEY};

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns the directory holding `taskquest.db` and `config.toml`.
///
/// `TASKQUEST_DATA_DIR` wins if set. Otherwise `~/.config/taskquest[-dev]/`,
/// with the `-dev` suffix when `TASKQUEST_ENV=dev`.
///
/// # Errors
/// Returns an error if creating the directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let dir = match std::env::var_os("TASKQUEST_DATA_DIR") {
        Some(dir) => PathBuf::from(dir),
        None => {
            let base_dir = dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".config");

            let env = std::env::var("TASKQUEST_ENV").unwrap_or_else(|_| "production".to_string());
            if env == "dev" {
                base_dir.join("taskquest-dev")
            } else {
                base_dir.join("taskquest")
            }
        }
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
