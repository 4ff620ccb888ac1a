//! Configuration loading and representation.

use std::path::PathBuf;

use thiserror::Error;

/// Environment variable overriding the database location.
pub const DB_PATH_VAR: &str = "ATK_DB_PATH";

/// Environment variable overriding where exports are written.
pub const EXPORT_DIR_VAR: &str = "ATK_EXPORT_DIR";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve OS app data directory - tried data_dir() and home_dir()/.local/share")]
    NoDataDir,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// SQLite database holding both collections.
    pub db_path: PathBuf,
    /// Directory receiving exported spreadsheets.
    pub export_dir: PathBuf,
}

impl AppConfig {
    /// Resolve configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let db_path = match non_empty(DB_PATH_VAR) {
            Some(path) => PathBuf::from(path),
            None => {
                tracing::debug!("{DB_PATH_VAR} not set; using app data directory");
                default_db_path()?
            }
        };

        let export_dir = match non_empty(EXPORT_DIR_VAR) {
            Some(dir) => PathBuf::from(dir),
            None => {
                tracing::debug!("{EXPORT_DIR_VAR} not set; exporting to current directory");
                PathBuf::from(".")
            }
        };

        Ok(Self {
            db_path,
            export_dir,
        })
    }
}

/// `{app_data_dir}/atk-stock/atk.db`.
fn default_db_path() -> Result<PathBuf, ConfigError> {
    let mut dir = dirs::data_dir()
        .or_else(|| {
            dirs::home_dir().map(|mut h| {
                h.push(".local");
                h.push("share");
                h
            })
        })
        .ok_or(ConfigError::NoDataDir)?;

    dir.push("atk-stock");
    dir.push("atk.db");
    Ok(dir)
}
