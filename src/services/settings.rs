//! Runtime-editable configuration, persisted back to the config file.

use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

use crate::auth::Privilege;
use crate::config::Config;

/// Keys that actions may change at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Setting {
    Debug,
    DeleteOlderThanDays,
    SkipWeekends,
    DefaultPrivilege,
    DatabaseHost,
    DatabaseBase,
    DatabaseUser,
    DatabasePass,
    SetupMode,
}

impl Setting {
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Debug => "general.debug",
            Self::DeleteOlderThanDays => "board.delete_older_than_days",
            Self::SkipWeekends => "board.skip_weekends",
            Self::DefaultPrivilege => "board.default_privilege",
            Self::DatabaseHost => "database.host",
            Self::DatabaseBase => "database.base",
            Self::DatabaseUser => "database.user",
            Self::DatabasePass => "database.pass",
            Self::SetupMode => "general.setup_mode",
        }
    }

    fn apply(self, config: &mut Config, value: &str) -> Result<(), SettingsError> {
        let invalid = || SettingsError::InvalidValue {
            key: self.key(),
            value: value.to_string(),
        };

        match self {
            Self::Debug => config.general.debug = parse_flag(value).ok_or_else(invalid)?,
            Self::SetupMode => config.general.setup_mode = parse_flag(value).ok_or_else(invalid)?,
            Self::SkipWeekends => config.board.skip_weekends = parse_flag(value).ok_or_else(invalid)?,
            Self::DeleteOlderThanDays => {
                config.board.delete_older_than_days =
                    value.trim().parse().map_err(|_| invalid())?;
            }
            Self::DefaultPrivilege => {
                config.board.default_privilege =
                    Privilege::from_str(value).map_err(|_| invalid())?;
            }
            Self::DatabaseHost => {
                if value.trim().is_empty() {
                    return Err(invalid());
                }
                config.database.host = value.trim().to_string();
            }
            Self::DatabaseBase => config.database.base = value.trim().to_string(),
            Self::DatabaseUser => config.database.user = value.to_string(),
            Self::DatabasePass => config.database.pass = value.to_string(),
        }
        Ok(())
    }
}

/// Checkbox-style flags: `1`/`0`, `true`/`false`, `on`/`off`, `yes`/`no`.
fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },

    #[error("failed to persist settings: {0}")]
    Persist(String),
}

#[async_trait::async_trait]
pub trait SettingsStore: Send + Sync {
    async fn snapshot(&self) -> Config;

    /// Validates every change, applies them together and persists.
    /// Nothing is applied if any value is rejected.
    async fn apply(&self, changes: &[(Setting, &str)]) -> Result<(), SettingsError>;
}

/// Settings backed by the shared in-memory [`Config`] and, when a path is
/// known, the TOML file it was loaded from.
pub struct ConfigFile {
    config: Arc<RwLock<Config>>,
    path: Option<PathBuf>,
}

impl ConfigFile {
    #[must_use]
    pub const fn new(config: Arc<RwLock<Config>>, path: Option<PathBuf>) -> Self {
        Self { config, path }
    }
}

#[async_trait::async_trait]
impl SettingsStore for ConfigFile {
    async fn snapshot(&self) -> Config {
        self.config.read().await.clone()
    }

    async fn apply(&self, changes: &[(Setting, &str)]) -> Result<(), SettingsError> {
        let mut guard = self.config.write().await;

        let mut updated = guard.clone();
        for (setting, value) in changes {
            setting.apply(&mut updated, value)?;
        }

        if let Some(path) = &self.path {
            let path = path.clone();
            let to_save = updated.clone();
            tokio::task::spawn_blocking(move || to_save.save_to_path(&path))
                .await
                .map_err(|e| SettingsError::Persist(e.to_string()))?
                .map_err(|e| SettingsError::Persist(format!("{e:#}")))?;
        }

        *guard = updated;
        drop(guard);

        let keys: Vec<&str> = changes.iter().map(|(s, _)| s.key()).collect();
        info!(?keys, "Settings updated");
        Ok(())
    }
}
