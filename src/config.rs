//! Configuration management for task-reminders.
//!
//! Settings live in `<data dir>/config.yaml`. A missing file means all
//! defaults.

use crate::auth::DEFAULT_LOGIN_ROUTE;
use crate::error::{Error, Result};
use crate::notify::NOTIFY_PROGRAM;
use crate::paths;
use crate::reminders::{DEFAULT_TICK_INTERVAL, MAX_TICK_INTERVAL};
use crate::tasks::store::DEFAULT_STORAGE_KEY;
use crate::traits::CommandRunner;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// How reminders are shown.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    /// Print to the terminal.
    #[default]
    Console,
    /// Desktop notifications through `notify-send`.
    Desktop,
}

/// Application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// Seconds between reminder scheduler ticks.
    pub tick_interval_secs: u64,

    /// Key the task collection is stored under.
    pub storage_key: String,

    /// Which notifier to use.
    pub notifier: NotifierKind,

    /// Where unauthenticated callers are sent.
    pub login_route: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: DEFAULT_TICK_INTERVAL.as_secs(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            notifier: NotifierKind::default(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
        }
    }
}

impl AppConfig {
    /// Load config from a data directory, returning None if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or is invalid.
    pub fn load_from(data_dir: &Path) -> Result<Option<Self>> {
        let config_path = paths::config_path(data_dir);
        if !config_path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&config_path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(Some(config))
    }

    /// Load config from a data directory, falling back to defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed or is invalid.
    pub fn load_or_default(data_dir: &Path) -> Result<Self> {
        Ok(Self::load_from(data_dir)?.unwrap_or_default())
    }

    /// Save config to a data directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, data_dir: &Path) -> Result<()> {
        let config_path = paths::config_path(data_dir);

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml::to_string(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Defaults, with the desktop notifier picked when its helper is installed.
    pub fn detect(runner: &dyn CommandRunner) -> Self {
        let notifier = if runner.is_available(NOTIFY_PROGRAM) {
            NotifierKind::Desktop
        } else {
            NotifierKind::Console
        };
        Self { notifier, ..Self::default() }
    }

    /// Get the config file path for a data directory.
    pub fn config_path(data_dir: &Path) -> PathBuf {
        paths::config_path(data_dir)
    }

    /// The scheduler tick interval.
    #[must_use]
    pub const fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }

    fn validate(&self) -> Result<()> {
        let max = MAX_TICK_INTERVAL.as_secs();
        if self.tick_interval_secs == 0 || self.tick_interval_secs > max {
            return Err(Error::validation(format!("tick_interval_secs must be between 1 and {max}")));
        }
        if self.storage_key.trim().is_empty() {
            return Err(Error::validation("storage_key must not be empty"));
        }
        Ok(())
    }
}

/// Ensure config exists in a data directory, creating it with detected
/// defaults if not.
///
/// Returns the config (either loaded or newly created).
///
/// # Errors
///
/// Returns an error if config cannot be loaded or saved.
pub fn ensure_config(runner: &dyn CommandRunner, data_dir: &Path) -> Result<AppConfig> {
    if let Some(config) = AppConfig::load_from(data_dir)? {
        return Ok(config);
    }

    let config = AppConfig::detect(runner);
    config.save_to(data_dir)?;
    Ok(config)
}
