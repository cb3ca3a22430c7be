//! Path utilities for determining data storage locations.
//!
//! Data lives in `~/.task-reminders/` unless `TASK_REMINDERS_HOME` points
//! somewhere else.

use crate::error::{Error, Result};
use std::path::{Path, PathBuf};

/// The base directory name for task-reminders data.
const DATA_DIR_NAME: &str = ".task-reminders";

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "TASK_REMINDERS_HOME";

/// The database filename.
pub const DATABASE_FILENAME: &str = "tasks.sqlite3";

/// The configuration filename.
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Get the base data directory.
///
/// Returns `$TASK_REMINDERS_HOME` when set and non-empty, otherwise
/// `~/.task-reminders/`.
///
/// # Errors
///
/// Returns [`Error::NoDataDir`] if neither the override nor a home
/// directory is available.
pub fn data_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(DATA_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir().map(|home| home.join(DATA_DIR_NAME)).ok_or(Error::NoDataDir)
}

/// Path of the task database inside a data directory.
#[must_use]
pub fn database_path(data_dir: &Path) -> PathBuf {
    data_dir.join(DATABASE_FILENAME)
}

/// Path of the configuration file inside a data directory.
#[must_use]
pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join(CONFIG_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    struct EnvGuard {
        original: Option<std::ffi::OsString>,
    }

    impl EnvGuard {
        fn set(value: &str) -> Self {
            let original = std::env::var_os(DATA_DIR_ENV);
            std::env::set_var(DATA_DIR_ENV, value);
            Self { original }
        }
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            match &self.original {
                Some(value) => std::env::set_var(DATA_DIR_ENV, value),
                None => std::env::remove_var(DATA_DIR_ENV),
            }
        }
    }

    #[test]
    #[serial]
    fn test_data_dir_uses_override() {
        let _guard = EnvGuard::set("/tmp/reminders-home");
        assert_eq!(data_dir().unwrap(), PathBuf::from("/tmp/reminders-home"));
    }

    #[test]
    #[serial]
    fn test_data_dir_ignores_empty_override() {
        let _guard = EnvGuard::set("");
        if let Some(home) = dirs::home_dir() {
            assert_eq!(data_dir().unwrap(), home.join(DATA_DIR_NAME));
        }
    }

    #[test]
    fn test_file_paths() {
        let base = Path::new("/data");
        assert_eq!(database_path(base), PathBuf::from("/data/tasks.sqlite3"));
        assert_eq!(config_path(base), PathBuf::from("/data/config.yaml"));
    }
}
