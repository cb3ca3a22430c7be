//! # `task_reminders`
//!
//! A personal task list with one-shot reminders. Tasks live in memory and
//! are mirrored to a key-value store after every change; a periodic
//! scheduler fires each due reminder exactly once and then clears it.

pub mod auth;
pub mod board;
#[cfg(feature = "cli")]
pub mod cli;
pub mod command;
pub mod config;
pub mod error;
#[cfg(feature = "cli")]
pub mod logging;
pub mod notify;
pub mod paths;
pub mod reminders;
pub mod storage;
pub mod tasks;
pub mod testing;
pub mod traits;

pub use error::{Error, Result};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
