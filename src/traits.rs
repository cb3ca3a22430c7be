//! Core traits for the host capabilities the task core depends on.
//!
//! Each trait is a seam: production code wires in `SQLite`, the system
//! clock and real notifiers, while tests use the doubles in
//! [`crate::testing`].

use crate::error::Result;
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Output from a command execution.
#[derive(Debug, Clone, Default)]
pub struct CommandOutput {
    /// The exit code of the command.
    pub exit_code: i32,
    /// The stdout output.
    pub stdout: String,
    /// The stderr output.
    pub stderr: String,
}

impl CommandOutput {
    /// Check if the command succeeded (exit code 0).
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// Trait for running external programs.
///
/// This trait abstracts command execution for testability.
pub trait CommandRunner: Send + Sync {
    /// Run a command with the given arguments and timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the command cannot be spawned or executed.
    fn run(&self, program: &str, args: &[&str], timeout: Option<Duration>)
        -> Result<CommandOutput>;

    /// Check if a program is available in PATH.
    fn is_available(&self, program: &str) -> bool;
}

/// Trait for the durable string blob storage supplied by the host.
///
/// The task core only ever stores whole serialized snapshots under a
/// single key, so a plain get/set interface is all it needs.
pub trait KeyValueStore: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove the value stored under `key`. Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<()>;
}

/// Outcome of asking the host for permission to show notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Permission {
    /// Notifications may be shown.
    Granted,
    /// The user or host refused notifications.
    Denied,
    /// No decision has been made yet.
    #[default]
    Default,
}

impl Permission {
    /// Whether notifications may be shown.
    #[must_use]
    pub const fn is_granted(self) -> bool {
        matches!(self, Self::Granted)
    }
}

/// Trait for the notification capability supplied by the host.
pub trait Notifier: Send + Sync {
    /// Ask for permission to show notifications.
    fn request_permission(&self) -> Permission;

    /// Show a notification. Must be a no-op unless permission was granted.
    fn notify(&self, title: &str, body: &str);
}

/// Trait for the authentication check supplied by the host.
pub trait AuthGate: Send + Sync {
    /// Whether the caller is currently authenticated.
    fn is_authenticated(&self) -> bool;

    /// Side effect performed when an action is refused.
    ///
    /// Returns the route the caller was sent to.
    fn redirect_to_login(&self) -> String;
}

/// Trait for reading the current time.
pub trait Clock: Send + Sync {
    /// The current instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Clock backed by the system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
