//! Notification adapters for the host environment.

use crate::traits::{CommandRunner, Notifier, Permission};
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tracing::{debug, warn};

/// Desktop notification helper invoked by [`DesktopNotifier`].
pub const NOTIFY_PROGRAM: &str = "notify-send";

/// Application name shown by the desktop notification daemon.
const APP_NAME: &str = "task-reminders";

/// How long to wait for the notification helper.
///
/// Passed to the [`CommandRunner`]; [`crate::command::RealCommandRunner`]
/// does not enforce it and waits for the helper to exit.
const NOTIFY_TIMEOUT: Duration = Duration::from_secs(5);

/// Prints notifications to a writer (stdout by default).
///
/// A terminal can always show text, so permission is always granted.
pub struct ConsoleNotifier {
    out: Mutex<Box<dyn Write + Send>>,
}

impl std::fmt::Debug for ConsoleNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConsoleNotifier").finish_non_exhaustive()
    }
}

impl Default for ConsoleNotifier {
    fn default() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }
}

impl ConsoleNotifier {
    /// Create a notifier writing to `out`.
    #[must_use]
    pub fn new(out: Box<dyn Write + Send>) -> Self {
        Self { out: Mutex::new(out) }
    }
}

impl Notifier for ConsoleNotifier {
    fn request_permission(&self) -> Permission {
        Permission::Granted
    }

    fn notify(&self, title: &str, body: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "[{}] {title}: {body}", chrono::Local::now().format("%H:%M"))
            .and_then(|()| out.flush())
        {
            warn!("cannot write notification: {e}");
        }
    }
}

/// Shows desktop notifications through `notify-send`.
///
/// Permission is granted when the helper is installed. Until
/// [`Notifier::request_permission`] has been called, notifications are
/// silently dropped.
pub struct DesktopNotifier {
    runner: Arc<dyn CommandRunner>,
    permission: Mutex<Permission>,
}

impl std::fmt::Debug for DesktopNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DesktopNotifier").field("permission", &self.permission).finish_non_exhaustive()
    }
}

impl DesktopNotifier {
    /// Create a notifier that runs helpers through `runner`.
    pub fn new(runner: Arc<dyn CommandRunner>) -> Self {
        Self { runner, permission: Mutex::new(Permission::Default) }
    }

    fn permission(&self) -> Permission {
        *self.permission.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for DesktopNotifier {
    fn request_permission(&self) -> Permission {
        let permission = if self.runner.is_available(NOTIFY_PROGRAM) {
            Permission::Granted
        } else {
            warn!("{NOTIFY_PROGRAM} not found; desktop notifications disabled");
            Permission::Denied
        };
        *self.permission.lock().unwrap_or_else(PoisonError::into_inner) = permission;
        permission
    }

    fn notify(&self, title: &str, body: &str) {
        if !self.permission().is_granted() {
            debug!(title, "notification permission not granted; dropping");
            return;
        }
        let args = ["--app-name", APP_NAME, title, body];
        match self.runner.run(NOTIFY_PROGRAM, &args, Some(NOTIFY_TIMEOUT)) {
            Ok(output) if output.success() => {}
            Ok(output) => {
                warn!(exit_code = output.exit_code, stderr = %output.stderr.trim(), "{NOTIFY_PROGRAM} failed");
            }
            Err(e) => warn!("cannot run {NOTIFY_PROGRAM}: {e}"),
        }
    }
}
