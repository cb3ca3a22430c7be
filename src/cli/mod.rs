//! Command-line interface for task-reminders.
//!
//! Parsing lives here; execution is in [`run`], which returns the output
//! instead of printing it so commands can be tested in-process.

mod run;

#[cfg(test)]
mod tests;

pub use run::{run, CliOutput};

use crate::tasks::TaskId;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Personal task list with one-shot reminders.
///
/// Data lives in ~/.task-reminders/ unless --data-dir or
/// TASK_REMINDERS_HOME says otherwise. Most commands need a session:
/// run `task-reminders login --token <TOKEN>` first.
#[derive(Parser, Debug)]
#[command(name = "task-reminders")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding the task database and config.
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new task.
    Add {
        /// Task name
        name: String,
    },

    /// List all tasks in creation order.
    List {
        /// Print the tasks as JSON
        #[arg(long)]
        json: bool,
    },

    /// Mark a task done, or not done again.
    Toggle {
        /// Task ID
        id: TaskId,
    },

    /// Rename a task.
    Rename {
        /// Task ID
        id: TaskId,
        /// New name
        name: String,
    },

    /// Set a task's reminder.
    ///
    /// WHEN may be "YYYY-MM-DD HH:MM" (local time), RFC 3339, or relative
    /// such as "+30m", "in 2h" or "45s". Without WHEN the current reminder
    /// is kept, or one hour from now is used.
    Remind {
        /// Task ID
        id: TaskId,
        /// When to fire
        when: Option<String>,
    },

    /// Remove a task's reminder.
    Unremind {
        /// Task ID
        id: TaskId,
    },

    /// Delete a task.
    Delete {
        /// Task ID
        id: TaskId,
    },

    /// Fire every reminder that is due now, once.
    Tick,

    /// Keep firing reminders as they fall due, until Ctrl-C.
    Watch {
        /// Stop after this many seconds instead of waiting for Ctrl-C
        #[arg(long = "for", value_name = "SECS")]
        for_secs: Option<u64>,
    },

    /// Store a session token.
    Login {
        /// Session token
        #[arg(long)]
        token: String,
    },

    /// Forget the session token.
    Logout,

    /// Ensure config file exists (create with defaults if not).
    #[command(name = "ensure-config")]
    EnsureConfig,

    /// Show version information.
    Version,
}
