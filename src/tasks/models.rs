//! Task model types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a task: milliseconds since the epoch at creation, bumped
/// where needed so ids stay strictly increasing.
pub type TaskId = i64;

/// A task in the personal task list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    /// Unique identifier, monotonic by creation order.
    pub id: TaskId,
    /// Non-empty display name.
    #[serde(alias = "task_name")]
    pub name: String,
    /// Whether the task is done.
    #[serde(default)]
    pub completed: bool,
    /// When the task was created.
    #[serde(alias = "timestamp")]
    pub created_at: DateTime<Utc>,
    /// Single instant at which a notification should fire, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reminder: Option<DateTime<Utc>>,
}

impl Task {
    /// Create an open task without a reminder.
    pub fn new(id: TaskId, name: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self { id, name: name.into(), completed: false, created_at, reminder: None }
    }

    /// Whether this task's reminder should fire at `now`.
    ///
    /// Completed tasks never have a due reminder, even if one is still set.
    #[must_use]
    pub fn is_reminder_due(&self, now: DateTime<Utc>) -> bool {
        !self.completed && self.reminder.is_some_and(|at| at <= now)
    }
}
