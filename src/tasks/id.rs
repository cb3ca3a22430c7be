//! Task ID allocation.
//!
//! IDs are derived from the creation timestamp in milliseconds. When two
//! tasks are created within the same millisecond (or the clock steps
//! backwards) the next ID is the previous one plus one, so IDs are strictly
//! increasing and never reused for the lifetime of a collection.

use crate::tasks::models::TaskId;
use chrono::{DateTime, Utc};

/// Hands out strictly increasing task IDs.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    /// Highest ID handed out or seen in the loaded collection.
    last: Option<TaskId>,
}

impl IdAllocator {
    /// Create an allocator that will never return an ID at or below `floor`.
    #[must_use]
    pub const fn starting_after(floor: Option<TaskId>) -> Self {
        Self { last: floor }
    }

    /// Allocate the ID for a task created at `now`.
    pub fn next(&mut self, now: DateTime<Utc>) -> TaskId {
        let candidate = now.timestamp_millis();
        let id = match self.last {
            Some(last) if candidate <= last => last.saturating_add(1),
            _ => candidate,
        };
        self.last = Some(id);
        id
    }

    /// The highest ID issued so far, if any.
    #[must_use]
    pub const fn last(&self) -> Option<TaskId> {
        self.last
    }
}
