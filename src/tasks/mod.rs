//! Task management.
//!
//! This module provides the task list itself:
//! - [`Task`] records with a name, completion flag and optional reminder
//! - Strictly increasing, timestamp-based ids
//! - Parsing of user-typed names and reminder times
//! - The [`TaskStore`] that owns the collection and mirrors it to storage
//!
//! # Example
//!
//! ```
//! use task_reminders::tasks::TaskStore;
//! use task_reminders::testing::MemoryKvStore;
//!
//! let mut store = TaskStore::open(MemoryKvStore::new());
//! let task = store.create("Pay rent").unwrap();
//! store.set_reminder_from_input(task.id, Some("+30m")).unwrap();
//! assert!(store.get(task.id).unwrap().reminder.is_some());
//! ```

pub mod codec;
pub mod id;
pub mod input;
pub mod models;
pub mod store;

pub use models::{Task, TaskId};
pub use store::{SharedStore, TaskStore, DEFAULT_STORAGE_KEY};
