//! The user-facing task board: store operations behind the auth gate.
//!
//! Every user action re-checks the gate, so a session that expires while
//! the board is open stops further changes. The reminder scheduler works
//! on [`TaskBoard::shared`] directly and is not gated.

use crate::auth::guard;
use crate::error::Result;
use crate::tasks::store::{lock, SharedStore, TaskStore};
use crate::tasks::{Task, TaskId};
use crate::traits::{AuthGate, KeyValueStore};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

/// Authenticated view of a shared task store.
pub struct TaskBoard<S> {
    store: SharedStore<S>,
    gate: Arc<dyn AuthGate>,
}

impl<S> fmt::Debug for TaskBoard<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskBoard").finish_non_exhaustive()
    }
}

impl<S: KeyValueStore> TaskBoard<S> {
    /// Check the gate, then load `store` and open the board.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Unauthenticated`] without touching the store
    /// if the caller is not signed in.
    pub fn open(mut store: TaskStore<S>, gate: Arc<dyn AuthGate>) -> Result<Self> {
        guard(gate.as_ref())?;
        store.load();
        Ok(Self { store: store.into_shared(), gate })
    }

    /// The shared store, for handing to the reminder scheduler.
    pub fn shared(&self) -> SharedStore<S> {
        Arc::clone(&self.store)
    }

    /// Point-in-time copy of all tasks.
    pub fn snapshot(&self) -> Vec<Task> {
        lock(&self.store).snapshot()
    }

    /// See [`TaskStore::create`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Unauthenticated`] or any store error.
    pub fn create(&self, name: &str) -> Result<Task> {
        self.check()?;
        lock(&self.store).create(name)
    }

    /// See [`TaskStore::toggle_completed`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Unauthenticated`] or any store error.
    pub fn toggle_completed(&self, id: TaskId) -> Result<Option<Task>> {
        self.check()?;
        lock(&self.store).toggle_completed(id)
    }

    /// See [`TaskStore::rename`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Unauthenticated`] or any store error.
    pub fn rename(&self, id: TaskId, new_name: &str) -> Result<Option<Task>> {
        self.check()?;
        lock(&self.store).rename(id, new_name)
    }

    /// See [`TaskStore::set_reminder`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Unauthenticated`] or any store error.
    pub fn set_reminder(&self, id: TaskId, when: DateTime<Utc>) -> Result<Option<Task>> {
        self.check()?;
        lock(&self.store).set_reminder(id, when)
    }

    /// See [`TaskStore::set_reminder_from_input`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Unauthenticated`] or any store error.
    pub fn set_reminder_from_input(&self, id: TaskId, input: Option<&str>) -> Result<Option<Task>> {
        self.check()?;
        lock(&self.store).set_reminder_from_input(id, input)
    }

    /// See [`TaskStore::clear_reminder`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Unauthenticated`] or any store error.
    pub fn clear_reminder(&self, id: TaskId) -> Result<Option<Task>> {
        self.check()?;
        lock(&self.store).clear_reminder(id)
    }

    /// See [`TaskStore::delete`].
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Unauthenticated`] or any store error.
    pub fn delete(&self, id: TaskId) -> Result<bool> {
        self.check()?;
        lock(&self.store).delete(id)
    }

    fn check(&self) -> Result<()> {
        guard(self.gate.as_ref())
    }
}
