//! The authoritative task collection and its durable mirror.

use crate::error::{Error, Result};
use crate::tasks::codec;
use crate::tasks::id::IdAllocator;
use crate::tasks::input::{default_reminder, normalize_name, parse_reminder};
use crate::tasks::models::{Task, TaskId};
use crate::traits::{Clock, KeyValueStore, SystemClock};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};

/// Key under which the collection is persisted by default.
pub const DEFAULT_STORAGE_KEY: &str = "tasks";

/// A task store shared between the UI and the reminder scheduler.
pub type SharedStore<S> = Arc<Mutex<TaskStore<S>>>;

/// Lock a shared store, recovering the data if a previous holder panicked.
///
/// Every mutation leaves the collection consistent before it can panic, so
/// a poisoned lock still guards usable state.
pub fn lock<S: KeyValueStore>(store: &SharedStore<S>) -> MutexGuard<'_, TaskStore<S>> {
    store.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Owner of the in-memory task list.
///
/// Every mutation updates memory first and then writes the full snapshot to
/// the [`KeyValueStore`]. A failed write is reported as
/// [`Error::PersistenceFailed`] but never rolls back the in-memory change.
pub struct TaskStore<S> {
    storage: S,
    key: String,
    tasks: Vec<Task>,
    ids: IdAllocator,
    clock: Arc<dyn Clock>,
}

impl<S> fmt::Debug for TaskStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskStore")
            .field("key", &self.key)
            .field("tasks", &self.tasks)
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

impl<S: KeyValueStore> TaskStore<S> {
    /// Create an empty, unloaded store using the system clock.
    pub fn new(storage: S) -> Self {
        Self {
            storage,
            key: DEFAULT_STORAGE_KEY.to_string(),
            tasks: Vec::new(),
            ids: IdAllocator::default(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Create a store and load whatever is persisted.
    pub fn open(storage: S) -> Self {
        let mut store = Self::new(storage);
        store.load();
        store
    }

    /// Persist under a different key.
    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Use a different clock for ids and creation times.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Wrap the store for sharing with the scheduler.
    pub fn into_shared(self) -> SharedStore<S> {
        Arc::new(Mutex::new(self))
    }

    /// Replace the in-memory collection with the persisted one.
    ///
    /// A missing, unreadable or malformed value yields an empty collection;
    /// this never fails. Returns the number of tasks loaded.
    pub fn load(&mut self) -> usize {
        self.tasks = match self.storage.get(&self.key) {
            Ok(Some(blob)) => codec::decode(&blob).unwrap_or_else(|e| {
                warn!(key = %self.key, "discarding unparsable task collection: {e}");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(key = %self.key, "cannot read task collection, starting empty: {e}");
                Vec::new()
            }
        };

        let highest = self.tasks.iter().map(|t| t.id).max();
        let floor = match (highest, self.ids.last()) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        };
        self.ids = IdAllocator::starting_after(floor);

        info!(count = self.tasks.len(), "loaded tasks");
        self.tasks.len()
    }

    /// Append a new open task without a reminder.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] (and changes nothing) if the name is
    /// blank, or [`Error::PersistenceFailed`] if the write failed after the
    /// task was added. In that case the task is still in memory as the last
    /// element of [`TaskStore::snapshot`].
    pub fn create(&mut self, name: &str) -> Result<Task> {
        let name = normalize_name(name)?;
        let now = self.clock.now();
        let task = Task::new(self.ids.next(now), name, now);
        self.tasks.push(task.clone());
        debug!(id = task.id, "created task");
        self.persist()?;
        Ok(task)
    }

    /// Flip the completed flag. Returns `None` if no task has this id.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceFailed`] if the write failed.
    pub fn toggle_completed(&mut self, id: TaskId) -> Result<Option<Task>> {
        self.update(id, "toggle", |task| {
            task.completed = !task.completed;
            true
        })
    }

    /// Rename a task. A name equal to the current one is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the new name is blank, or
    /// [`Error::PersistenceFailed`] if the write failed.
    pub fn rename(&mut self, id: TaskId, new_name: &str) -> Result<Option<Task>> {
        let new_name = normalize_name(new_name)?;
        self.update(id, "rename", |task| {
            if task.name == new_name {
                return false;
            }
            task.name = new_name;
            true
        })
    }

    /// Set (or overwrite) the reminder. Past instants are accepted and will
    /// fire on the next scheduler tick.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceFailed`] if the write failed.
    pub fn set_reminder(&mut self, id: TaskId, when: DateTime<Utc>) -> Result<Option<Task>> {
        self.update(id, "set reminder", |task| {
            task.reminder = Some(when);
            true
        })
    }

    /// Set the reminder from user text, or from the default proposal when
    /// `input` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if the text is not a valid instant, or
    /// [`Error::PersistenceFailed`] if the write failed.
    pub fn set_reminder_from_input(
        &mut self,
        id: TaskId,
        input: Option<&str>,
    ) -> Result<Option<Task>> {
        let Some(existing) = self.get(id).map(|t| t.reminder) else {
            debug!(id, "no such task; ignoring set reminder");
            return Ok(None);
        };
        let now = self.clock.now();
        let when = match input {
            Some(text) => parse_reminder(text, now)?,
            None => default_reminder(existing, now),
        };
        self.set_reminder(id, when)
    }

    /// Remove the reminder. Clearing an absent reminder is harmless.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceFailed`] if the write failed.
    pub fn clear_reminder(&mut self, id: TaskId) -> Result<Option<Task>> {
        self.update(id, "clear reminder", |task| {
            task.reminder = None;
            true
        })
    }

    /// Clear a reminder that has just fired, but only if it is still set to
    /// `fired_at`. Returns whether the reminder was cleared.
    ///
    /// A reminder rescheduled since the scan that found it due is left alone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceFailed`] if the write failed.
    pub fn clear_fired_reminder(&mut self, id: TaskId, fired_at: DateTime<Utc>) -> Result<bool> {
        match self.get(id).map(|t| t.reminder) {
            Some(Some(current)) if current == fired_at => {
                self.clear_reminder(id).map(|t| t.is_some())
            }
            Some(_) => {
                debug!(id, "reminder changed since it fell due; leaving it");
                Ok(false)
            }
            None => {
                debug!(id, "task deleted before its reminder was cleared");
                Ok(false)
            }
        }
    }

    /// Remove a task. Returns whether a task was removed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::PersistenceFailed`] if the write failed.
    pub fn delete(&mut self, id: TaskId) -> Result<bool> {
        let Some(index) = self.tasks.iter().position(|t| t.id == id) else {
            debug!(id, "no such task; ignoring delete");
            return Ok(false);
        };
        self.tasks.remove(index);
        self.persist()?;
        Ok(true)
    }

    /// Point-in-time copy of all tasks in collection order.
    pub fn snapshot(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    /// Borrow the current tasks in collection order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Look up a task by id.
    pub fn get(&self, id: TaskId) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the collection is empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// The backing key-value store.
    pub const fn storage(&self) -> &S {
        &self.storage
    }

    fn update(
        &mut self,
        id: TaskId,
        operation: &str,
        apply: impl FnOnce(&mut Task) -> bool,
    ) -> Result<Option<Task>> {
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "no such task; ignoring {operation}");
            return Ok(None);
        };
        let changed = apply(task);
        let task = task.clone();
        if changed {
            self.persist()?;
        }
        Ok(Some(task))
    }

    fn persist(&self) -> Result<()> {
        codec::encode(&self.tasks)
            .and_then(|blob| self.storage.set(&self.key, &blob))
            .map_err(|e| {
                warn!(key = %self.key, "task collection not persisted: {e}");
                Error::persistence(e)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FailingKvStore, ManualClock, MemoryKvStore};
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.timestamp_millis_opt(1001).unwrap()
    }

    fn create_test_store() -> (Arc<ManualClock>, TaskStore<MemoryKvStore>) {
        let clock = Arc::new(ManualClock::new(t0()));
        let store = TaskStore::new(MemoryKvStore::new()).with_clock(clock.clone());
        (clock, store)
    }

    fn persisted(store: &TaskStore<MemoryKvStore>) -> Vec<Task> {
        codec::decode(&store.storage().get(DEFAULT_STORAGE_KEY).unwrap().unwrap()).unwrap()
    }

    #[test]
    fn test_create_assigns_timestamp_id_and_persists() {
        let (_clock, mut store) = create_test_store();

        let task = store.create("  Pay rent  ").unwrap();
        assert_eq!(task.id, 1001);
        assert_eq!(task.name, "Pay rent");
        assert!(!task.completed);
        assert_eq!(task.created_at, t0());
        assert_eq!(task.reminder, None);
        assert_eq!(persisted(&store), vec![task]);
    }

    #[test]
    fn test_create_rejects_blank_name_without_writing() {
        let (_clock, mut store) = create_test_store();

        assert!(matches!(store.create("   "), Err(Error::Validation(_))));
        assert!(store.is_empty());
        assert_eq!(store.storage().write_count(), 0);
    }

    #[test]
    fn test_ids_increase_within_same_millisecond() {
        let (_clock, mut store) = create_test_store();

        let a = store.create("a").unwrap();
        let b = store.create("b").unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn test_ids_not_reused_after_delete() {
        let (_clock, mut store) = create_test_store();

        let a = store.create("a").unwrap();
        assert!(store.delete(a.id).unwrap());
        let b = store.create("b").unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_toggle_completed_flips_back_and_forth() {
        let (_clock, mut store) = create_test_store();
        let task = store.create("Laundry").unwrap();

        assert!(store.toggle_completed(task.id).unwrap().unwrap().completed);
        assert!(!store.toggle_completed(task.id).unwrap().unwrap().completed);
        assert!(!persisted(&store)[0].completed);
    }

    #[test]
    fn test_unknown_id_is_a_quiet_no_op() {
        let (_clock, mut store) = create_test_store();
        store.create("Laundry").unwrap();
        let writes = store.storage().write_count();

        assert_eq!(store.toggle_completed(42).unwrap(), None);
        assert_eq!(store.rename(42, "x").unwrap(), None);
        assert_eq!(store.set_reminder(42, t0()).unwrap(), None);
        assert_eq!(store.clear_reminder(42).unwrap(), None);
        assert!(!store.delete(42).unwrap());
        assert_eq!(store.storage().write_count(), writes);
    }

    #[test]
    fn test_rename() {
        let (_clock, mut store) = create_test_store();
        let task = store.create("Laundry").unwrap();

        let renamed = store.rename(task.id, " Fold laundry ").unwrap().unwrap();
        assert_eq!(renamed.name, "Fold laundry");
        assert_eq!(persisted(&store)[0].name, "Fold laundry");
    }

    #[test]
    fn test_rename_to_same_name_does_not_write() {
        let (_clock, mut store) = create_test_store();
        let task = store.create("Laundry").unwrap();
        let writes = store.storage().write_count();

        let unchanged = store.rename(task.id, "  Laundry ").unwrap().unwrap();
        assert_eq!(unchanged, task);
        assert_eq!(store.storage().write_count(), writes);
    }

    #[test]
    fn test_rename_rejects_blank() {
        let (_clock, mut store) = create_test_store();
        let task = store.create("Laundry").unwrap();

        assert!(matches!(store.rename(task.id, ""), Err(Error::Validation(_))));
        assert_eq!(store.get(task.id).unwrap().name, "Laundry");
    }

    #[test]
    fn test_set_then_clear_reminder() {
        let (_clock, mut store) = create_test_store();
        let task = store.create("Dentist").unwrap();
        let when = t0() + Duration::seconds(5);

        store.set_reminder(task.id, when).unwrap();
        assert_eq!(store.snapshot()[0].reminder, Some(when));

        store.clear_reminder(task.id).unwrap();
        assert_eq!(store.snapshot()[0].reminder, None);
        let once = store.snapshot();

        store.clear_reminder(task.id).unwrap();
        assert_eq!(store.snapshot(), once);
    }

    #[test]
    fn test_set_reminder_in_past_is_accepted() {
        let (_clock, mut store) = create_test_store();
        let task = store.create("Dentist").unwrap();
        let past = t0() - Duration::days(1);

        let updated = store.set_reminder(task.id, past).unwrap().unwrap();
        assert_eq!(updated.reminder, Some(past));
    }

    #[test]
    fn test_set_reminder_from_input() {
        let (_clock, mut store) = create_test_store();
        let task = store.create("Dentist").unwrap();

        let updated = store.set_reminder_from_input(task.id, Some("+5s")).unwrap().unwrap();
        assert_eq!(updated.reminder, Some(t0() + Duration::seconds(5)));

        let result = store.set_reminder_from_input(task.id, Some("soonish"));
        assert!(matches!(result, Err(Error::Validation(_))));
        assert_eq!(store.get(task.id).unwrap().reminder, Some(t0() + Duration::seconds(5)));
    }

    #[test]
    fn test_set_reminder_default_proposal() {
        let (_clock, mut store) = create_test_store();
        let task = store.create("Dentist").unwrap();

        let updated = store.set_reminder_from_input(task.id, None).unwrap().unwrap();
        assert_eq!(updated.reminder, Some(t0() + Duration::hours(1)));

        // With a reminder already set the proposal keeps it.
        store.set_reminder(task.id, t0() + Duration::minutes(3)).unwrap();
        let kept = store.set_reminder_from_input(task.id, None).unwrap().unwrap();
        assert_eq!(kept.reminder, Some(t0() + Duration::minutes(3)));
    }

    #[test]
    fn test_set_reminder_from_input_unknown_id() {
        let (_clock, mut store) = create_test_store();
        assert_eq!(store.set_reminder_from_input(7, Some("garbage")).unwrap(), None);
    }

    #[test]
    fn test_clear_fired_reminder_only_when_unchanged() {
        let (_clock, mut store) = create_test_store();
        let task = store.create("Dentist").unwrap();
        let first = t0() + Duration::seconds(1);
        let second = t0() + Duration::minutes(10);

        store.set_reminder(task.id, first).unwrap();
        store.set_reminder(task.id, second).unwrap();
        assert!(!store.clear_fired_reminder(task.id, first).unwrap());
        assert_eq!(store.get(task.id).unwrap().reminder, Some(second));

        assert!(store.clear_fired_reminder(task.id, second).unwrap());
        assert_eq!(store.get(task.id).unwrap().reminder, None);

        assert!(!store.clear_fired_reminder(999, second).unwrap());
    }

    #[test]
    fn test_delete_preserves_order_of_remaining() {
        let (clock, mut store) = create_test_store();
        let a = store.create("a").unwrap();
        clock.advance(Duration::seconds(1));
        let b = store.create("b").unwrap();
        clock.advance(Duration::seconds(1));
        let c = store.create("c").unwrap();

        assert!(store.delete(b.id).unwrap());
        let ids: Vec<_> = store.snapshot().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![a.id, c.id]);
    }

    #[test]
    fn test_load_round_trip() {
        let (_clock, mut store) = create_test_store();
        let a = store.create("a").unwrap();
        store.create("b").unwrap();
        store.toggle_completed(a.id).unwrap();
        store.set_reminder(a.id, t0() + Duration::hours(2)).unwrap();
        let before = store.snapshot();

        let reloaded = TaskStore::open(store.storage().clone());
        assert_eq!(reloaded.snapshot(), before);
    }

    #[test]
    fn test_load_missing_is_empty() {
        let store = TaskStore::open(MemoryKvStore::new());
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_load_malformed_is_empty() {
        let storage = MemoryKvStore::new();
        storage.set(DEFAULT_STORAGE_KEY, "{definitely not tasks").unwrap();

        let mut store = TaskStore::new(storage);
        assert_eq!(store.load(), 0);
        assert!(store.snapshot().is_empty());
    }

    #[test]
    fn test_load_read_failure_is_empty() {
        let store = TaskStore::open(FailingKvStore::new("disk on fire"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_ids_continue_after_loaded_maximum() {
        let storage = MemoryKvStore::new();
        let future = Task::new(5_000_000, "from another session", t0());
        storage.set(DEFAULT_STORAGE_KEY, &codec::encode(&[future]).unwrap()).unwrap();

        let clock = Arc::new(ManualClock::new(t0()));
        let mut store = TaskStore::new(storage).with_clock(clock);
        store.load();
        assert_eq!(store.create("next").unwrap().id, 5_000_001);
    }

    #[test]
    fn test_with_key() {
        let storage = MemoryKvStore::new();
        let mut store = TaskStore::new(storage).with_key("other");
        store.create("x").unwrap();

        assert!(store.storage().get("other").unwrap().is_some());
        assert!(store.storage().get(DEFAULT_STORAGE_KEY).unwrap().is_none());
    }

    #[test]
    fn test_persistence_failure_keeps_memory_state() {
        let mut store = TaskStore::new(FailingKvStore::new("quota exceeded"));

        let err = store.create("Pay rent").unwrap_err();
        assert!(err.is_persistence_failure());
        assert_eq!(store.len(), 1);
        let unsaved = store.snapshot().last().cloned().unwrap();
        assert_eq!(unsaved.name, "Pay rent");
        let id = unsaved.id;

        assert!(store.toggle_completed(id).unwrap_err().is_persistence_failure());
        assert!(store.get(id).unwrap().completed);

        assert!(store.delete(id).unwrap_err().is_persistence_failure());
        assert!(store.is_empty());
    }

    #[test]
    fn test_shared_lock() {
        let (_clock, store) = create_test_store();
        let shared = store.into_shared();
        lock(&shared).create("shared").unwrap();
        assert_eq!(lock(&shared).len(), 1);
    }
}
