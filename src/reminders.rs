//! Reminder scheduler: turns "a reminder instant has passed" into exactly
//! one notification followed by clearing that reminder.
//!
//! Due-ness is recomputed from scratch on every tick from the store's
//! current tasks and the current time; nothing about a previous tick is
//! remembered. Firing is at-most-once: the reminder is cleared whether or
//! not the notification could actually be shown.

use crate::tasks::store::{lock, SharedStore, TaskStore};
use crate::tasks::{Task, TaskId};
use crate::traits::{Clock, KeyValueStore, Notifier, Permission, SystemClock};
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Interval between scheduler ticks.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_secs(60);

/// Longest accepted tick interval.
pub const MAX_TICK_INTERVAL: Duration = Duration::from_secs(24 * 60 * 60);

/// Prefix of every reminder notification title.
pub const TITLE_PREFIX: &str = "Reminder: ";

/// Body of every reminder notification.
pub const REMINDER_BODY: &str = "This task is due now!";

/// A reminder found due during a tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DueReminder {
    /// The task the reminder belongs to.
    pub id: TaskId,
    /// The task name at scan time.
    pub name: String,
    /// The reminder instant that fell due.
    pub at: DateTime<Utc>,
}

impl DueReminder {
    /// Notification title for this reminder.
    #[must_use]
    pub fn title(&self) -> String {
        format!("{TITLE_PREFIX}{}", self.name)
    }
}

/// Which reminders are due at `now`, in collection order.
///
/// A reminder is due when its task is not completed and the instant is at
/// or before `now`.
#[must_use]
pub fn due_reminders(tasks: &[Task], now: DateTime<Utc>) -> Vec<DueReminder> {
    tasks
        .iter()
        .filter(|task| task.is_reminder_due(now))
        .filter_map(|task| {
            task.reminder.map(|at| DueReminder { id: task.id, name: task.name.clone(), at })
        })
        .collect()
}

/// What a single tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Tasks whose reminder fired, in firing order.
    pub fired: Vec<TaskId>,
    /// Fired reminders whose cleared state could not be persisted.
    pub persistence_failures: usize,
}

impl TickReport {
    /// Whether nothing fired.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.fired.is_empty()
    }
}

/// Periodic evaluator of due reminders.
#[derive(Clone)]
pub struct ReminderScheduler {
    notifier: Arc<dyn Notifier>,
    clock: Arc<dyn Clock>,
    interval: Duration,
}

impl fmt::Debug for ReminderScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReminderScheduler").field("interval", &self.interval).finish_non_exhaustive()
    }
}

impl ReminderScheduler {
    /// Create a scheduler using the system clock and the default interval.
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier, clock: Arc::new(SystemClock), interval: DEFAULT_TICK_INTERVAL }
    }

    /// Use a different clock to decide what is due.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Change the tick interval (clamped between one millisecond and
    /// [`MAX_TICK_INTERVAL`]).
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.clamp(Duration::from_millis(1), MAX_TICK_INTERVAL);
        self
    }

    /// The tick interval.
    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    /// Ask the notifier for permission to show notifications.
    pub fn request_permission(&self) -> Permission {
        let permission = self.notifier.request_permission();
        info!(?permission, "notification permission");
        permission
    }

    /// Run one tick against `store` as of `now`.
    ///
    /// Each due reminder is announced and then cleared through the store,
    /// only if it still holds the instant that fell due.
    pub fn tick<S: KeyValueStore>(&self, store: &mut TaskStore<S>, now: DateTime<Utc>) -> TickReport {
        let mut report = TickReport::default();
        for reminder in due_reminders(store.tasks(), now) {
            self.notifier.notify(&reminder.title(), REMINDER_BODY);
            if let Err(e) = store.clear_fired_reminder(reminder.id, reminder.at) {
                error!(id = reminder.id, "fired reminder cleared in memory only: {e}");
                report.persistence_failures += 1;
            }
            info!(id = reminder.id, at = %reminder.at, "reminder fired");
            report.fired.push(reminder.id);
        }
        report
    }

    /// Run one tick as of the scheduler clock's current time.
    pub fn tick_now<S: KeyValueStore>(&self, store: &mut TaskStore<S>) -> TickReport {
        self.tick(store, self.clock.now())
    }

    /// Start ticking in the background.
    ///
    /// The first tick happens one interval after spawning. Each tick holds
    /// the store lock from scan to the last clear, so user actions never
    /// interleave with it.
    pub fn spawn<S>(self, store: SharedStore<S>) -> SchedulerHandle
    where
        S: KeyValueStore + 'static,
    {
        self.request_permission();
        info!(interval = ?self.interval, "reminder scheduler started");

        let (stop_tx, mut stop_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let now = Instant::now();
            let start = now.checked_add(self.interval).unwrap_or(now);
            let mut interval = tokio::time::interval_at(start, self.interval);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    biased;
                    _ = stop_rx.changed() => break,
                    _ = interval.tick() => {
                        let report = {
                            let mut guard = lock(&store);
                            self.tick_now(&mut *guard)
                        };
                        debug!(fired = report.fired.len(), "scheduler tick");
                    }
                }
            }
            info!("reminder scheduler stopped");
        });

        SchedulerHandle { stop_tx, task }
    }
}

/// Handle to a running scheduler.
///
/// Dropping the handle also stops the scheduler.
#[derive(Debug)]
pub struct SchedulerHandle {
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Suppress all future ticks. A tick already running finishes normally.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    /// Whether the background task has ended.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the background task to end without asking it to stop.
    pub async fn join(self) {
        // Keep the sender alive so the loop is not stopped by the drop.
        let Self { stop_tx, task } = self;
        if let Err(e) = task.await {
            error!("reminder scheduler task failed: {e}");
        }
        drop(stop_tx);
    }

    /// Stop and wait for the background task to end.
    pub async fn shutdown(self) {
        self.stop();
        self.join().await;
    }
}
