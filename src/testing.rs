//! Testing utilities and mock implementations.
//!
//! These types are provided for use in tests. They may appear unused in
//! the library itself but are consumed by unit and integration tests.

#![allow(dead_code)]

use crate::error::Result;
use crate::traits::{
    AuthGate, Clock, CommandOutput, CommandRunner, KeyValueStore, Notifier, Permission,
};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// An in-memory key-value store.
///
/// Clones share the same underlying map, so a clone can be handed to a
/// second [`crate::tasks::TaskStore`] to simulate a process restart.
#[derive(Debug, Clone, Default)]
pub struct MemoryKvStore {
    values: Arc<Mutex<HashMap<String, String>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryKvStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful `set` calls so far.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

impl KeyValueStore for MemoryKvStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_string(), value.to_string());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.remove(key);
        Ok(())
    }
}

/// A key-value store whose every operation fails, for testing error paths.
#[derive(Debug, Default, Clone)]
pub struct FailingKvStore {
    error_message: String,
}

impl FailingKvStore {
    /// Create a failing store with the specified error message.
    #[must_use]
    pub fn new(error_message: impl Into<String>) -> Self {
        Self { error_message: error_message.into() }
    }

    fn fail<T>(&self) -> Result<T> {
        Err(std::io::Error::other(self.error_message.clone()).into())
    }
}

impl KeyValueStore for FailingKvStore {
    fn get(&self, _key: &str) -> Result<Option<String>> {
        self.fail()
    }

    fn set(&self, _key: &str, _value: &str) -> Result<()> {
        self.fail()
    }

    fn remove(&self, _key: &str) -> Result<()> {
        self.fail()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    /// Create a clock frozen at `now`.
    #[must_use]
    pub const fn new(now: DateTime<Utc>) -> Self {
        Self { now: Mutex::new(now) }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = now;
    }

    /// Move forward by `by`.
    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// A notifier that records what it was asked to show.
#[derive(Debug)]
pub struct RecordingNotifier {
    permission: Permission,
    shown: Mutex<Vec<(String, String)>>,
    attempts: AtomicUsize,
    permission_requests: AtomicUsize,
}

impl Default for RecordingNotifier {
    fn default() -> Self {
        Self::with_permission(Permission::Granted)
    }
}

impl RecordingNotifier {
    /// Create a notifier that has been granted permission.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a notifier that answers permission requests with `permission`.
    #[must_use]
    pub const fn with_permission(permission: Permission) -> Self {
        Self {
            permission,
            shown: Mutex::new(Vec::new()),
            attempts: AtomicUsize::new(0),
            permission_requests: AtomicUsize::new(0),
        }
    }

    /// Notifications actually shown, as `(title, body)` pairs.
    #[must_use]
    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Titles of notifications actually shown.
    #[must_use]
    pub fn titles(&self) -> Vec<String> {
        self.shown().into_iter().map(|(title, _)| title).collect()
    }

    /// Number of `notify` calls, whether or not anything was shown.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Number of `request_permission` calls.
    #[must_use]
    pub fn permission_requests(&self) -> usize {
        self.permission_requests.load(Ordering::SeqCst)
    }
}

impl Notifier for RecordingNotifier {
    fn request_permission(&self) -> Permission {
        self.permission_requests.fetch_add(1, Ordering::SeqCst);
        self.permission
    }

    fn notify(&self, title: &str, body: &str) {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.permission.is_granted() {
            self.shown
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push((title.to_string(), body.to_string()));
        }
    }
}

/// An authentication gate with a fixed answer that counts redirects.
#[derive(Debug, Default)]
pub struct StaticGate {
    authenticated: AtomicBool,
    redirects: AtomicUsize,
}

impl StaticGate {
    /// Create a gate that answers `authenticated`.
    #[must_use]
    pub const fn new(authenticated: bool) -> Self {
        Self { authenticated: AtomicBool::new(authenticated), redirects: AtomicUsize::new(0) }
    }

    /// Change the answer, e.g. to simulate a session expiring.
    pub fn set_authenticated(&self, authenticated: bool) {
        self.authenticated.store(authenticated, Ordering::SeqCst);
    }

    /// Number of redirects performed.
    #[must_use]
    pub fn redirects(&self) -> usize {
        self.redirects.load(Ordering::SeqCst)
    }
}

impl AuthGate for StaticGate {
    fn is_authenticated(&self) -> bool {
        self.authenticated.load(Ordering::SeqCst)
    }

    fn redirect_to_login(&self) -> String {
        self.redirects.fetch_add(1, Ordering::SeqCst);
        "/auth/login".to_string()
    }
}

/// A mock command runner for testing.
///
/// Records expected commands and their outputs, then verifies they were called.
#[derive(Debug, Default)]
pub struct MockCommandRunner {
    expectations: Mutex<Vec<(String, Vec<String>, CommandOutput)>>,
    available_programs: Mutex<Vec<String>>,
    call_index: AtomicUsize,
}

impl MockCommandRunner {
    /// Create a new mock command runner.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an expected command and its output.
    pub fn expect(&mut self, program: &str, args: &[&str], output: CommandOutput) {
        self.expectations.get_mut().unwrap_or_else(PoisonError::into_inner).push((
            program.to_string(),
            args.iter().map(|s| (*s).to_string()).collect(),
            output,
        ));
    }

    /// Add a program as available.
    pub fn set_available(&mut self, program: &str) {
        self.available_programs
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .push(program.to_string());
    }

    /// Verify all expected commands were called.
    ///
    /// # Panics
    ///
    /// Panics if not all expected commands were called.
    pub fn verify(&self) {
        let index = self.call_index.load(Ordering::SeqCst);
        let expected = self.expectations.lock().unwrap_or_else(PoisonError::into_inner).len();
        assert_eq!(index, expected, "Expected {expected} command calls, but only {index} were made");
    }
}

impl CommandRunner for MockCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[&str],
        _timeout: Option<std::time::Duration>,
    ) -> Result<CommandOutput> {
        let expectations = self.expectations.lock().unwrap_or_else(PoisonError::into_inner);
        let index = self.call_index.fetch_add(1, Ordering::SeqCst);

        assert!(
            index < expectations.len(),
            "Unexpected command call: {program} {args:?} (no more expectations)"
        );

        let (exp_program, exp_args, output) = &expectations[index];
        let args_vec: Vec<String> = args.iter().map(|s| (*s).to_string()).collect();

        assert!(
            program == exp_program && &args_vec == exp_args,
            "Command mismatch at index {index}:\n  Expected: {exp_program} {exp_args:?}\n  Got: {program} {args:?}"
        );

        Ok(output.clone())
    }

    fn is_available(&self, program: &str) -> bool {
        self.available_programs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .any(|p| p == program)
    }
}
