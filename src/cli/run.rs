//! Command execution for the CLI.
//!
//! This module handles running CLI commands and producing output.

use crate::auth::{self, TokenGate};
use crate::board::TaskBoard;
use crate::cli::{Cli, Command};
use crate::command::RealCommandRunner;
use crate::config::{self, AppConfig, NotifierKind};
use crate::error::{Error, Result};
use crate::notify::{ConsoleNotifier, DesktopNotifier};
use crate::paths;
use crate::reminders::ReminderScheduler;
use crate::storage::SqliteKvStore;
use crate::tasks::store::lock;
use crate::tasks::{Task, TaskId, TaskStore};
use crate::traits::Notifier;
use chrono::Local;
use std::fmt::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Output from running the CLI, with separate stdout and stderr messages.
#[derive(Debug)]
pub struct CliOutput {
    /// Exit code for the process.
    pub exit_code: ExitCode,
    /// Messages to print to stdout.
    pub stdout: Vec<String>,
    /// Messages to print to stderr.
    pub stderr: Vec<String>,
}

/// Resolved data directory, config and storage for one invocation.
struct Context {
    data_dir: PathBuf,
    config: AppConfig,
    storage: SqliteKvStore,
}

impl Context {
    fn resolve(data_dir: Option<PathBuf>) -> Result<Self> {
        let data_dir = match data_dir {
            Some(dir) => dir,
            None => paths::data_dir()?,
        };
        let config = AppConfig::load_or_default(&data_dir)?;
        let storage = SqliteKvStore::new(&data_dir)?;
        Ok(Self { data_dir, config, storage })
    }

    fn open_board(&self) -> Result<TaskBoard<SqliteKvStore>> {
        let gate = TokenGate::new(self.storage.clone()).with_login_route(&self.config.login_route);
        let store = TaskStore::new(self.storage.clone()).with_key(&self.config.storage_key);
        TaskBoard::open(store, Arc::new(gate))
    }

    fn scheduler(&self) -> ReminderScheduler {
        ReminderScheduler::new(build_notifier(self.config.notifier))
            .with_interval(self.config.tick_interval())
    }
}

/// Run a parsed command line.
pub fn run(cli: Cli) -> CliOutput {
    if matches!(cli.command, Command::Version) {
        return run_version();
    }

    let ctx = match Context::resolve(cli.data_dir) {
        Ok(ctx) => ctx,
        Err(e) => return error_output(format!("Error opening data directory: {e}")),
    };

    match cli.command {
        Command::Version => run_version(),
        Command::EnsureConfig => run_ensure_config(&ctx),
        Command::Login { token } => run_login(&ctx, &token),
        Command::Logout => run_logout(&ctx),
        Command::Tick => run_tick(&ctx),
        Command::Watch { for_secs } => run_watch(&ctx, for_secs.map(Duration::from_secs)),
        command => run_board_cmd(&ctx, command),
    }
}

// === Utility Commands ===

fn run_version() -> CliOutput {
    success_output(format!("task-reminders v{}", crate::VERSION))
}

fn run_ensure_config(ctx: &Context) -> CliOutput {
    let runner = RealCommandRunner::new();
    match config::ensure_config(&runner, &ctx.data_dir) {
        Ok(config) => {
            let messages = vec![
                format!("Config ensured at {}", AppConfig::config_path(&ctx.data_dir).display()),
                format!("  tick_interval_secs: {}", config.tick_interval_secs),
                format!("  storage_key: {}", config.storage_key),
                format!("  notifier: {:?}", config.notifier),
                format!("  login_route: {}", config.login_route),
            ];
            CliOutput { exit_code: ExitCode::SUCCESS, stdout: vec![], stderr: messages }
        }
        Err(e) => error_output(format!("Error ensuring config: {e}")),
    }
}

fn run_login(ctx: &Context, token: &str) -> CliOutput {
    match auth::login(&ctx.storage, token) {
        Ok(()) => success_output("Logged in".to_string()),
        Err(e) => error_output(e.to_string()),
    }
}

fn run_logout(ctx: &Context) -> CliOutput {
    match auth::logout(&ctx.storage) {
        Ok(()) => success_output("Logged out".to_string()),
        Err(e) => error_output(e.to_string()),
    }
}

// === Task Commands ===

fn run_board_cmd(ctx: &Context, command: Command) -> CliOutput {
    let board = match ctx.open_board() {
        Ok(board) => board,
        Err(e) => return failure_output(&e),
    };

    match command {
        Command::Add { name } => match board.create(&name) {
            Ok(task) => success_output(format!("Created task {}: {}", task.id, task.name)),
            Err(e) => failure_output(&e),
        },
        Command::List { json } => list_tasks(&board.snapshot(), json),
        Command::Toggle { id } => task_output(id, board.toggle_completed(id)),
        Command::Rename { id, name } => task_output(id, board.rename(id, &name)),
        Command::Remind { id, when } => {
            task_output(id, board.set_reminder_from_input(id, when.as_deref()))
        }
        Command::Unremind { id } => task_output(id, board.clear_reminder(id)),
        Command::Delete { id } => match board.delete(id) {
            Ok(true) => success_output(format!("Deleted task {id}")),
            Ok(false) => not_found(id),
            Err(e) => failure_output(&e),
        },
        Command::Tick
        | Command::Watch { .. }
        | Command::Login { .. }
        | Command::Logout
        | Command::EnsureConfig
        | Command::Version => error_output("not a task command".to_string()),
    }
}

fn list_tasks(tasks: &[Task], json: bool) -> CliOutput {
    if json {
        return match serde_json::to_string_pretty(tasks) {
            Ok(json) => success_output(json),
            Err(e) => error_output(e.to_string()),
        };
    }
    if tasks.is_empty() {
        return success_output("No tasks".to_string());
    }
    let lines = tasks.iter().map(format_task).collect();
    CliOutput { exit_code: ExitCode::SUCCESS, stdout: lines, stderr: vec![] }
}

fn format_task(task: &Task) -> String {
    let mark = if task.completed { 'x' } else { ' ' };
    let mut line = format!("[{mark}] {}  {}", task.id, task.name);
    if let Some(at) = task.reminder {
        let _ = write!(line, "  (reminder {})", at.with_timezone(&Local).format("%Y-%m-%d %H:%M"));
    }
    line
}

fn task_output(id: TaskId, result: Result<Option<Task>>) -> CliOutput {
    match result {
        Ok(Some(task)) => success_output(format_task(&task)),
        Ok(None) => not_found(id),
        Err(e) => failure_output(&e),
    }
}

// === Reminder Commands ===

fn run_tick(ctx: &Context) -> CliOutput {
    let board = match ctx.open_board() {
        Ok(board) => board,
        Err(e) => return failure_output(&e),
    };
    let scheduler = ctx.scheduler();
    scheduler.request_permission();
    let shared = board.shared();
    let report = scheduler.tick_now(&mut *lock(&shared));

    let mut output = success_output(format!("Fired {} reminder(s)", report.fired.len()));
    if report.persistence_failures > 0 {
        output.exit_code = ExitCode::from(1);
        output.stderr.push(format!(
            "{} fired reminder(s) could not be saved and may fire again",
            report.persistence_failures
        ));
    }
    output
}

fn run_watch(ctx: &Context, limit: Option<Duration>) -> CliOutput {
    let board = match ctx.open_board() {
        Ok(board) => board,
        Err(e) => return failure_output(&e),
    };
    let runtime = match tokio::runtime::Builder::new_multi_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(e) => return error_output(format!("Error starting runtime: {e}")),
    };

    let scheduler = ctx.scheduler();
    let shared = board.shared();

    let (caught_up, waited) = runtime.block_on(async move {
        // Spawning requests notification permission before the catch-up tick.
        let handle = scheduler.clone().spawn(Arc::clone(&shared));
        let caught_up = scheduler.tick_now(&mut *lock(&shared)).fired.len();
        info!(caught_up, "watching reminders");
        let waited = match limit {
            Some(limit) => {
                tokio::time::sleep(limit).await;
                Ok(())
            }
            None => tokio::signal::ctrl_c().await,
        };
        handle.shutdown().await;
        (caught_up, waited)
    });

    match waited {
        Ok(()) => success_output(format!(
            "Stopped watching ({caught_up} overdue reminder(s) fired at start)"
        )),
        Err(e) => error_output(format!("Error waiting for Ctrl-C: {e}")),
    }
}

fn build_notifier(kind: NotifierKind) -> Arc<dyn Notifier> {
    match kind {
        NotifierKind::Console => Arc::new(ConsoleNotifier::default()),
        NotifierKind::Desktop => Arc::new(DesktopNotifier::new(Arc::new(RealCommandRunner::new()))),
    }
}

// === Output helpers ===

fn not_found(id: TaskId) -> CliOutput {
    error_output(format!("Task not found: {id}"))
}

fn failure_output(error: &Error) -> CliOutput {
    match error {
        Error::Unauthenticated { redirect } => error_output(format!(
            "Not signed in; log in at {redirect} (task-reminders login --token <TOKEN>)"
        )),
        Error::PersistenceFailed { .. } => {
            error_output(format!("{error} (the change applies to this run only)"))
        }
        other => error_output(other.to_string()),
    }
}

fn success_output(message: String) -> CliOutput {
    CliOutput { exit_code: ExitCode::SUCCESS, stdout: vec![message], stderr: vec![] }
}

fn error_output(message: String) -> CliOutput {
    CliOutput { exit_code: ExitCode::from(1), stdout: vec![], stderr: vec![message] }
}
