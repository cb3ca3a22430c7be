//! Tests for the CLI module.

use super::*;
use crate::paths::DATA_DIR_ENV;
use crate::traits::KeyValueStore;
use serial_test::serial;
use std::process::ExitCode;
use tempfile::TempDir;

fn run_in(dir: &TempDir, args: &[&str]) -> CliOutput {
    let data_dir = dir.path().to_str().unwrap();
    let mut argv = vec!["task-reminders", "--data-dir", data_dir];
    argv.extend_from_slice(args);
    run(Cli::try_parse_from(argv).unwrap())
}

fn logged_in() -> TempDir {
    let dir = TempDir::new().unwrap();
    let output = run_in(&dir, &["login", "--token", "secret"]);
    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    dir
}

fn created_id(output: &CliOutput) -> TaskId {
    let line = &output.stdout[0];
    let id = line.trim_start_matches("Created task ").split(':').next().unwrap();
    id.parse().unwrap()
}

#[test]
fn test_parse_commands() {
    let cli = Cli::try_parse_from(["task-reminders", "remind", "42", "+30m"]).unwrap();
    assert!(matches!(cli.command, Command::Remind { id: 42, when: Some(ref w) } if w == "+30m"));

    let cli = Cli::try_parse_from(["task-reminders", "watch", "--for", "5"]).unwrap();
    assert!(matches!(cli.command, Command::Watch { for_secs: Some(5) }));

    assert!(Cli::try_parse_from(["task-reminders", "toggle", "abc"]).is_err());
}

#[test]
fn test_version() {
    let output = run(Cli::try_parse_from(["task-reminders", "version"]).unwrap());
    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(output.stdout[0].starts_with("task-reminders v"));
}

#[test]
fn test_task_commands_require_login() {
    let dir = TempDir::new().unwrap();
    let output = run_in(&dir, &["add", "Pay rent"]);
    assert_eq!(output.exit_code, ExitCode::from(1));
    assert!(output.stderr[0].contains("/auth/login"));

    run_in(&dir, &["login", "--token", "secret"]);
    assert_eq!(run_in(&dir, &["add", "Pay rent"]).exit_code, ExitCode::SUCCESS);

    run_in(&dir, &["logout"]);
    assert_eq!(run_in(&dir, &["list"]).exit_code, ExitCode::from(1));
}

#[test]
fn test_login_rejects_blank_token() {
    let dir = TempDir::new().unwrap();
    let output = run_in(&dir, &["login", "--token", "  "]);
    assert_eq!(output.exit_code, ExitCode::from(1));
}

#[test]
fn test_add_list_toggle_rename_delete() {
    let dir = logged_in();
    let id = created_id(&run_in(&dir, &["add", "  Laundry "]));

    let listed = run_in(&dir, &["list"]);
    assert_eq!(listed.stdout, vec![format!("[ ] {id}  Laundry")]);

    let toggled = run_in(&dir, &["toggle", &id.to_string()]);
    assert_eq!(toggled.stdout, vec![format!("[x] {id}  Laundry")]);

    let renamed = run_in(&dir, &["rename", &id.to_string(), "Fold laundry"]);
    assert_eq!(renamed.stdout, vec![format!("[x] {id}  Fold laundry")]);

    assert_eq!(run_in(&dir, &["delete", &id.to_string()]).exit_code, ExitCode::SUCCESS);
    assert_eq!(run_in(&dir, &["list"]).stdout, vec!["No tasks".to_string()]);
}

#[test]
fn test_add_blank_name_fails() {
    let dir = logged_in();
    let output = run_in(&dir, &["add", "   "]);
    assert_eq!(output.exit_code, ExitCode::from(1));
    assert_eq!(run_in(&dir, &["list"]).stdout, vec!["No tasks".to_string()]);
}

#[test]
fn test_unknown_id_reports_not_found() {
    let dir = logged_in();
    let output = run_in(&dir, &["toggle", "42"]);
    assert_eq!(output.exit_code, ExitCode::from(1));
    assert_eq!(output.stderr, vec!["Task not found: 42".to_string()]);
}

#[test]
fn test_list_json() {
    let dir = logged_in();
    run_in(&dir, &["add", "Pay rent"]);

    let output = run_in(&dir, &["list", "--json"]);
    let tasks: Vec<crate::tasks::Task> = serde_json::from_str(&output.stdout[0]).unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].name, "Pay rent");
}

#[test]
fn test_remind_and_tick_fire_once() {
    let dir = logged_in();
    let id = created_id(&run_in(&dir, &["add", "Pay rent"])).to_string();

    let reminded = run_in(&dir, &["remind", &id, "0s"]);
    assert!(reminded.stdout[0].contains("(reminder "));

    assert_eq!(run_in(&dir, &["tick"]).stdout, vec!["Fired 1 reminder(s)".to_string()]);
    assert_eq!(run_in(&dir, &["tick"]).stdout, vec!["Fired 0 reminder(s)".to_string()]);
    assert!(!run_in(&dir, &["list"]).stdout[0].contains("reminder"));
}

#[test]
fn test_remind_invalid_time() {
    let dir = logged_in();
    let id = created_id(&run_in(&dir, &["add", "Pay rent"])).to_string();

    let output = run_in(&dir, &["remind", &id, "whenever"]);
    assert_eq!(output.exit_code, ExitCode::from(1));
    assert!(output.stderr[0].contains("invalid reminder time"));
}

#[test]
fn test_unremind() {
    let dir = logged_in();
    let id = created_id(&run_in(&dir, &["add", "Dentist"])).to_string();
    run_in(&dir, &["remind", &id]);

    let output = run_in(&dir, &["unremind", &id]);
    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(!output.stdout[0].contains("reminder"));
}

#[test]
fn test_watch_for_zero_seconds() {
    let dir = logged_in();
    let id = created_id(&run_in(&dir, &["add", "Overdue"])).to_string();
    run_in(&dir, &["remind", &id, "0s"]);

    let output = run_in(&dir, &["watch", "--for", "0"]);
    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(output.stdout[0].contains("1 overdue reminder(s)"));
}

#[test]
fn test_ensure_config_writes_file() {
    let dir = TempDir::new().unwrap();
    let output = run_in(&dir, &["ensure-config"]);
    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(crate::paths::config_path(dir.path()).exists());
}

#[test]
fn test_custom_storage_key_from_config() {
    let dir = logged_in();
    std::fs::write(crate::paths::config_path(dir.path()), "storage_key: work-tasks\n").unwrap();
    run_in(&dir, &["add", "Quarterly report"]);

    let storage = crate::storage::SqliteKvStore::new(dir.path()).unwrap();
    assert!(storage.get("work-tasks").unwrap().is_some());
    assert!(storage.get("tasks").unwrap().is_none());
}

#[test]
#[serial]
fn test_data_dir_from_environment() {
    let dir = TempDir::new().unwrap();
    let original = std::env::var_os(DATA_DIR_ENV);
    std::env::set_var(DATA_DIR_ENV, dir.path());

    let output = run(Cli::try_parse_from(["task-reminders", "login", "--token", "t"]).unwrap());

    match original {
        Some(value) => std::env::set_var(DATA_DIR_ENV, value),
        None => std::env::remove_var(DATA_DIR_ENV),
    }
    assert_eq!(output.exit_code, ExitCode::SUCCESS);
    assert!(crate::paths::database_path(dir.path()).exists());
}
