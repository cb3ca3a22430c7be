//! CLI binary for `task_reminders`.
//!
//! This binary is a thin wrapper that parses arguments and delegates to the library.

use std::process::ExitCode;

use clap::Parser;
use task_reminders::cli::{run, Cli};
use task_reminders::logging;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    let output = run(cli);

    for msg in output.stdout {
        println!("{msg}");
    }
    for msg in output.stderr {
        eprintln!("{msg}");
    }

    output.exit_code
}
