//! Interactive console for the company/department/employee directory.
//!
//! # Responsibility
//! - Parse command line options and open the store once.
//! - Hand the store handle to the menu shell and report fatal errors.

mod shell;

use clap::Parser;
use gestion_core::db::{open_db, open_db_in_memory};
use log::info;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(name = "gestion", version, about = "Manage companies, departments and employees")]
struct Cli {
    /// SQLite database file, created on first use.
    #[arg(long, default_value = "gestion.db")]
    db: PathBuf,

    /// Use a throwaway in-memory database instead of `--db`.
    #[arg(long)]
    in_memory: bool,

    /// trace|debug|info|warn|error; defaults by build mode.
    #[arg(long)]
    log_level: Option<String>,

    /// Absolute directory for rolling log files. Logging is off when omitted.
    #[arg(long)]
    log_dir: Option<String>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Some(log_dir) = cli.log_dir.as_deref() {
        let level = cli
            .log_level
            .as_deref()
            .unwrap_or_else(|| gestion_core::default_log_level());
        if let Err(err) = gestion_core::init_logging(level, log_dir) {
            eprintln!("could not start logging: {err}");
            return ExitCode::FAILURE;
        }
    }

    let opened = if cli.in_memory {
        open_db_in_memory()
    } else {
        open_db(&cli.db)
    };
    let conn = match opened {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!("could not open database: {err}");
            return ExitCode::FAILURE;
        }
    };

    let stdin = io::stdin();
    let result = shell::Shell::try_new(&conn, stdin.lock(), io::stdout())
        .map_err(|err| err.to_string())
        .and_then(|mut shell| shell.run().map_err(|err| err.to_string()));

    match result {
        Ok(()) => {
            info!("event=app_exit module=cli status=ok");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
