use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::prelude::*;

use taskdeck_core::{ClientConfig, Dashboard, TracingNotifier};

mod commands;
mod output;

#[derive(Parser, Debug)]
#[command(name = "taskdeck", author, version, about = "Project and task dashboard client")]
struct Cli {
    /// Config file to use instead of the default location
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,

    #[arg(long, global = true)]
    log_file_path: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Sign in and remember the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List one page of projects
    Projects {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        search: Option<String>,
        /// Status to keep, or "all"
        #[arg(long)]
        status: Option<String>,
    },
    /// Summary over every project
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Show a project and its tasks
    Project {
        id: i64,
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
    },
    /// Change fields of a project
    EditProject {
        id: i64,
        /// Listing page the project is shown on
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        status: Option<String>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        start_date: Option<chrono::NaiveDate>,
        #[arg(long, value_name = "YYYY-MM-DD")]
        end_date: Option<chrono::NaiveDate>,
        #[arg(long, allow_negative_numbers = true)]
        progress: Option<i32>,
        #[arg(long, allow_negative_numbers = true)]
        budget: Option<f64>,
    },
    /// Add a task to a project
    AddTask {
        project_id: i64,
        #[arg(long)]
        title: String,
        #[arg(long)]
        status: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long)]
        assigned_to: Option<i64>,
    },
}

/// Non-blocking writer for `log_path`. Lines are only guaranteed on disk
/// once the returned guard is dropped.
fn log_file_writer(log_path: &Path) -> (NonBlocking, WorkerGuard) {
    let file_appender = tracing_appender::rolling::never(
        log_path.parent().unwrap_or(Path::new(".")),
        log_path
            .file_name()
            .unwrap_or(std::ffi::OsStr::new("taskdeck.log")),
    );
    tracing_appender::non_blocking(file_appender)
}

fn init_tracing(log_file_path: Option<&str>) -> Option<WorkerGuard> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = log_file_path {
        let (non_blocking, guard) = log_file_writer(Path::new(log_path));

        tracing_subscriber::registry()
            .with(env_filter.clone())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stderr),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
        Some(guard)
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init();
        None
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    // flushes the log file when main returns
    let _log_guard = init_tracing(cli.log_file_path.as_deref());

    let (config, config_path) =
        ClientConfig::load(cli.config.as_deref()).context("Failed to load taskdeck config")?;
    tracing::debug!("Using config at {:?}", config_path);

    let mut dashboard = Dashboard::from_config(&config, Arc::new(TracingNotifier))
        .context("Failed to initialise dashboard client")?;

    commands::run(&mut dashboard, cli.command).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_log_file_is_flushed_when_guard_drops() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("taskdeck.log");

        let (mut writer, guard) = log_file_writer(&path);
        writer.write_all(b"Failed to update project\n").unwrap();
        drop(guard);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "Failed to update project\n");
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "taskdeck",
            "projects",
            "--page",
            "2",
            "--log-file-path",
            "/tmp/taskdeck.log",
        ])
        .unwrap();
        assert_eq!(cli.log_file_path.as_deref(), Some("/tmp/taskdeck.log"));
        assert!(matches!(cli.command, Command::Projects { page: 2, .. }));
    }
}
