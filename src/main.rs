//! pkpanel binary entrypoint kept minimal. The runtime lives in the library.

use std::fmt;
use std::process::ExitCode;
use std::sync::OnceLock;

use clap::Parser;

use pkpanel::args::{Args, determine_log_level, process_args};
use pkpanel::config::{Settings, logs_dir};

struct PanelTimer;

impl tracing_subscriber::fmt::time::FormatTime for PanelTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> fmt::Result {
        let ts = chrono::Local::now().format("%Y-%m-%d-T %H:%M:%S");
        write!(w, "{ts}")
    }
}

static LOG_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();

/// What: Install the global tracing subscriber.
///
/// Inputs:
/// - `level`: Default filter when `RUST_LOG` is unset.
///
/// Details:
/// - Writes to `$XDG_STATE_HOME/pkpanel/logs/pkpanel.log`; falls back to stderr
///   when the file cannot be opened.
fn init_logging(level: &str) {
    let env_filter = || {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level))
    };
    let mut log_path = logs_dir();
    log_path.push("pkpanel.log");
    match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
    {
        Ok(file) => {
            let (non_blocking, guard) = tracing_appender::non_blocking(file);
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_ansi(false)
                .with_writer(non_blocking)
                .with_timer(PanelTimer)
                .init();
            let _ = LOG_GUARD.set(guard);
            tracing::info!(path = %log_path.display(), "logging initialized");
        }
        Err(e) => {
            tracing_subscriber::fmt()
                .with_env_filter(env_filter())
                .with_target(false)
                .with_ansi(true)
                .with_writer(std::io::stderr)
                .with_timer(PanelTimer)
                .init();
            tracing::warn!(error = %e, "failed to open log file; using stderr");
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&determine_log_level(&args));

    let settings = match Settings::load(args.config.as_deref()) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("pkpanel: {e}");
            tracing::error!(error = %e, "settings unavailable");
            return ExitCode::FAILURE;
        }
    };
    tracing::info!(command = ?args.command, "pkpanel starting");
    let code = process_args(&args, &settings).await;
    tracing::info!("pkpanel exited");
    code
}
