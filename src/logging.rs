//! Tracing configuration and log routing.
//!
//! The HTTP server logs to stdout using a compact formatter and to a file. When
//! `PDFSUM_LOG_FILE` is set, logs are appended to that path; otherwise a file logger is created
//! under `logs/pdfsum.log`. The CLI prints summaries on stdout, so its console logs go to stderr.
//! The MCP binary owns stdout for the protocol, so it installs the file layer only.
use std::sync::OnceLock;

use tracing_appender::non_blocking::{NonBlocking, WorkerGuard};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

static LOG_GUARD: OnceLock<WorkerGuard> = OnceLock::new();

/// Where tracing output is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    /// Compact stdout layer plus the file layer.
    StdoutAndFile,
    /// Compact stderr layer plus the file layer; stdout carries command output.
    StderrAndFile,
    /// File layer only; stdout stays clean for stdio transports.
    FileOnly,
}

impl LogTarget {
    fn logs_to_stdout(self) -> bool {
        matches!(self, Self::StdoutAndFile)
    }

    fn logs_to_stderr(self) -> bool {
        matches!(self, Self::StderrAndFile)
    }
}

/// Configure tracing subscribers for the given target.
///
/// - Respects `RUST_LOG` for filtering (defaults to `info`).
/// - Uses a global guard to keep the non‑blocking writer alive for the process lifetime.
/// - Calling it twice is harmless; the second registration is ignored.
pub fn init_tracing(target: LogTarget) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stdout_layer = target
        .logs_to_stdout()
        .then(|| fmt::layer().with_target(false).compact());
    let stderr_layer = target.logs_to_stderr().then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .compact()
    });
    let file_layer = configure_file_writer().map(|writer| {
        fmt::layer()
            .with_writer(writer)
            .with_target(true)
            .with_ansi(false)
            .compact()
    });

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();
}

/// Build a non‑blocking writer for file logging.
///
/// Returns `None` when the logs directory cannot be created or the target file cannot be opened.
fn configure_file_writer() -> Option<NonBlocking> {
    if let Ok(path) = std::env::var("PDFSUM_LOG_FILE") {
        match std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
        {
            Ok(file) => {
                let (non_blocking, guard) = tracing_appender::non_blocking(file);
                let _ = LOG_GUARD.set(guard);
                Some(non_blocking)
            }
            Err(err) => {
                eprintln!("Failed to open log file {path}: {err}");
                None
            }
        }
    } else {
        if let Err(err) = std::fs::create_dir_all("logs") {
            eprintln!("Failed to create logs directory: {err}");
            return None;
        }
        let file_appender = tracing_appender::rolling::never("logs", "pdfsum.log");
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        let _ = LOG_GUARD.set(guard);
        Some(non_blocking)
    }
}
