use chrono::{DateTime, Local};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn init_cli_logger(verbose: bool) {
    let filter = if verbose {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("card_relay=debug,info"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("card_relay=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// Severity of an append-log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Error,
    Success,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "INFO",
            LogLevel::Error => "ERROR",
            LogLevel::Success => "SUCCESS",
        }
    }
}

/// Process-wide append-only text log.
///
/// Every record is mirrored as a `tracing` event. When a path is configured the
/// file is opened in append mode, one line is written and the handle is dropped
/// again, so nothing sits in a buffer if the process dies mid-run.
#[derive(Debug, Clone, Default)]
pub struct AuditLog {
    path: Option<PathBuf>,
}

impl AuditLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// A sink that only emits tracing events.
    pub fn disabled() -> Self {
        Self { path: None }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.record(LogLevel::Info, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.record(LogLevel::Error, message.as_ref());
    }

    pub fn success(&self, message: impl AsRef<str>) {
        self.record(LogLevel::Success, message.as_ref());
    }

    pub fn record(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Error => tracing::error!("{}", message),
            LogLevel::Success => tracing::info!(outcome = "success", "{}", message),
        }

        if let Some(path) = &self.path {
            if let Err(e) = append_record(path, level, message) {
                tracing::warn!("Could not append to log {}: {}", path.display(), e);
            }
        }
    }
}

fn append_record(path: &Path, level: LogLevel, message: &str) -> std::io::Result<()> {
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    writeln!(file, "{}", format_record(level, &Local::now(), message))
}

/// Renders `[LEVEL] <ctime-style timestamp> - message`.
pub fn format_record(level: LogLevel, timestamp: &DateTime<Local>, message: &str) -> String {
    format!(
        "[{}] {} - {}",
        level.as_str(),
        timestamp.format("%a %b %e %H:%M:%S %Y"),
        message
    )
}
