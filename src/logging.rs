//! Tracing subscriber setup shared by the binaries.
//!
//! Every sink is wrapped in [`SanitizingMakeWriter`] so patient measurements
//! never reach a log file in clear text.

use std::io;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::adapters::sanitize::SanitizingMakeWriter;
use crate::config::LogMode;

/// Log destination for [`init`].
#[derive(Debug, Clone, Copy)]
pub enum LogTarget<'a> {
    Stdout,
    Stderr,
    File(&'a Path),
}

impl<'a> LogTarget<'a> {
    /// Server target for a configured mode.
    #[must_use]
    pub fn for_mode(mode: LogMode, file: &'a Path) -> Self {
        match mode {
            LogMode::Stdout => Self::Stdout,
            LogMode::File => Self::File(file),
        }
    }
}

/// Install the global subscriber.
///
/// The returned guard must be held until shutdown so buffered lines are
/// flushed. `RUST_LOG` overrides the default `info` filter.
///
/// # Errors
/// Returns an error if the log file cannot be opened.
pub fn init(target: LogTarget<'_>) -> io::Result<WorkerGuard> {
    let (writer, guard) = match target {
        LogTarget::Stdout => tracing_appender::non_blocking(io::stdout()),
        LogTarget::Stderr => tracing_appender::non_blocking(io::stderr()),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)?;
            }
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_appender::non_blocking(file)
        }
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // A second init (tests, embedding) keeps the first subscriber.
    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_ansi(matches!(target, LogTarget::Stdout | LogTarget::Stderr))
                .with_writer(SanitizingMakeWriter::new(writer)),
        )
        .try_init();
    if installed.is_err() {
        tracing::debug!("Global subscriber already set");
    }

    Ok(guard)
}
