//! Log output for the meetup2md binary.
//!
//! Logs go to stderr in a compact, timestamp-free format. Stdout carries the
//! event summaries only, so `meetup2md > summary.txt` captures no log lines.
//! `RUST_LOG` overrides the level chosen by the config.
//!
//! ```ignore
//! use meetup2md_core::tracing::{init_tracing, TracingConfig};
//!
//! init_tracing(TracingConfig::cli())?;
//! ```

use std::io::IsTerminal;

use thiserror::Error;
use tracing::{Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::MakeWriter;

/// Errors that can occur during tracing initialization
#[derive(Debug, Error)]
pub enum TracingError {
    /// Failed to set global subscriber
    #[error("failed to set global tracing subscriber: {0}")]
    SetGlobalSubscriber(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// How much to log and how much context to print with each line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TracingConfig {
    /// Level used when `RUST_LOG` is not set
    pub level: Level,
    /// Print file and line of each event
    pub include_location: bool,
    /// Print the module path of each event
    pub include_target: bool,
}

impl TracingConfig {
    /// Warnings and errors only, the default for a run.
    #[must_use]
    pub fn cli() -> Self {
        Self {
            level: Level::WARN,
            include_location: false,
            include_target: false,
        }
    }

    /// Everything down to debug, with source locations, for `--verbose`.
    #[must_use]
    pub fn cli_debug() -> Self {
        Self {
            level: Level::DEBUG,
            include_location: true,
            include_target: true,
        }
    }

    /// Returns the filter directive applied when `RUST_LOG` is unset.
    pub fn default_directive(&self) -> String {
        format!("meetup2md={}", self.level.as_str().to_ascii_lowercase())
    }

    /// Builds a subscriber writing to `writer`.
    pub fn subscriber<W>(&self, writer: W, ansi: bool) -> impl Subscriber + Send + Sync + 'static
    where
        W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
    {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(self.default_directive()));

        tracing_subscriber::fmt()
            .compact()
            .without_time()
            .with_env_filter(filter)
            .with_file(self.include_location)
            .with_line_number(self.include_location)
            .with_target(self.include_target)
            .with_ansi(ansi)
            .with_writer(writer)
            .finish()
    }
}

/// Installs the global subscriber, logging to stderr.
///
/// Colours are used only when stderr is a terminal.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init_tracing(config: TracingConfig) -> Result<(), TracingError> {
    let ansi = std::io::stderr().is_terminal();
    tracing::subscriber::set_global_default(config.subscriber(std::io::stderr, ansi))?;
    Ok(())
}
