//! # Telemetry
//!
//! The CLI's tracing subscriber, held as a value instead of installed
//! globally. Commands run inside [`Telemetry::in_scope`]; logs go to
//! stderr so stdout stays reserved for command output. Bulk validation
//! pools hand the scoped subscriber to their worker threads.

use tracing::Dispatch;
use tracing_subscriber::EnvFilter;

use crate::config::LogFormat;

pub struct Telemetry {
    dispatch: Dispatch,
    format: LogFormat,
}

/// Filter directive for a `-v` count. Zero defers to `RUST_LOG`, then `warn`.
pub fn filter_for(verbosity: u8) -> EnvFilter {
    match verbosity {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    }
}

impl Telemetry {
    pub fn new(verbosity: u8, format: LogFormat) -> Self {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter_for(verbosity))
            .with_target(false)
            .with_writer(std::io::stderr);
        let dispatch = match format {
            LogFormat::Text => Dispatch::new(builder.finish()),
            LogFormat::Json => Dispatch::new(builder.json().finish()),
        };
        Self { dispatch, format }
    }

    pub fn format(&self) -> LogFormat {
        self.format
    }

    /// Run `f` with this subscriber as the default.
    pub fn in_scope<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }

    /// Emit the final event and release the subscriber.
    pub fn shutdown(self) {
        self.in_scope(|| tracing::debug!("telemetry shut down"));
    }
}

impl std::fmt::Debug for Telemetry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Telemetry")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}
