//! Structured JSON logging for the worker process.

use std::io::Write;

use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_FILTER: &str = "info";

/// Build the log filter from `RUST_LOG`, falling back to `info`.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global JSON subscriber.
///
/// # Errors
///
/// Fails when a global subscriber is already installed.
pub fn init() -> Result<(), Box<dyn std::error::Error + Send + Sync + 'static>> {
    fmt().with_env_filter(env_filter()).json().try_init()
}

/// Install the global JSON subscriber, writing any failure to `fallback`.
///
/// A failed install leaves no subscriber to receive the error, so it goes to
/// `fallback` (standard error in the binary).
pub fn init_or_report(mut fallback: impl Write) {
    if let Err(err) = init() {
        let _ = writeln!(fallback, "tracing init failed: {err}");
    }
}
