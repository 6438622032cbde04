//! Logging infrastructure for Sage.
//!
//! This module initializes the tracing subscriber for structured logging.
//! All logs are emitted to stderr so `sage ask` can keep stdout for the answer.

use std::io::IsTerminal;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::error::{AppError, AppResult};

/// Default filter when neither `RUST_LOG` nor an override is present.
///
/// The HTTP stack is noisy at debug level, so it is capped at `info`.
const DEFAULT_FILTER: &str = "info,hyper=info,reqwest=info";

/// Initialize the tracing subscriber with stderr output.
///
/// # Arguments
/// * `log_level` - Optional filter override (e.g., "debug", "sage_knowledge=trace")
/// * `no_color` - Disable colored output
///
/// # Example
/// ```no_run
/// use sage_core::logging::init_logging;
///
/// init_logging(None, false).expect("Failed to initialize logging");
/// ```
pub fn init_logging(log_level: Option<&str>, no_color: bool) -> AppResult<()> {
    let env_filter = build_filter(log_level)?;

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_ansi(!no_color && supports_color());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::Config(format!("Failed to init logging: {}", e)))?;

    Ok(())
}

/// Resolve the filter directive: explicit override, then `RUST_LOG`, then the default.
fn build_filter(log_level: Option<&str>) -> AppResult<EnvFilter> {
    let from_env = std::env::var("RUST_LOG").ok();
    let filter_str = log_level
        .or(from_env.as_deref())
        .unwrap_or(DEFAULT_FILTER);

    EnvFilter::try_new(filter_str)
        .map_err(|e| AppError::Config(format!("Invalid log filter '{}': {}", filter_str, e)))
}

/// Check if stderr supports color output.
fn supports_color() -> bool {
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }

    std::io::stderr().is_terminal()
}
