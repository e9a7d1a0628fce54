//! Tracing subscriber initialisation.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use super::redact::RedactingMakeWriter;

/// Initialise the global tracing subscriber.
///
/// Installs a JSON-formatted [`tracing_subscriber`] layer writing to stderr
/// through the secret redactor. `RUST_LOG` overrides `log_level`.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(log_level: &str) -> Result<()> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(RedactingMakeWriter),
        )
        .try_init()
        .context("failed to initialise tracing subscriber")?;

    Ok(())
}
