//! Process-wide tracing subscriber setup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

/// Builds the filter: `RUST_LOG` when it parses, otherwise `fallback`.
pub fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(fallback))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Installs the global subscriber writing to stderr.
///
/// Returns an error when a subscriber is already installed, which callers
/// may ignore.
pub fn init_logging(fallback_filter: &str) -> anyhow::Result<()> {
    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter(fallback_filter))
        .with(console_layer)
        .try_init()?;

    Ok(())
}
