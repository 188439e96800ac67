//! Structured logging for the portal binary.
//!
//! Verbosity follows `RUST_LOG` and falls back to [`DEFAULT_FILTER`]:
//!
//! ```bash
//! RUST_LOG=portal_server::authorization=debug,info portal
//! ```

use std::io::IsTerminal;

use anyhow::Context;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is unset or empty.
pub(crate) const DEFAULT_FILTER: &str = "info";

/// Installs the global subscriber.
///
/// Colors are only emitted when stdout is a terminal.
///
/// # Errors
///
/// Fails if `RUST_LOG` cannot be parsed or a subscriber is already set.
pub(crate) fn init_tracing() -> anyhow::Result<()> {
    let filter = match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => {
            EnvFilter::try_new(&directives).with_context(|| format!("invalid RUST_LOG: {directives}"))?
        }
        _ => EnvFilter::new(DEFAULT_FILTER),
    };

    let output = fmt::layer()
        .with_target(true)
        .with_ansi(std::io::stdout().is_terminal());

    tracing_subscriber::registry()
        .with(filter)
        .with(output)
        .try_init()
        .context("tracing subscriber already installed")
}
