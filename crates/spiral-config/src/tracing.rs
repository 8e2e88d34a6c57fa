// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

static INITIALISED: OnceLock<()> = OnceLock::new();

/// Directive used when neither `RUST_LOG` nor `SPIRAL_LOG` is set.
pub const DEFAULT_DIRECTIVE: &str = "info";

/// Configures the global tracing subscriber.
///
/// The filter comes from `RUST_LOG`, then `SPIRAL_LOG`, then [`DEFAULT_DIRECTIVE`].
pub fn init_tracing() -> Result<(), InitError> {
    let directive = match std::env::var("SPIRAL_LOG") {
        Ok(raw) if !raw.trim().is_empty() => raw,
        Ok(_) | Err(std::env::VarError::NotPresent) => DEFAULT_DIRECTIVE.to_string(),
        Err(err) => return Err(InitError::Env(err)),
    };
    init_tracing_with(&directive)
}

/// Configures the global tracing subscriber with an explicit fallback directive.
/// `RUST_LOG` still wins when present.
pub fn init_tracing_with(fallback: &str) -> Result<(), InitError> {
    INITIALISED
        .set(())
        .map_err(|_| InitError::AlreadyInitialised)?;

    let ansi = std::io::stdout().is_terminal();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(ansi);
    Registry::default()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|err| InitError::Subscriber(err.to_string()))
}

/// Errors emitted when configuring the tracing subscriber.
#[derive(Debug, thiserror::Error)]
pub enum InitError {
    #[error("tracing has already been initialised")]
    AlreadyInitialised,
    #[error("failed to read SPIRAL_LOG: {0}")]
    Env(std::env::VarError),
    #[error("failed to install tracing subscriber: {0}")]
    Subscriber(String),
}
