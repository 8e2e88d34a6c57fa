// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use thiserror::Error;

pub type PlotResult<T> = Result<T, PlotError>;

/// Errors emitted by the plotting extension and its backends.
#[derive(Debug, Error)]
pub enum PlotError {
    /// The charting backend cannot be used in this process.
    #[error("charting backend unavailable: {reason}")]
    DependencyUnavailable { reason: String },
    /// The plotting server process could not be started.
    #[error("failed to start plotting server '{program}': {source}")]
    ServerSpawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    /// The backend rejected a figure, line or push.
    #[error("charting backend error: {message}")]
    Backend { message: String },
    /// A callback name did not match any lifecycle point.
    #[error("unknown callback '{name}'")]
    UnknownCallback { name: String },
    #[error("plot state i/o failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("plot state serialisation failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PlotError {
    pub(crate) fn backend(message: impl ToString) -> Self {
        PlotError::Backend {
            message: message.to_string(),
        }
    }
}
