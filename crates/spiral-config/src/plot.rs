// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use serde::{Deserialize, Serialize};

/// Address of the plotting server when nothing else is configured.
pub const DEFAULT_PLOT_SERVER: &str = "http://localhost:5006/";

/// Startup settings for live plotting.
///
/// Resolve these once (usually through [`PlotSettings::from_env`]) and hand
/// them to the plotting extension's configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotSettings {
    /// Default server address used when an extension does not override it.
    pub server_url: String,
}

impl Default for PlotSettings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_PLOT_SERVER.to_string(),
        }
    }
}

impl PlotSettings {
    /// Reads `SPIRAL_PLOT_SERVER`; blank or missing values keep the default.
    pub fn from_env() -> Self {
        match std::env::var("SPIRAL_PLOT_SERVER") {
            Ok(raw) if !raw.trim().is_empty() => Self {
                server_url: raw.trim().to_string(),
            },
            _ => Self::default(),
        }
    }

    /// Overrides the default server address.
    pub fn with_server_url<S: Into<String>>(mut self, url: S) -> Self {
        self.server_url = url.into();
        self
    }
}
