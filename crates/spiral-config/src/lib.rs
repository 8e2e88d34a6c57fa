// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Process-wide configuration shared by the SpiralTorch training tooling.
//!
//! Everything here is resolved once at startup and then passed explicitly into
//! the components that need it.

pub mod determinism;
pub mod plot;
pub mod tracing;

pub use determinism::{rng_from_label, rng_from_optional, DeterminismConfig};
pub use plot::{PlotSettings, DEFAULT_PLOT_SERVER};
