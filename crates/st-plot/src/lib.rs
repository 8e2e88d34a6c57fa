// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Live plotting of monitored training metrics.
//!
//! [`Plot`] is a training-loop [`Extension`]: before the first epoch and after
//! every epoch it appends the latest logged value of each configured metric to
//! that metric's series and pushes all pending points to a charting session in
//! one batch. Charting itself happens behind [`ChartBackend`].
//!
//! When asked to start its own plotting server, the extension spawns it with
//! interrupts shielded and never shuts it down; the PID is logged so the
//! operator can stop it. Starting a second server while the first one is still
//! bound to the same address fails inside the server process, not here.

pub mod backend;
pub mod error;
pub mod extension;
pub mod io;
pub mod plot;
pub mod server;

pub use backend::memory::MemoryBackend;
pub use backend::svg::SvgBackend;
pub use backend::{
    palette_color, Availability, ChartBackend, FigureId, FigureSpec, LineSpec, SeriesUpdate,
    SourceId, TABLEAU_10,
};
pub use error::{PlotError, PlotResult};
pub use extension::{CallbackPoint, Extension, Schedule, TrainingLog, TrainingStatus};
pub use io::{load_json, save_json, PlotState};
pub use plot::{ChartGroup, MetricSeries, Plot, PlotConfig};
pub use server::{ServerCommand, ServerHandle, SpawnOptions};
