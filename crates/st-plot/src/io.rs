// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backend::ChartBackend;
use crate::plot::{ChartGroup, MetricSeries, Plot, PlotConfig};
use crate::PlotResult;

/// Persistable part of a [`Plot`]. Process handles and backend state are
/// deliberately absent; [`Plot::reconnect`] recreates them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlotState {
    pub document: String,
    pub config: PlotConfig,
    pub groups: Vec<ChartGroup>,
    pub series: BTreeMap<String, MetricSeries>,
}

pub fn save_json<B: ChartBackend, P: AsRef<Path>>(plot: &Plot<B>, path: P) -> PlotResult<()> {
    let file = File::create(path.as_ref())?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &plot.snapshot())?;
    Ok(())
}

pub fn load_json<P: AsRef<Path>>(path: P) -> PlotResult<PlotState> {
    let file = File::open(path.as_ref())?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}
