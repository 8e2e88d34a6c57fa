// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

//! Boundary between the plotting extension and a charting library.

pub mod memory;
pub mod svg;

use serde::{Deserialize, Serialize};

use crate::{PlotError, PlotResult};

/// Tableau 10 colours, assigned to lines by their position within a figure.
pub const TABLEAU_10: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];

/// Colour of the `index`-th line in a figure.
pub fn palette_color(index: usize) -> &'static str {
    TABLEAU_10[index % TABLEAU_10.len()]
}

/// Whether a backend can be used, resolved once when the backend is built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable { reason: String },
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }
}

/// Backend-assigned figure handle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FigureId(pub usize);

/// Backend-assigned handle of the data store behind one line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(pub usize);

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FigureSpec {
    pub title: String,
    pub x_axis_label: String,
    pub y_axis_label: String,
}

/// A named line and the points it starts with.
#[derive(Clone, Debug, PartialEq)]
pub struct LineSpec {
    pub name: String,
    pub legend: String,
    pub color: &'static str,
    pub x: Vec<u64>,
    pub y: Vec<f64>,
}

/// Points appended to one line since the last push.
#[derive(Clone, Debug, PartialEq)]
pub struct SeriesUpdate {
    pub source: SourceId,
    pub x: Vec<u64>,
    pub y: Vec<f64>,
}

/// Capabilities the plotting extension needs from a charting library.
pub trait ChartBackend {
    fn availability(&self) -> Availability;

    /// Whether output goes to an embedded notebook session.
    fn in_notebook(&self) -> bool {
        false
    }

    /// Whether a rendering session is currently established.
    fn has_session(&self) -> bool;

    /// Creates or selects the named document on the server at `url`.
    fn output_server(&mut self, document: &str, url: &str) -> PlotResult<()>;

    fn create_figure(&mut self, spec: &FigureSpec) -> PlotResult<FigureId>;

    fn add_line(&mut self, figure: FigureId, line: &LineSpec) -> PlotResult<()>;

    /// Looks up the data store of the line called `name` in `figure`.
    fn data_source(&self, figure: FigureId, name: &str) -> Option<SourceId>;

    /// Opens the figure for display.
    fn show(&mut self, figure: FigureId) -> PlotResult<()>;

    /// Adds the figures to the current document.
    fn attach(&mut self, figures: &[FigureId]) -> PlotResult<()>;

    /// Synchronises a batch of appended points with the session.
    fn push(&mut self, updates: &[SeriesUpdate]) -> PlotResult<()>;
}

/// Line storage shared by the bundled backends.
pub(crate) trait StoredLine {
    fn name(&self) -> &str;
    fn source(&self) -> SourceId;
    fn append(&mut self, x: &[u64], y: &[f64]);
}

pub(crate) fn unknown_figure(figure: FigureId) -> PlotError {
    PlotError::backend(format!("unknown figure {}", figure.0))
}

pub(crate) fn find_source<'a, L: StoredLine + 'a>(
    lines: impl IntoIterator<Item = &'a L>,
    name: &str,
) -> Option<SourceId> {
    lines
        .into_iter()
        .find(|line| line.name() == name)
        .map(|line| line.source())
}

/// Records `figures` as attached once each. Nothing changes if any id is unknown.
pub(crate) fn attach_figures(
    attached: &mut Vec<FigureId>,
    figure_count: usize,
    figures: &[FigureId],
) -> PlotResult<()> {
    if let Some(&missing) = figures.iter().find(|figure| figure.0 >= figure_count) {
        return Err(unknown_figure(missing));
    }
    for &figure in figures {
        if !attached.contains(&figure) {
            attached.push(figure);
        }
    }
    Ok(())
}

/// Appends every update to its line. Sources are resolved up front, so an
/// unknown source leaves all lines untouched.
pub(crate) fn apply_updates<'a, L: StoredLine + 'a>(
    lines: impl IntoIterator<Item = &'a mut L>,
    updates: &[SeriesUpdate],
) -> PlotResult<()> {
    let mut lines: Vec<&mut L> = lines.into_iter().collect();
    let targets = updates
        .iter()
        .map(|update| {
            lines
                .iter()
                .position(|line| line.source() == update.source)
                .ok_or_else(|| PlotError::backend(format!("unknown source {}", update.source.0)))
        })
        .collect::<PlotResult<Vec<_>>>()?;
    for (update, at) in updates.iter().zip(targets) {
        lines[at].append(&update.x, &update.y);
    }
    Ok(())
}
