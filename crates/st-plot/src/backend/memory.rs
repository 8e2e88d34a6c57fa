// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::collections::BTreeSet;

use tracing::debug;

use super::{
    apply_updates, attach_figures, find_source, unknown_figure, Availability, ChartBackend,
    FigureId, FigureSpec, LineSpec, SeriesUpdate, SourceId, StoredLine,
};
use crate::{PlotError, PlotResult};

/// Document and server address of an established session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MemorySession {
    pub document: String,
    pub url: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemoryLine {
    pub name: String,
    pub legend: String,
    pub color: &'static str,
    pub source: SourceId,
    pub x: Vec<u64>,
    pub y: Vec<f64>,
}

impl StoredLine for MemoryLine {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> SourceId {
        self.source
    }

    fn append(&mut self, x: &[u64], y: &[f64]) {
        self.x.extend_from_slice(x);
        self.y.extend_from_slice(y);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct MemoryFigure {
    pub spec: FigureSpec,
    pub lines: Vec<MemoryLine>,
    pub shown: bool,
}

/// In-process charting session that keeps every figure and point it receives.
///
/// Useful for dry runs and for checking what a training loop would draw.
#[derive(Clone, Debug)]
pub struct MemoryBackend {
    availability: Availability,
    notebook: bool,
    session: Option<MemorySession>,
    figures: Vec<MemoryFigure>,
    attached: Vec<FigureId>,
    hidden_sources: BTreeSet<String>,
    next_source: usize,
    pushes: usize,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self {
            availability: Availability::Available,
            notebook: false,
            session: None,
            figures: Vec::new(),
            attached: Vec::new(),
            hidden_sources: BTreeSet::new(),
            next_source: 0,
            pushes: 0,
        }
    }

    /// A backend that reports itself unusable.
    pub fn unavailable<S: Into<String>>(reason: S) -> Self {
        Self {
            availability: Availability::Unavailable {
                reason: reason.into(),
            },
            ..Self::new()
        }
    }

    /// Starts out inside an embedded notebook session.
    pub fn notebook<S: Into<String>>(document: S) -> Self {
        Self {
            notebook: true,
            session: Some(MemorySession {
                document: document.into(),
                url: "notebook".to_string(),
            }),
            ..Self::new()
        }
    }

    /// Lines called `name` get no selectable data store.
    pub fn hide_source<S: Into<String>>(mut self, name: S) -> Self {
        self.hidden_sources.insert(name.into());
        self
    }

    /// Drops the current session, as when the server goes away.
    pub fn close_session(&mut self) {
        self.session = None;
    }

    pub fn session(&self) -> Option<&MemorySession> {
        self.session.as_ref()
    }

    pub fn figures(&self) -> &[MemoryFigure] {
        &self.figures
    }

    pub fn attached(&self) -> &[FigureId] {
        &self.attached
    }

    pub fn push_count(&self) -> usize {
        self.pushes
    }

    /// First line called `name` across all figures.
    pub fn line(&self, name: &str) -> Option<&MemoryLine> {
        self.figures
            .iter()
            .flat_map(|figure| figure.lines.iter())
            .find(|line| line.name == name)
    }

    fn figure_mut(&mut self, figure: FigureId) -> PlotResult<&mut MemoryFigure> {
        self.figures
            .get_mut(figure.0)
            .ok_or_else(|| unknown_figure(figure))
    }
}

impl ChartBackend for MemoryBackend {
    fn availability(&self) -> Availability {
        self.availability.clone()
    }

    fn in_notebook(&self) -> bool {
        self.notebook
    }

    fn has_session(&self) -> bool {
        self.session.is_some()
    }

    fn output_server(&mut self, document: &str, url: &str) -> PlotResult<()> {
        debug!(document, url, "memory session opened");
        self.session = Some(MemorySession {
            document: document.to_string(),
            url: url.to_string(),
        });
        Ok(())
    }

    fn create_figure(&mut self, spec: &FigureSpec) -> PlotResult<FigureId> {
        self.figures.push(MemoryFigure {
            spec: spec.clone(),
            lines: Vec::new(),
            shown: false,
        });
        Ok(FigureId(self.figures.len() - 1))
    }

    fn add_line(&mut self, figure: FigureId, line: &LineSpec) -> PlotResult<()> {
        let source = SourceId(self.next_source);
        self.next_source += 1;
        self.figure_mut(figure)?.lines.push(MemoryLine {
            name: line.name.clone(),
            legend: line.legend.clone(),
            color: line.color,
            source,
            x: line.x.clone(),
            y: line.y.clone(),
        });
        Ok(())
    }

    fn data_source(&self, figure: FigureId, name: &str) -> Option<SourceId> {
        if self.hidden_sources.contains(name) {
            return None;
        }
        find_source(&self.figures.get(figure.0)?.lines, name)
    }

    fn show(&mut self, figure: FigureId) -> PlotResult<()> {
        self.figure_mut(figure)?.shown = true;
        Ok(())
    }

    fn attach(&mut self, figures: &[FigureId]) -> PlotResult<()> {
        attach_figures(&mut self.attached, self.figures.len(), figures)
    }

    fn push(&mut self, updates: &[SeriesUpdate]) -> PlotResult<()> {
        if self.session.is_none() {
            return Err(PlotError::backend("push without an active session"));
        }
        let lines = self.figures.iter_mut().flat_map(|figure| figure.lines.iter_mut());
        apply_updates(lines, updates)?;
        self.pushes += 1;
        Ok(())
    }
}
