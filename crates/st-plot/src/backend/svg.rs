// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::ops::Range;
use std::path::{Path, PathBuf};

use plotters::prelude::*;
use tracing::{debug, info, warn};

use super::{
    apply_updates, attach_figures, find_source, unknown_figure, Availability, ChartBackend,
    FigureId, FigureSpec, LineSpec, SeriesUpdate, SourceId, StoredLine,
};
use crate::{PlotError, PlotResult};

struct SvgLine {
    name: String,
    legend: String,
    color: RGBColor,
    source: SourceId,
    x: Vec<u64>,
    y: Vec<f64>,
}

impl StoredLine for SvgLine {
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

struct SvgFigure {
    spec: FigureSpec,
    lines: Vec<SvgLine>,
}

impl SvgFigure {
    fn bounds(&self) -> (Range<f64>, Range<f64>) {
        let xs = self.lines.iter().flat_map(|line| line.x.iter().map(|&x| x as f64));
        let ys = self.lines.iter().flat_map(|line| line.y.iter().copied());
        (padded_range(xs), padded_range(ys))
    }
}

fn padded_range(values: impl Iterator<Item = f64>) -> Range<f64> {
    let (min, max) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !min.is_finite() {
        return 0.0..1.0;
    }
    if max - min < f64::EPSILON {
        return (min - 1.0)..(max + 1.0);
    }
    let pad = (max - min) * 0.05;
    (min - pad)..(max + pad)
}

fn parse_hex(color: &str) -> Option<RGBColor> {
    let hex = color.strip_prefix('#')?;
    if hex.len() != 6 {
        return None;
    }
    let channel = |at: usize| u8::from_str_radix(hex.get(at..at + 2)?, 16).ok();
    Some(RGBColor(channel(0)?, channel(2)?, channel(4)?))
}

/// Offline rendering session: every attached figure is written to
/// `<dir>/<document>-<n>.svg` whenever points are pushed.
pub struct SvgBackend {
    dir: PathBuf,
    size: (u32, u32),
    availability: Availability,
    document: Option<String>,
    figures: Vec<SvgFigure>,
    attached: Vec<FigureId>,
    next_source: usize,
}

impl core::fmt::Debug for SvgBackend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SvgBackend")
            .field("dir", &self.dir)
            .field("document", &self.document)
            .field("figures", &self.figures.len())
            .finish()
    }
}

impl SvgBackend {
    /// Uses `dir` for output, creating it if needed. A directory that cannot
    /// be created makes the backend unavailable.
    pub fn new<P: Into<PathBuf>>(dir: P) -> Self {
        let dir = dir.into();
        let availability = match std::fs::create_dir_all(&dir) {
            Ok(()) => Availability::Available,
            Err(err) => Availability::Unavailable {
                reason: format!("cannot create {}: {err}", dir.display()),
            },
        };
        Self {
            dir,
            size: (800, 480),
            availability,
            document: None,
            figures: Vec::new(),
            attached: Vec::new(),
            next_source: 0,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = (width.max(64), height.max(64));
        self
    }

    /// Path the figure is rendered to under the current document.
    pub fn figure_path(&self, figure: FigureId) -> PathBuf {
        let document = self.document.as_deref().unwrap_or("untitled");
        self.dir.join(format!("{document}-{}.svg", figure.0 + 1))
    }

    fn figure_mut(&mut self, figure: FigureId) -> PlotResult<&mut SvgFigure> {
        self.figures
            .get_mut(figure.0)
            .ok_or_else(|| unknown_figure(figure))
    }

    fn render(&self, figure: FigureId) -> PlotResult<PathBuf> {
        let data = self
            .figures
            .get(figure.0)
            .ok_or_else(|| unknown_figure(figure))?;
        let path = self.figure_path(figure);
        draw_figure(data, &path, self.size)?;
        debug!(path = %path.display(), "rendered figure");
        Ok(path)
    }
}

fn draw_figure(figure: &SvgFigure, path: &Path, size: (u32, u32)) -> PlotResult<()> {
    let root = SVGBackend::new(path, size).into_drawing_area();
    root.fill(&WHITE).map_err(PlotError::backend)?;
    let (x_range, y_range) = figure.bounds();
    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .caption(&figure.spec.title, ("sans-serif", 20))
        .x_label_area_size(30)
        .y_label_area_size(50)
        .build_cartesian_2d(x_range, y_range)
        .map_err(PlotError::backend)?;
    chart
        .configure_mesh()
        .x_desc(figure.spec.x_axis_label.as_str())
        .y_desc(figure.spec.y_axis_label.as_str())
        .draw()
        .map_err(PlotError::backend)?;

    for line in &figure.lines {
        let color = line.color;
        chart
            .draw_series(LineSeries::new(
                line.x.iter().zip(&line.y).map(|(&x, &y)| (x as f64, y)),
                &color,
            ))
            .map_err(PlotError::backend)?
            .label(line.legend.as_str())
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &color));
    }
    if !figure.lines.is_empty() {
        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK)
            .draw()
            .map_err(PlotError::backend)?;
    }
    root.present().map_err(PlotError::backend)?;
    Ok(())
}

impl ChartBackend for SvgBackend {
    fn availability(&self) -> Availability {
        self.availability.clone()
    }

    fn has_session(&self) -> bool {
        self.document.is_some()
    }

    fn output_server(&mut self, document: &str, url: &str) -> PlotResult<()> {
        debug!(document, url, "svg backend renders locally; server address unused");
        self.document = Some(document.to_string());
        Ok(())
    }

    fn create_figure(&mut self, spec: &FigureSpec) -> PlotResult<FigureId> {
        self.figures.push(SvgFigure {
            spec: spec.clone(),
            lines: Vec::new(),
        });
        Ok(FigureId(self.figures.len() - 1))
    }

    fn add_line(&mut self, figure: FigureId, line: &LineSpec) -> PlotResult<()> {
        let color = parse_hex(line.color).unwrap_or(BLACK);
        let source = SourceId(self.next_source);
        self.next_source += 1;
        self.figure_mut(figure)?.lines.push(SvgLine {
            name: line.name.clone(),
            legend: line.legend.clone(),
            color,
            source,
            x: line.x.clone(),
            y: line.y.clone(),
        });
        Ok(())
    }

    fn data_source(&self, figure: FigureId, name: &str) -> Option<SourceId> {
        find_source(&self.figures.get(figure.0)?.lines, name)
    }

    fn show(&mut self, figure: FigureId) -> PlotResult<()> {
        let path = self.render(figure)?;
        info!(path = %path.display(), "figure written");
        Ok(())
    }

    fn attach(&mut self, figures: &[FigureId]) -> PlotResult<()> {
        attach_figures(&mut self.attached, self.figures.len(), figures)
    }

    fn push(&mut self, updates: &[SeriesUpdate]) -> PlotResult<()> {
        if self.document.is_none() {
            return Err(PlotError::backend("push without an active document"));
        }
        let lines = self.figures.iter_mut().flat_map(|figure| figure.lines.iter_mut());
        apply_updates(lines, updates)?;
        // The points are stored at this point; a failed write is redone on the next push.
        for &figure in &self.attached {
            if let Err(err) = self.render(figure) {
                warn!(path = %self.figure_path(figure).display(), "failed to render figure: {err}");
            }
        }
        Ok(())
    }
}
