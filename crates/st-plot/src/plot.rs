// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use spiral_config::{PlotSettings, DEFAULT_PLOT_SERVER};
use tracing::{debug, warn};

use crate::backend::{palette_color, ChartBackend, FigureId, FigureSpec, LineSpec, SeriesUpdate, SourceId};
use crate::extension::{CallbackPoint, Extension, Schedule, TrainingLog};
use crate::io::PlotState;
use crate::server::{self, ServerCommand, ServerHandle, SpawnOptions};
use crate::{PlotError, PlotResult};

/// Configuration bundle used by [`Plot`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlotConfig {
    open_browser: bool,
    start_server: bool,
    server_url: String,
    server_command: ServerCommand,
    spawn: SpawnOptions,
    schedule: Schedule,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            open_browser: false,
            start_server: false,
            server_url: DEFAULT_PLOT_SERVER.to_string(),
            server_command: ServerCommand::default(),
            spawn: SpawnOptions::default(),
            schedule: Schedule::default(),
        }
    }
}

impl PlotConfig {
    /// Uses the server address resolved at startup.
    pub fn from_settings(settings: &PlotSettings) -> Self {
        Self::default().with_server_url(settings.server_url.clone())
    }

    /// Opens every figure as soon as it is built.
    pub fn with_open_browser(mut self, open_browser: bool) -> Self {
        self.open_browser = open_browser;
        self
    }

    /// Spawns a plotting server when the extension is built or reconnected.
    pub fn with_start_server(mut self, start_server: bool) -> Self {
        self.start_server = start_server;
        self
    }

    pub fn with_server_url<S: Into<String>>(mut self, url: S) -> Self {
        self.server_url = url.into();
        self
    }

    pub fn with_server_command(mut self, command: ServerCommand) -> Self {
        self.server_command = command;
        self
    }

    pub fn with_spawn_options(mut self, spawn: SpawnOptions) -> Self {
        self.spawn = spawn;
        self
    }

    /// Explicit callback choices; the plot's own defaults fill in the rest.
    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn open_browser(&self) -> bool {
        self.open_browser
    }

    pub fn start_server(&self) -> bool {
        self.start_server
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn server_command(&self) -> &ServerCommand {
        &self.server_command
    }

    pub fn spawn_options(&self) -> &SpawnOptions {
        &self.spawn
    }
}

/// Metrics drawn together on one figure.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartGroup {
    pub title: String,
    pub x_axis_label: String,
    pub y_axis_label: String,
    pub channels: Vec<String>,
}

impl ChartGroup {
    fn new(document: &str, index: usize, channels: Vec<String>) -> Self {
        Self {
            title: format!("{document} #{}", index + 1),
            x_axis_label: "iterations".to_string(),
            y_axis_label: "value".to_string(),
            channels,
        }
    }

    fn figure_spec(&self) -> FigureSpec {
        FigureSpec {
            title: self.title.clone(),
            x_axis_label: self.x_axis_label.clone(),
            y_axis_label: self.y_axis_label.clone(),
        }
    }
}

/// Accumulated `(iteration, value)` points for one metric.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MetricSeries {
    x: Vec<u64>,
    y: Vec<f64>,
    #[serde(skip)]
    synced: usize,
}

impl PartialEq for MetricSeries {
    fn eq(&self, other: &Self) -> bool {
        self.x == other.x && self.y == other.y
    }
}

impl MetricSeries {
    pub fn push(&mut self, iteration: u64, value: f64) {
        self.x.push(iteration);
        self.y.push(value);
    }

    pub fn iterations(&self) -> &[u64] {
        &self.x
    }

    pub fn values(&self) -> &[f64] {
        &self.y
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Number of points not yet pushed to the session.
    pub fn pending(&self) -> usize {
        self.x.len() - self.synced
    }

    fn pending_update(&self, source: SourceId) -> Option<SeriesUpdate> {
        if self.pending() == 0 {
            return None;
        }
        Some(SeriesUpdate {
            source,
            x: self.x[self.synced..].to_vec(),
            y: self.y[self.synced..].to_vec(),
        })
    }

    fn mark_synced(&mut self) {
        self.synced = self.x.len();
    }
}

/// Live plotting of monitored metrics.
///
/// Each inner list of `channels` becomes one figure, so
/// `[["test_cost", "train_cost"], ["weight_norms"]]` draws both costs together
/// and the weight norms on a second figure. Runs before the first epoch and
/// after every epoch unless the configured schedule says otherwise.
///
/// With `start_server` the extension launches its own plotting server. That
/// server outlives training and must be shut down by hand (the PID is
/// logged); launching another one while it still runs fails.
pub struct Plot<B: ChartBackend> {
    document: String,
    config: PlotConfig,
    schedule: Schedule,
    groups: Vec<ChartGroup>,
    chart_of: BTreeMap<String, usize>,
    series: BTreeMap<String, MetricSeries>,
    sources: BTreeMap<String, SourceId>,
    figures: Vec<FigureId>,
    in_notebook: bool,
    server: Option<ServerHandle>,
    backend: B,
}

impl<B: ChartBackend> core::fmt::Debug for Plot<B> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Plot")
            .field("document", &self.document)
            .field("groups", &self.groups.len())
            .field("in_notebook", &self.in_notebook)
            .field("server", &self.server)
            .finish()
    }
}

impl<B: ChartBackend> Plot<B> {
    /// Builds the extension, starting or attaching to a server and creating
    /// one figure per channel group.
    pub fn new<D, C, S>(document: D, channels: C, config: PlotConfig, backend: B) -> PlotResult<Self>
    where
        D: Into<String>,
        C: IntoIterator,
        C::Item: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let document = document.into();
        let groups = channels
            .into_iter()
            .enumerate()
            .map(|(index, group)| {
                ChartGroup::new(&document, index, group.into_iter().map(Into::into).collect())
            })
            .collect::<Vec<_>>();
        let series = groups
            .iter()
            .flat_map(|group| group.channels.iter())
            .map(|channel| (channel.clone(), MetricSeries::default()))
            .collect();
        Self::assemble(document, config, groups, series, backend)
    }

    /// Rebuilds a persisted plot against a fresh backend.
    ///
    /// The server lifecycle runs again (a new server is spawned when
    /// configured; the previous process handle is never restored) and every
    /// figure is recreated from the saved series and attached to the session.
    pub fn reconnect(state: PlotState, backend: B) -> PlotResult<Self> {
        let PlotState {
            document,
            config,
            groups,
            series,
        } = state;
        Self::assemble(document, config, groups, series, backend)
    }

    /// Captures everything needed to [`Plot::reconnect`] later.
    pub fn snapshot(&self) -> PlotState {
        PlotState {
            document: self.document.clone(),
            config: self.config.clone(),
            groups: self.groups.clone(),
            series: self.series.clone(),
        }
    }

    fn assemble(
        document: String,
        config: PlotConfig,
        groups: Vec<ChartGroup>,
        mut series: BTreeMap<String, MetricSeries>,
        backend: B,
    ) -> PlotResult<Self> {
        if let crate::Availability::Unavailable { reason } = backend.availability() {
            return Err(PlotError::DependencyUnavailable { reason });
        }
        for entry in series.values_mut() {
            entry.mark_synced();
        }
        let in_notebook = backend.has_session() && backend.in_notebook();
        let mut schedule = config.schedule.clone();
        schedule.set_default(CallbackPoint::AfterEpoch, true);
        schedule.set_default(CallbackPoint::BeforeFirstEpoch, true);

        let mut plot = Self {
            document,
            config,
            schedule,
            groups,
            chart_of: BTreeMap::new(),
            series,
            sources: BTreeMap::new(),
            figures: Vec::new(),
            in_notebook,
            server: None,
            backend,
        };
        plot.start_server()?;
        plot.build_figures()?;
        Ok(plot)
    }

    fn start_server(&mut self) -> PlotResult<()> {
        self.server = if self.config.start_server {
            Some(server::spawn(&self.config.server_command, &self.config.spawn)?)
        } else {
            None
        };
        if !self.in_notebook {
            self.backend
                .output_server(&self.document, &self.config.server_url)?;
        }
        Ok(())
    }

    fn build_figures(&mut self) -> PlotResult<()> {
        for (index, group) in self.groups.iter().enumerate() {
            let figure = self.backend.create_figure(&group.figure_spec())?;
            for (position, channel) in group.channels.iter().enumerate() {
                self.chart_of.insert(channel.clone(), index);
                let data = self.series.entry(channel.clone()).or_default();
                self.backend.add_line(
                    figure,
                    &LineSpec {
                        name: channel.clone(),
                        legend: channel.clone(),
                        color: palette_color(position),
                        x: data.x.clone(),
                        y: data.y.clone(),
                    },
                )?;
            }
            if self.in_notebook || self.config.open_browser {
                self.backend.show(figure)?;
            }
            for channel in &group.channels {
                match self.backend.data_source(figure, channel) {
                    Some(source) => {
                        self.sources.insert(channel.clone(), source);
                    }
                    None => debug!(metric = %channel, "line has no selectable data source"),
                }
            }
            self.figures.push(figure);
        }
        self.backend.attach(&self.figures)
    }

    /// Appends the current row's values and pushes them in one batch.
    fn update(&mut self, log: &TrainingLog) {
        let iteration = log.status.iterations_done;
        for (key, &value) in &log.current_row {
            if !self.chart_of.contains_key(key) {
                continue;
            }
            if !self.sources.contains_key(key) {
                warn!(metric = %key, "missing key");
                continue;
            }
            self.series.entry(key.clone()).or_default().push(iteration, value);
        }
        self.flush();
    }

    fn flush(&mut self) {
        if !self.backend.has_session() {
            warn!(document = %self.document, "no active plotting session; skipping push");
            return;
        }
        let updates = self
            .sources
            .iter()
            .filter_map(|(name, &source)| self.series.get(name)?.pending_update(source))
            .collect::<Vec<_>>();
        match self.backend.push(&updates) {
            Ok(()) => {
                for name in self.sources.keys() {
                    if let Some(series) = self.series.get_mut(name) {
                        series.mark_synced();
                    }
                }
            }
            Err(err) => warn!(document = %self.document, "failed to push plot updates: {err}"),
        }
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn config(&self) -> &PlotConfig {
        &self.config
    }

    pub fn groups(&self) -> &[ChartGroup] {
        &self.groups
    }

    /// Index of the figure `channel` is drawn on.
    pub fn chart_of(&self, channel: &str) -> Option<usize> {
        self.chart_of.get(channel).copied()
    }

    pub fn series(&self, channel: &str) -> Option<&MetricSeries> {
        self.series.get(channel)
    }

    pub fn figures(&self) -> &[FigureId] {
        &self.figures
    }

    pub fn in_notebook(&self) -> bool {
        self.in_notebook
    }

    /// The server this extension spawned, if any.
    pub fn server(&self) -> Option<&ServerHandle> {
        self.server.as_ref()
    }

    /// Releases the spawned server without stopping it.
    pub fn take_server(&mut self) -> Option<ServerHandle> {
        self.server.take()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: ChartBackend> Extension for Plot<B> {
    fn name(&self) -> &str {
        "Plot"
    }

    fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    fn run(&mut self, _point: CallbackPoint, log: &TrainingLog) -> PlotResult<()> {
        self.update(log);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;

    fn costs_plot(backend: MemoryBackend) -> Plot<MemoryBackend> {
        Plot::new(
            "mnist",
            vec![vec!["train_cost", "test_cost"], vec!["weight_norms"]],
            PlotConfig::default(),
            backend,
        )
        .unwrap()
    }

    fn row(iteration: u64, values: &[(&str, f64)]) -> TrainingLog {
        let mut log = TrainingLog::new();
        log.status.iterations_done = iteration;
        for &(name, value) in values {
            log.record(name, value);
        }
        log
    }

    #[test]
    fn builds_one_figure_per_group_with_palette_colours() {
        let plot = costs_plot(MemoryBackend::new());
        let backend = plot.backend();
        assert_eq!(backend.figures().len(), 2);
        assert_eq!(backend.figures()[0].spec.title, "mnist #1");
        assert_eq!(backend.figures()[1].spec.title, "mnist #2");
        assert_eq!(backend.figures()[0].spec.x_axis_label, "iterations");
        assert_eq!(backend.figures()[0].spec.y_axis_label, "value");
        assert_eq!(backend.line("train_cost").unwrap().color, "#1f77b4");
        assert_eq!(backend.line("test_cost").unwrap().color, "#ff7f0e");
        assert_eq!(backend.line("weight_norms").unwrap().color, "#1f77b4");
        assert_eq!(backend.attached().len(), 2);
        assert_eq!(plot.chart_of("weight_norms"), Some(1));
        assert!(!backend.figures()[0].shown);
    }

    #[test]
    fn registers_document_with_configured_server() {
        let config = PlotConfig::from_settings(
            &PlotSettings::default().with_server_url("http://alice:5006"),
        );
        let plot = Plot::new("exp", vec![vec!["cost"]], config, MemoryBackend::new()).unwrap();
        let session = plot.backend().session().unwrap();
        assert_eq!(session.document, "exp");
        assert_eq!(session.url, "http://alice:5006");
        assert!(plot.server().is_none());
    }

    #[test]
    fn unavailable_backend_fails_construction() {
        let err = Plot::new(
            "exp",
            vec![vec!["cost"]],
            PlotConfig::default(),
            MemoryBackend::unavailable("charting library not linked"),
        )
        .unwrap_err();
        assert!(matches!(err, PlotError::DependencyUnavailable { .. }));
    }

    #[test]
    fn default_schedule_runs_before_first_and_after_each_epoch() {
        let plot = costs_plot(MemoryBackend::new());
        let points: Vec<_> = plot.schedule().points().collect();
        assert_eq!(
            points,
            vec![CallbackPoint::BeforeFirstEpoch, CallbackPoint::AfterEpoch]
        );
    }

    #[test]
    fn explicit_schedule_choice_wins() {
        let config =
            PlotConfig::default().with_schedule(Schedule::new().disable(CallbackPoint::AfterEpoch));
        let mut plot = Plot::new("exp", vec![vec!["cost"]], config, MemoryBackend::new()).unwrap();
        let ran = plot
            .dispatch(CallbackPoint::AfterEpoch, &row(1, &[("cost", 1.0)]))
            .unwrap();
        assert!(!ran);
        assert_eq!(plot.backend().push_count(), 0);
    }

    #[test]
    fn appends_known_metrics_and_pushes_once() {
        let mut plot = costs_plot(MemoryBackend::new());
        let log = row(
            10,
            &[("train_cost", 2.5), ("test_cost", 2.75), ("learning_rate", 0.1)],
        );
        assert!(plot.dispatch(CallbackPoint::AfterEpoch, &log).unwrap());

        let series = plot.series("train_cost").unwrap();
        assert_eq!(series.iterations(), &[10]);
        assert_eq!(series.values(), &[2.5]);
        assert_eq!(series.pending(), 0);
        assert!(plot.series("learning_rate").is_none());
        assert!(plot.series("weight_norms").unwrap().is_empty());

        let backend = plot.backend();
        assert_eq!(backend.push_count(), 1);
        assert_eq!(backend.line("test_cost").unwrap().x, vec![10]);
        assert_eq!(backend.line("test_cost").unwrap().y, vec![2.75]);
    }

    #[test]
    fn missing_data_source_skips_only_that_metric() {
        let mut plot = costs_plot(MemoryBackend::new().hide_source("train_cost"));
        let log = row(3, &[("train_cost", 1.0), ("test_cost", 1.5)]);
        plot.run(CallbackPoint::AfterEpoch, &log).unwrap();

        assert!(plot.series("train_cost").unwrap().is_empty());
        assert_eq!(plot.series("test_cost").unwrap().values(), &[1.5]);
        assert!(plot.backend().line("train_cost").unwrap().x.is_empty());
        assert_eq!(plot.backend().push_count(), 1);
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn missing_data_source_logs_missing_key() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, || {
            let mut plot = costs_plot(MemoryBackend::new().hide_source("train_cost"));
            plot.run(CallbackPoint::AfterEpoch, &row(3, &[("train_cost", 1.0)]))
                .unwrap();
        });

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let line = output
            .lines()
            .find(|line| line.contains("missing key"))
            .expect("no missing key event");
        assert!(line.contains("WARN"));
        assert!(line.contains("metric=train_cost"));
    }

    #[test]
    fn lost_session_skips_push_and_keeps_points_pending() {
        let mut plot = costs_plot(MemoryBackend::new());
        plot.backend_mut().close_session();
        plot.run(CallbackPoint::AfterEpoch, &row(1, &[("train_cost", 4.0)]))
            .unwrap();
        assert_eq!(plot.backend().push_count(), 0);
        assert_eq!(plot.series("train_cost").unwrap().pending(), 1);
        assert!(plot.backend().line("train_cost").unwrap().x.is_empty());

        plot.backend_mut()
            .output_server("mnist", DEFAULT_PLOT_SERVER)
            .unwrap();
        plot.run(CallbackPoint::AfterEpoch, &row(2, &[("train_cost", 3.0)]))
            .unwrap();
        assert_eq!(plot.backend().push_count(), 1);
        assert_eq!(plot.backend().line("train_cost").unwrap().x, vec![1, 2]);
    }

    #[test]
    fn notebook_sessions_show_figures_without_registering_a_document() {
        let plot = costs_plot(MemoryBackend::notebook("scratch"));
        assert!(plot.in_notebook());
        let backend = plot.backend();
        assert_eq!(backend.session().unwrap().url, "notebook");
        assert!(backend.figures().iter().all(|figure| figure.shown));
    }

    #[test]
    fn open_browser_shows_every_figure() {
        let plot = Plot::new(
            "exp",
            vec![vec!["a"], vec!["b"]],
            PlotConfig::default().with_open_browser(true),
            MemoryBackend::new(),
        )
        .unwrap();
        assert!(plot.backend().figures().iter().all(|figure| figure.shown));
    }

    #[test]
    fn reconnect_rebuilds_figures_from_saved_series() {
        let mut plot = costs_plot(MemoryBackend::new());
        plot.run(CallbackPoint::AfterEpoch, &row(5, &[("train_cost", 0.9)]))
            .unwrap();
        let state = plot.snapshot();

        let restored = Plot::reconnect(state, MemoryBackend::new()).unwrap();
        let backend = restored.backend();
        assert_eq!(backend.session().unwrap().document, "mnist");
        assert_eq!(backend.attached().len(), 2);
        assert_eq!(backend.line("train_cost").unwrap().x, vec![5]);
        assert_eq!(restored.series("train_cost").unwrap().pending(), 0);
        assert!(restored.server().is_none());
    }
}
