// SPDX-License-Identifier: AGPL-3.0-or-later
// © 2025 Ryo ∴ SpiralArchitect (kishkavsesvit@icloud.com)
// Part of SpiralTorch — Licensed under AGPL-3.0-or-later.
// Unauthorized derivative works or closed redistribution prohibited under AGPL §13.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{PlotError, PlotResult};

/// Points in the training loop where extensions may run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackPoint {
    BeforeTraining,
    BeforeFirstEpoch,
    BeforeEpoch,
    AfterBatch,
    AfterEpoch,
    AfterTraining,
    OnInterrupt,
}

impl CallbackPoint {
    pub const ALL: [CallbackPoint; 7] = [
        CallbackPoint::BeforeTraining,
        CallbackPoint::BeforeFirstEpoch,
        CallbackPoint::BeforeEpoch,
        CallbackPoint::AfterBatch,
        CallbackPoint::AfterEpoch,
        CallbackPoint::AfterTraining,
        CallbackPoint::OnInterrupt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CallbackPoint::BeforeTraining => "before_training",
            CallbackPoint::BeforeFirstEpoch => "before_first_epoch",
            CallbackPoint::BeforeEpoch => "before_epoch",
            CallbackPoint::AfterBatch => "after_batch",
            CallbackPoint::AfterEpoch => "after_epoch",
            CallbackPoint::AfterTraining => "after_training",
            CallbackPoint::OnInterrupt => "on_interrupt",
        }
    }
}

impl fmt::Display for CallbackPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CallbackPoint {
    type Err = PlotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CallbackPoint::ALL
            .into_iter()
            .find(|point| point.as_str() == s)
            .ok_or_else(|| PlotError::UnknownCallback {
                name: s.to_string(),
            })
    }
}

/// Which callback points an extension runs at.
///
/// Explicit choices made through [`Schedule::enable`] and
/// [`Schedule::disable`] are never overridden by [`Schedule::set_default`],
/// so an extension can declare its defaults after the caller configured it.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    points: Vec<(CallbackPoint, bool)>,
}

impl Schedule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enable(mut self, point: CallbackPoint) -> Self {
        self.set(point, true);
        self
    }

    pub fn disable(mut self, point: CallbackPoint) -> Self {
        self.set(point, false);
        self
    }

    /// Records `enabled` for `point` unless the caller already decided.
    pub fn set_default(&mut self, point: CallbackPoint, enabled: bool) {
        if self.choice(point).is_none() {
            self.set(point, enabled);
        }
    }

    pub fn contains(&self, point: CallbackPoint) -> bool {
        self.choice(point).unwrap_or(false)
    }

    /// Enabled points in lifecycle order.
    pub fn points(&self) -> impl Iterator<Item = CallbackPoint> + '_ {
        self.points
            .iter()
            .filter(|(_, enabled)| *enabled)
            .map(|(point, _)| *point)
    }

    fn choice(&self, point: CallbackPoint) -> Option<bool> {
        self.points
            .iter()
            .find(|(existing, _)| *existing == point)
            .map(|(_, enabled)| *enabled)
    }

    fn set(&mut self, point: CallbackPoint, enabled: bool) {
        match self.points.iter_mut().find(|(existing, _)| *existing == point) {
            Some(entry) => entry.1 = enabled,
            None => {
                self.points.push((point, enabled));
                self.points.sort_by_key(|(point, _)| *point);
            }
        }
    }
}

/// Progress counters maintained by the training loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingStatus {
    pub iterations_done: u64,
    pub epochs_done: u64,
}

/// The part of the training log extensions read: status and the latest row.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingLog {
    pub status: TrainingStatus,
    pub current_row: BTreeMap<String, f64>,
}

impl TrainingLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a metric value in the current row.
    pub fn record<S: Into<String>>(&mut self, name: S, value: f64) {
        self.current_row.insert(name.into(), value);
    }

    /// Moves to the next iteration with an empty row.
    pub fn next_iteration(&mut self) {
        self.status.iterations_done += 1;
        self.current_row.clear();
    }

    pub fn finish_epoch(&mut self) {
        self.status.epochs_done += 1;
    }
}

/// Callback invoked by a training loop.
pub trait Extension {
    fn name(&self) -> &str;

    fn schedule(&self) -> &Schedule;

    /// Does the work for `point`; only called for scheduled points.
    fn run(&mut self, point: CallbackPoint, log: &TrainingLog) -> PlotResult<()>;

    /// Runs the extension if it is scheduled at `point`. Returns whether it ran.
    fn dispatch(&mut self, point: CallbackPoint, log: &TrainingLog) -> PlotResult<bool> {
        if !self.schedule().contains(point) {
            return Ok(false);
        }
        self.run(point, log)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_do_not_override_explicit_choices() {
        let mut schedule = Schedule::new().disable(CallbackPoint::AfterEpoch);
        schedule.set_default(CallbackPoint::AfterEpoch, true);
        schedule.set_default(CallbackPoint::BeforeFirstEpoch, true);
        assert!(!schedule.contains(CallbackPoint::AfterEpoch));
        assert!(schedule.contains(CallbackPoint::BeforeFirstEpoch));
        assert_eq!(
            schedule.points().collect::<Vec<_>>(),
            vec![CallbackPoint::BeforeFirstEpoch]
        );
    }

    #[test]
    fn callback_names_parse() {
        for point in CallbackPoint::ALL {
            assert_eq!(point.to_string().parse::<CallbackPoint>().unwrap(), point);
        }
        assert!(matches!(
            "after_everything".parse::<CallbackPoint>(),
            Err(PlotError::UnknownCallback { .. })
        ));
    }

    #[test]
    fn next_iteration_clears_row() {
        let mut log = TrainingLog::new();
        log.record("train_cost", 1.0);
        log.next_iteration();
        assert_eq!(log.status.iterations_done, 1);
        assert!(log.current_row.is_empty());
    }
}
