use std::path::Path;

use ndarray::{s, Array4, ArrayView1, ArrayView2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, VistuneError};
use crate::stats::nanmean;

/// One stimulus presentation, in frames of the run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    /// Stimulus direction in degrees.
    pub direction: f64,
    pub start: usize,
    /// Exclusive end frame.
    pub stop: usize,
}

impl Trial {
    pub fn len(&self) -> usize {
        self.stop.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Trial table of a session, stored as `[[trial]]` entries in `behavior.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialTable {
    #[serde(rename = "trial", default)]
    pub trials: Vec<Trial>,
}

impl TrialTable {
    pub fn new(trials: Vec<Trial>) -> Self {
        Self { trials }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let table: Self = toml::from_str(&std::fs::read_to_string(path)?)?;
        info!(path = %path.display(), trials = table.trials.len(), "Loaded trial table");
        Ok(table)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, toml::to_string(self)?)?;
        Ok(())
    }

    /// Distinct directions, ascending.
    pub fn directions(&self) -> Vec<f64> {
        let mut dirs: Vec<f64> = self.trials.iter().map(|t| t.direction).collect();
        dirs.sort_by(|a, b| a.total_cmp(b));
        dirs.dedup();
        dirs
    }

    /// Length of the shortest trial.
    pub fn window(&self) -> usize {
        self.trials.iter().map(Trial::len).min().unwrap_or(0)
    }

    /// Check every trial is non-empty and ends within `frames`.
    pub fn validate(&self, frames: usize) -> Result<()> {
        if self.trials.is_empty() {
            return Err(VistuneError::Behavior("trial table is empty".into()));
        }
        for (i, trial) in self.trials.iter().enumerate() {
            if !trial.direction.is_finite() {
                return Err(VistuneError::Behavior(format!(
                    "trial {} has direction {}",
                    i, trial.direction
                )));
            }
            if trial.is_empty() || trial.stop > frames {
                return Err(VistuneError::Behavior(format!(
                    "trial {} spans frames {}..{} of a {}-frame run",
                    i, trial.start, trial.stop, frames
                )));
            }
        }
        Ok(())
    }
}

/// Trial-aligned responses of all cells.
#[derive(Clone, Debug)]
pub struct TrialResponses {
    /// Distinct directions, ascending; indexes axis 1 of `data`.
    pub directions: Vec<f64>,
    /// Shape = (cells, directions, window, repeats), NaN padded.
    pub data: Array4<f64>,
}

impl TrialResponses {
    pub fn cells(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    /// (directions, window, repeats) block of one cell.
    pub fn cell(&self, cell: usize) -> ArrayView3<f64> {
        self.data.index_axis(Axis(0), cell)
    }
}

/// Cut each trial's first `window` frames out of every cell's dF/F.
///
/// `dff` has shape (cells, frames). Repeats are numbered in trial order per
/// direction; directions with fewer repeats are NaN padded.
pub fn align_trials(dff: ArrayView2<f64>, table: &TrialTable) -> Result<TrialResponses> {
    let (cells, frames) = dff.dim();
    table.validate(frames)?;

    let directions = table.directions();
    let window = table.window();
    let mut counts = vec![0usize; directions.len()];
    let mut slots = Vec::with_capacity(table.trials.len());
    for trial in &table.trials {
        let d = directions
            .iter()
            .position(|&dir| dir == trial.direction)
            .ok_or_else(|| VistuneError::Behavior(format!("unknown direction {}", trial.direction)))?;
        slots.push((d, counts[d], trial.start));
        counts[d] += 1;
    }
    let repeats = counts.iter().copied().max().unwrap_or(0);

    let mut data = Array4::<f64>::from_elem((cells, directions.len(), window, repeats), f64::NAN);
    for c in 0..cells {
        let trace = dff.row(c);
        for &(d, r, start) in &slots {
            data.slice_mut(s![c, d, .., r])
                .assign(&trace.slice(s![start..start + window]));
        }
    }
    debug!(
        cells,
        directions = directions.len(),
        window,
        repeats,
        "Aligned trials"
    );

    Ok(TrialResponses { directions, data })
}

/// Mean response of each recorded trial, grouped by direction.
/// Padding repeats (all NaN) are left out.
pub fn trial_means(trial_df: ArrayView3<f64>) -> Vec<Vec<f64>> {
    trial_df
        .axis_iter(Axis(0))
        .map(|block| {
            block
                .axis_iter(Axis(1))
                .map(|repeat: ArrayView1<f64>| nanmean(repeat.iter().copied()))
                .filter(|m| !m.is_nan())
                .collect()
        })
        .collect()
}

