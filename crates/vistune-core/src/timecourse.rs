//! Fluorescence time courses: baseline, dF/F and noise per cell.

use std::path::Path;

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, VistuneError};
use crate::pipeline::config::TimeCourseConfig;
use crate::segment::Segmentation;
use crate::stats::{nanmedian, nanpercentile};

/// Per-cell time courses of a registration, all shaped (cells, frames).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeCourses {
    /// Binary mask per cell, shape = (height, width).
    pub masks: Vec<Array2<bool>>,
    /// Raw masked-mean fluorescence.
    pub tc: Array2<f64>,
    /// Each cell's temporal mean, repeated over time.
    pub motion: Array2<f64>,
    /// Each cell's mask pixel count, repeated over time.
    pub pixels: Array2<f64>,
    pub baseline: Array2<f64>,
    pub dff: Array2<f64>,
    /// Per-sample noise estimate of the dF/F.
    pub noise: Array2<f64>,
}

impl TimeCourses {
    pub fn from_segmentation(segmentation: &Segmentation, config: &TimeCourseConfig) -> Self {
        let tc = segmentation.traces.clone();
        let (cells, frames) = tc.dim();

        let mut motion = Array2::<f64>::zeros((cells, frames));
        let mut pixels = Array2::<f64>::zeros((cells, frames));
        let mut baseline = Array2::<f64>::zeros((cells, frames));
        let mut dff = Array2::<f64>::zeros((cells, frames));
        let mut noise = Array2::<f64>::zeros((cells, frames));

        for (c, trace) in tc.axis_iter(Axis(0)).enumerate() {
            motion.row_mut(c).fill(trace.mean().unwrap_or(f64::NAN));
            let count = segmentation.masks[c].iter().filter(|&&m| m).count();
            pixels.row_mut(c).fill(count as f64);

            let base = running_baseline(trace, config.baseline_window, config.step, config.percentile);
            let cell_dff = delta_f_over_f(trace, base.view());
            noise.row_mut(c).assign(&noise_series(cell_dff.view()));
            baseline.row_mut(c).assign(&base);
            dff.row_mut(c).assign(&cell_dff);
        }
        debug!(cells, frames, "Computed baseline and noise");

        Self {
            masks: segmentation.masks.clone(),
            tc,
            motion,
            pixels,
            baseline,
            dff,
            noise,
        }
    }

    pub fn cells(&self) -> usize {
        self.tc.nrows()
    }

    /// Median noise of each cell, skipping NaN.
    pub fn cell_noise(&self) -> Array1<f64> {
        self.noise
            .axis_iter(Axis(0))
            .map(|row| nanmedian(row.iter().copied()))
            .collect()
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, toml::to_string(self)?)?;
        info!(path = %path.display(), "Cached time courses");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let courses: Self = toml::from_str(&std::fs::read_to_string(path)?)?;
        if courses.masks.len() != courses.cells() {
            return Err(VistuneError::ShapeMismatch(format!(
                "{} masks for {} cells in {}",
                courses.masks.len(),
                courses.cells(),
                path.display()
            )));
        }
        info!(path = %path.display(), cells = courses.cells(), "Loaded cached time courses");
        Ok(courses)
    }
}

/// Running low-percentile baseline.
///
/// The percentile of a `window`-wide neighborhood is evaluated every `step`
/// samples (and at the last sample) and linearly interpolated in between.
pub fn running_baseline(
    trace: ArrayView1<f64>,
    window: usize,
    step: usize,
    percentile: f64,
) -> Array1<f64> {
    let n = trace.len();
    if n == 0 {
        return Array1::zeros(0);
    }
    let step = step.max(1);
    let half = window / 2;

    let mut anchors: Vec<usize> = (0..n).step_by(step).collect();
    if anchors.last() != Some(&(n - 1)) {
        anchors.push(n - 1);
    }
    let values: Vec<f64> = anchors
        .iter()
        .map(|&t| {
            let lo = t.saturating_sub(half);
            let hi = (t + half + 1).min(n);
            nanpercentile(trace.slice(ndarray::s![lo..hi]).iter().copied(), percentile)
        })
        .collect();

    let mut baseline = Array1::<f64>::zeros(n);
    if anchors.len() == 1 {
        baseline.fill(values[0]);
        return baseline;
    }
    for pair in 0..anchors.len() - 1 {
        let (t0, t1) = (anchors[pair], anchors[pair + 1]);
        let (v0, v1) = (values[pair], values[pair + 1]);
        for t in t0..=t1 {
            let frac = (t - t0) as f64 / (t1 - t0) as f64;
            baseline[t] = v0 + (v1 - v0) * frac;
        }
    }
    baseline
}

/// (F - F0) / F0; NaN where the baseline is zero.
pub fn delta_f_over_f(trace: ArrayView1<f64>, baseline: ArrayView1<f64>) -> Array1<f64> {
    trace
        .iter()
        .zip(baseline.iter())
        .map(|(&f, &f0)| if f0 == 0.0 { f64::NAN } else { (f - f0) / f0 })
        .collect()
}

/// Per-sample noise |dF/F[t] - dF/F[t-1]| / sqrt(2); the first sample is NaN.
pub fn noise_series(dff: ArrayView1<f64>) -> Array1<f64> {
    let mut out = Array1::<f64>::from_elem(dff.len(), f64::NAN);
    for t in 1..dff.len() {
        out[t] = (dff[t] - dff[t - 1]).abs() / std::f64::consts::SQRT_2;
    }
    out
}
