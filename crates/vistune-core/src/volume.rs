use ndarray::{s, Array3, Array4, ArrayView3, Axis};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, VistuneError};

/// A multi-plane imaging run held in memory.
///
/// Pixel values are f32, shape = (frames, height, width, planes).
#[derive(Clone, Debug)]
pub struct ImagingStack {
    pub data: Array4<f32>,
}

/// Translation of one frame of one plane relative to its registration target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct FrameShift {
    pub dy: f64,
    pub dx: f64,
}

/// Per-frame, per-plane shifts, shape = (frames, planes, 2) as (dy, dx).
pub type Shifts = Array3<f64>;

impl ImagingStack {
    pub fn new(data: Array4<f32>) -> Self {
        Self { data }
    }

    /// Assemble a stack from per-frame volumes of shape (height, width, planes).
    pub fn from_frames(frames: &[Array3<f32>]) -> Result<Self> {
        let first = frames.first().ok_or(VistuneError::EmptySequence)?;
        let dim = first.dim();
        if let Some(bad) = frames.iter().find(|f| f.dim() != dim) {
            return Err(VistuneError::ShapeMismatch(format!(
                "frame {:?} vs {:?}",
                bad.dim(),
                dim
            )));
        }
        let views: Vec<ArrayView3<f32>> = frames.iter().map(|f| f.view()).collect();
        let data = ndarray::stack(Axis(0), &views)
            .map_err(|e| VistuneError::ShapeMismatch(e.to_string()))?;
        Ok(Self { data })
    }

    pub fn frames(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn height(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn width(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    pub fn planes(&self) -> usize {
        self.data.len_of(Axis(3))
    }

    /// One time point, shape = (height, width, planes).
    pub fn frame(&self, index: usize) -> ArrayView3<'_, f32> {
        self.data.index_axis(Axis(0), index)
    }

    /// All time points of one plane, shape = (frames, height, width).
    pub fn plane(&self, plane: usize) -> Array3<f32> {
        self.data.slice(s![.., .., .., plane]).to_owned()
    }

    /// Pixel-wise temporal mean, shape = (height, width, planes).
    pub fn mean(&self) -> Result<Array3<f32>> {
        let n = self.frames();
        if n == 0 {
            return Err(VistuneError::EmptySequence);
        }
        let (_, h, w, p) = self.data.dim();
        let mut acc = Array3::<f64>::zeros((h, w, p));
        for frame in self.data.outer_iter() {
            acc.zip_mut_with(&frame, |a, &v| *a += v as f64);
        }
        Ok(acc.mapv(|v| (v / n as f64) as f32))
    }

    /// Sub-stack of the given time points, in the given order.
    pub fn select(&self, indices: &[usize]) -> Result<Self> {
        if indices.is_empty() {
            return Err(VistuneError::EmptySequence);
        }
        if let Some(&bad) = indices.iter().find(|&&i| i >= self.frames()) {
            return Err(VistuneError::Precondition(format!(
                "frame index {} out of range (total: {})",
                bad,
                self.frames()
            )));
        }
        Ok(Self {
            data: self.data.select(Axis(0), indices),
        })
    }

    /// Zero the first `rows` rows of every frame and plane (scanner fly-back line).
    pub fn zero_leading_rows(&mut self, rows: usize) {
        let rows = rows.min(self.height());
        self.data.slice_mut(s![.., ..rows, .., ..]).fill(0.0);
    }

    /// Apply `f` to every time point in parallel. `f` must preserve the frame shape.
    pub fn map_frames<F>(&self, f: F) -> Result<Self>
    where
        F: Fn(usize, ArrayView3<f32>) -> Array3<f32> + Sync,
    {
        let mapped: Vec<Array3<f32>> = (0..self.frames())
            .into_par_iter()
            .map(|i| f(i, self.frame(i)))
            .collect();
        Self::from_frames(&mapped)
    }
}
