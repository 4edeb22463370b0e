//! Per-plane SVD segmentation into cell masks and their fluorescence traces.

use nalgebra::{DMatrix, SymmetricEigen};
use ndarray::{Array1, Array2, Array3, Axis};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::consts::EPSILON;
use crate::error::{Result, VistuneError};
use crate::stats::nanpercentile;
use crate::volume::ImagingStack;

/// Leading singular triplets of a matrix.
#[derive(Clone, Debug)]
pub struct TruncatedSvd {
    /// Singular values, descending.
    pub singular: Vec<f64>,
    /// Left singular vectors as rows, shape = (k, rows).
    pub temporal: Array2<f64>,
    /// Right singular vectors as rows, shape = (k, cols).
    pub spatial: Array2<f64>,
}

/// The `k` leading singular triplets of `a` (no centering).
///
/// Decomposes the Gram matrix of the smaller side, which is far cheaper than
/// a full SVD for (frames x pixels) matrices.
pub fn truncated_svd(a: &DMatrix<f64>, k: usize) -> TruncatedSvd {
    let (rows, cols) = a.shape();
    let tall = rows > cols;
    let gram = if tall {
        a.transpose() * a
    } else {
        a * a.transpose()
    };
    let eigen = SymmetricEigen::new(gram);

    let mut order: Vec<usize> = (0..eigen.eigenvalues.len()).collect();
    order.sort_by(|&i, &j| eigen.eigenvalues[j].total_cmp(&eigen.eigenvalues[i]));
    let k = k.min(order.len());

    let mut singular = Vec::with_capacity(k);
    let mut temporal = Array2::<f64>::zeros((k, rows));
    let mut spatial = Array2::<f64>::zeros((k, cols));

    for (c, &idx) in order.iter().take(k).enumerate() {
        let s = eigen.eigenvalues[idx].max(0.0).sqrt();
        let vec = eigen.eigenvectors.column(idx);
        // The other side of the triplet follows from a v = s u (or a^T u = s v).
        let other = if tall { a * vec } else { a.transpose() * vec };
        let scale = if s > EPSILON { 1.0 / s } else { 0.0 };

        let (left, right): (Vec<f64>, Vec<f64>) = if tall {
            (other.iter().map(|v| v * scale).collect(), vec.iter().copied().collect())
        } else {
            (vec.iter().copied().collect(), other.iter().map(|v| v * scale).collect())
        };
        temporal.row_mut(c).assign(&Array1::from(left));
        spatial.row_mut(c).assign(&Array1::from(right));
        singular.push(s);
    }

    TruncatedSvd {
        singular,
        temporal,
        spatial,
    }
}

/// Result of segmenting a registered stack. One cell per plane.
#[derive(Clone, Debug)]
pub struct Segmentation {
    /// |spatial components| per plane, shape = (components, height, width).
    pub spatial: Vec<Array3<f64>>,
    /// Temporal components per plane, shape = (components, frames).
    pub temporal: Vec<Array2<f64>>,
    /// Binary mask per plane, shape = (height, width).
    pub masks: Vec<Array2<bool>>,
    /// Mean masked fluorescence, shape = (cells, frames).
    pub traces: Array2<f64>,
}

/// Mask of the pixels whose |first spatial component| exceeds the
/// `percentile` of the component.
pub fn component_mask(component: &Array2<f64>, percentile: f64) -> Array2<bool> {
    let threshold = nanpercentile(component.iter().copied(), percentile);
    component.mapv(|v| v > threshold)
}

/// Per-frame mean of the masked pixels of `plane` (frames, height, width).
/// An empty mask gives NaN.
pub fn masked_trace(plane: &Array3<f32>, mask: &Array2<bool>) -> Array1<f64> {
    let traces: Vec<f64> = plane
        .axis_iter(Axis(0))
        .into_par_iter()
        .map(|frame| {
            let (sum, count) = frame
                .iter()
                .zip(mask.iter())
                .filter(|&(_, &m)| m)
                .fold((0.0f64, 0usize), |(s, c), (&v, _)| (s + v as f64, c + 1));
            if count == 0 {
                f64::NAN
            } else {
                sum / count as f64
            }
        })
        .collect();
    Array1::from(traces)
}

/// Segment every plane of `stack`: SVD with `n_comp` components, mask from
/// the first spatial component at `px_threshold` percentile, trace = masked mean.
pub fn segment_planes(stack: &ImagingStack, n_comp: usize, px_threshold: f64) -> Result<Segmentation> {
    if stack.frames() == 0 {
        return Err(VistuneError::EmptySequence);
    }
    if n_comp == 0 {
        return Err(VistuneError::Precondition(
            "segmentation needs at least one component".into(),
        ));
    }
    let (frames, h, w, planes) = stack.data.dim();

    let mut spatial_all = Vec::with_capacity(planes);
    let mut temporal_all = Vec::with_capacity(planes);
    let mut masks = Vec::with_capacity(planes);
    let mut traces = Array2::<f64>::zeros((planes, frames));

    for p in 0..planes {
        let plane = stack.plane(p);
        let matrix = DMatrix::from_fn(frames, h * w, |t, px| plane[[t, px / w, px % w]] as f64);
        let svd = truncated_svd(&matrix, n_comp);

        let spatial = svd
            .spatial
            .mapv(f64::abs)
            .into_shape_with_order((svd.singular.len(), h, w))
            .map_err(|e| VistuneError::ShapeMismatch(e.to_string()))?;
        let first = spatial.index_axis(Axis(0), 0).to_owned();
        let mask = component_mask(&first, px_threshold);
        let trace = masked_trace(&plane, &mask);
        debug!(
            plane = p,
            pixels = mask.iter().filter(|&&m| m).count(),
            leading_singular = svd.singular.first().copied().unwrap_or(0.0),
            "Segmented plane"
        );

        traces.row_mut(p).assign(&trace);
        spatial_all.push(spatial);
        temporal_all.push(svd.temporal);
        masks.push(mask);
    }

    info!(cells = masks.len(), frames, "Segmentation complete");
    Ok(Segmentation {
        spatial: spatial_all,
        temporal: temporal_all,
        masks,
        traces,
    })
}
