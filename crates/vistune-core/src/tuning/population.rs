use ndarray::{Array1, ArrayD, ArrayView2, Axis, Ix2};

use crate::error::{Result, VistuneError};
use crate::stats::{nanmean, pearson};

/// Correlation of each cell's signal to the mean of all other cells.
///
/// `signals` has shape (cells, time). The leave-one-out mean skips NaN, while
/// NaN inside the cell's own series is kept, so such a cell gets NaN.
pub fn population_correlation(signals: ArrayView2<f64>) -> Result<Array1<f64>> {
    let (cells, time) = signals.dim();
    if cells < 2 {
        return Err(VistuneError::Precondition(format!(
            "population correlation needs at least 2 cells, got {}",
            cells
        )));
    }

    let mut result = Array1::<f64>::zeros(cells);
    for i in 0..cells {
        let others_mean: Vec<f64> = (0..time)
            .map(|t| {
                let column = signals.index_axis(Axis(1), t);
                nanmean(
                    column
                        .iter()
                        .enumerate()
                        .filter(|&(c, _)| c != i)
                        .map(|(_, &v)| v),
                )
            })
            .collect();
        let own: Vec<f64> = signals.row(i).to_vec();
        result[i] = pearson(&own, &others_mean);
    }
    Ok(result)
}

/// Dimension-checked entry point for arrays whose rank is only known at runtime.
pub fn population_correlation_dyn(signals: &ArrayD<f64>) -> Result<Array1<f64>> {
    let view = signals
        .view()
        .into_dimensionality::<Ix2>()
        .map_err(|_| {
            VistuneError::ShapeMismatch(format!(
                "expected a 2-D (cells, time) array, got shape {:?}",
                signals.shape()
            ))
        })?;
    population_correlation(view)
}
