use rayon::prelude::*;
use tracing::{debug, warn};

use crate::error::Result;
use crate::stats::{nanpercentile, pearson};
use crate::volume::ImagingStack;

/// Correlation of every frame (all planes flattened) with the stack mean.
pub fn frame_mean_correlations(stack: &ImagingStack) -> Result<Vec<f64>> {
    let mean: Vec<f64> = stack.mean()?.iter().map(|&v| v as f64).collect();
    Ok((0..stack.frames())
        .into_par_iter()
        .map(|i| {
            let frame: Vec<f64> = stack.frame(i).iter().map(|&v| v as f64).collect();
            pearson(&frame, &mean)
        })
        .collect())
}

/// Indices of the frames most similar to the stack mean: those whose
/// correlation reaches the `cut_cc` percentile (0..=100) of all frames.
///
/// The result is in frame order and never empty for a non-empty stack.
pub fn find_target_indices(stack: &ImagingStack, cut_cc: f64) -> Result<Vec<usize>> {
    let correlations = frame_mean_correlations(stack)?;
    let threshold = nanpercentile(correlations.iter().copied(), cut_cc);

    let selected: Vec<usize> = correlations
        .iter()
        .enumerate()
        .filter(|&(_, &c)| !c.is_nan() && c >= threshold)
        .map(|(i, _)| i)
        .collect();

    if selected.is_empty() {
        warn!("No frame correlates with the mean; using every frame as target");
        return Ok((0..stack.frames()).collect());
    }
    debug!(
        selected = selected.len(),
        total = stack.frames(),
        threshold,
        "Selected target frames"
    );
    Ok(selected)
}
