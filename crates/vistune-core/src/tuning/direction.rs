use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::consts::{DIRECTION_CONFIDENCE, EPSILON};
use crate::stats::{nanmean, nanpercentile};

/// Preferred direction of a cell and the width of its confidence interval,
/// both in degrees. Either is `None` when the cell has no reliable tuning.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DirectionEstimate {
    pub direction: Option<f64>,
    pub interval: Option<f64>,
}

/// Settings of the bootstrap direction estimate.
#[derive(Clone, Copy, Debug)]
pub struct DirectionParams {
    pub angle_cutoff: f64,
    pub samples: usize,
    pub seed: u64,
}

/// Vector-sum direction (degrees in [0, 360)) of rectified mean responses.
/// `None` when every response is non-positive or NaN.
pub fn vector_sum_direction(directions: &[f64], responses: &[f64]) -> Option<f64> {
    let (mut x, mut y) = (0.0, 0.0);
    for (&dir, &r) in directions.iter().zip(responses) {
        if r.is_nan() || r <= 0.0 {
            continue;
        }
        let theta = dir.to_radians();
        x += r * theta.cos();
        y += r * theta.sin();
    }
    if x.hypot(y) < EPSILON {
        return None;
    }
    Some(y.atan2(x).to_degrees().rem_euclid(360.0))
}

/// Absolute angular distance in degrees, in [0, 180].
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let d = (a - b).rem_euclid(360.0);
    d.min(360.0 - d)
}

/// Estimate the preferred direction from per-trial mean responses grouped
/// by direction (`trial_means[d]` belongs to `directions[d]`).
///
/// The interval is the full width of the central confidence band of a
/// bootstrap over repeats. Direction and interval are reported only for a
/// significant cell whose interval is within `angle_cutoff`.
pub fn estimate_direction(
    directions: &[f64],
    trial_means: &[Vec<f64>],
    significant: bool,
    params: &DirectionParams,
) -> DirectionEstimate {
    if !significant {
        return DirectionEstimate::default();
    }
    let means: Vec<f64> = trial_means.iter().map(|g| nanmean(g.iter().copied())).collect();
    let Some(preferred) = vector_sum_direction(directions, &means) else {
        return DirectionEstimate::default();
    };

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut deviations = Vec::with_capacity(params.samples);
    let mut resampled = vec![f64::NAN; trial_means.len()];
    for _ in 0..params.samples {
        for (slot, group) in resampled.iter_mut().zip(trial_means) {
            *slot = if group.is_empty() {
                f64::NAN
            } else {
                let draws = (0..group.len()).map(|_| group[rng.gen_range(0..group.len())]);
                nanmean(draws)
            };
        }
        if let Some(dir) = vector_sum_direction(directions, &resampled) {
            deviations.push(angular_distance(dir, preferred));
        }
    }

    let interval = if deviations.is_empty() {
        f64::NAN
    } else {
        2.0 * nanpercentile(deviations.iter().copied(), DIRECTION_CONFIDENCE * 100.0)
    };
    if interval.is_nan() || interval > params.angle_cutoff {
        return DirectionEstimate::default();
    }
    DirectionEstimate {
        direction: Some(preferred),
        interval: Some(interval),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_angular_distance_wraps() {
        assert!((angular_distance(350.0, 10.0) - 20.0).abs() < 1e-12);
        assert!((angular_distance(0.0, 180.0) - 180.0).abs() < 1e-12);
        assert!((angular_distance(90.0, 90.0)).abs() < 1e-12);
    }

    #[test]
    fn test_vector_sum_single_peak() {
        let dirs = [0.0, 90.0, 180.0, 270.0];
        let dir = vector_sum_direction(&dirs, &[0.0, 1.0, 0.0, 0.0]).unwrap();
        assert!((dir - 90.0).abs() < 1e-9);
        assert!(vector_sum_direction(&dirs, &[0.0, 0.0, 0.0, 0.0]).is_none());
    }
}
