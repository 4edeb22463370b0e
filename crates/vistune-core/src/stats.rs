//! NaN-aware descriptive statistics shared by the analysis stages.

use num_traits::Float;

/// Arithmetic mean of the finite-or-infinite values, skipping NaN.
/// Returns NaN when every value is NaN.
pub fn nanmean<T: Float>(values: impl IntoIterator<Item = T>) -> f64 {
    let (sum, count) = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .fold((0.0f64, 0usize), |(s, c), v| {
            (s + v.to_f64().unwrap_or(f64::NAN), c + 1)
        });
    if count == 0 {
        f64::NAN
    } else {
        sum / count as f64
    }
}

/// Median skipping NaN. Returns NaN when nothing is left.
pub fn nanmedian<T: Float>(values: impl IntoIterator<Item = T>) -> f64 {
    nanpercentile(values, 50.0)
}

/// Percentile with linear interpolation between closest ranks, skipping NaN.
///
/// `q` is in [0, 100]. Returns NaN when nothing is left.
pub fn nanpercentile<T: Float>(values: impl IntoIterator<Item = T>, q: f64) -> f64 {
    let mut sorted: Vec<f64> = values
        .into_iter()
        .filter(|v| !v.is_nan())
        .filter_map(|v| v.to_f64())
        .collect();
    if sorted.is_empty() {
        return f64::NAN;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    percentile_sorted(&sorted, q)
}

/// Percentile of an already sorted, NaN-free slice.
pub fn percentile_sorted(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = (q.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let frac = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * frac
}

/// Pearson correlation coefficient. NaN propagates: any NaN input gives NaN.
///
/// Returns NaN when either series has zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len());
    let n = a.len().min(b.len());
    if n == 0 {
        return f64::NAN;
    }
    let mean_a = a[..n].iter().sum::<f64>() / n as f64;
    let mean_b = b[..n].iter().sum::<f64>() / n as f64;

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a[..n].iter().zip(&b[..n]) {
        let da = x - mean_a;
        let db = y - mean_b;
        cov += da * db;
        var_a += da * da;
        var_b += db * db;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        return f64::NAN;
    }
    // Clip rounding overshoot, as a coefficient outside [-1, 1] is meaningless.
    (cov / denom).clamp(-1.0, 1.0)
}
