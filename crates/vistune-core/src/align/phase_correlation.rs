use ndarray::{Array2, ArrayView2};
use num_complex::Complex;
use rustfft::FftPlanner;

use crate::consts::EPSILON;
use crate::error::{Result, VistuneError};
use crate::volume::FrameShift;

pub(super) fn check_same_dim(a: ArrayView2<f32>, b: ArrayView2<f32>) -> Result<(usize, usize)> {
    let (h, w) = a.dim();
    let (th, tw) = b.dim();
    if h != th || w != tw {
        return Err(VistuneError::ShapeMismatch(format!(
            "Array size mismatch: {}x{} vs {}x{}",
            w, h, tw, th
        )));
    }
    Ok((h, w))
}

/// Normalized cross-power spectrum of Hann-windowed inputs.
pub(super) fn cross_power_spectrum(
    reference: ArrayView2<f32>,
    target: ArrayView2<f32>,
) -> Array2<Complex<f64>> {
    let ref_fft = fft2d(&apply_hann(reference));
    let tgt_fft = fft2d(&apply_hann(target));
    normalized_cross_power(&ref_fft, &tgt_fft)
}

/// Convert a peak position to a signed offset (handles wrap-around).
pub(super) fn signed_peak(peak_row: usize, peak_col: usize, h: usize, w: usize) -> (f64, f64) {
    let dy = if peak_row > h / 2 {
        peak_row as f64 - h as f64
    } else {
        peak_row as f64
    };
    let dx = if peak_col > w / 2 {
        peak_col as f64 - w as f64
    } else {
        peak_col as f64
    };
    (dy, dx)
}

/// Shift an image by `shift` using bilinear interpolation; uncovered pixels are 0.
pub fn shift_plane(data: ArrayView2<f32>, shift: &FrameShift) -> Array2<f32> {
    let (h, w) = data.dim();
    Array2::from_shape_fn((h, w), |(row, col)| {
        bilinear_sample(data, row as f64 - shift.dy, col as f64 - shift.dx)
    })
}

fn apply_hann(data: ArrayView2<f32>) -> Array2<f64> {
    let (h, w) = data.dim();
    let mut result = Array2::<f64>::zeros((h, w));

    for row in 0..h {
        let wy = 0.5 * (1.0 - (std::f64::consts::TAU * row as f64 / h as f64).cos());
        for col in 0..w {
            let wx = 0.5 * (1.0 - (std::f64::consts::TAU * col as f64 / w as f64).cos());
            result[[row, col]] = data[[row, col]] as f64 * wy * wx;
        }
    }

    result
}

/// 2D FFT: row-wise FFT, then column-wise FFT.
fn fft2d(data: &Array2<f64>) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let fft_row = planner.plan_fft_forward(w);
    let fft_col = planner.plan_fft_forward(h);

    let mut result = data.mapv(|v| Complex::new(v, 0.0));

    for mut row in result.rows_mut() {
        let mut row_data: Vec<Complex<f64>> = row.to_vec();
        fft_row.process(&mut row_data);
        row.assign(&ndarray::ArrayView1::from(&row_data));
    }

    for mut col in result.columns_mut() {
        let mut col_data: Vec<Complex<f64>> = col.to_vec();
        fft_col.process(&mut col_data);
        col.assign(&ndarray::ArrayView1::from(&col_data));
    }

    result
}

/// Inverse 2D FFT, real part, normalized.
pub(super) fn ifft2d(data: &Array2<Complex<f64>>) -> Array2<f64> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let ifft_row = planner.plan_fft_inverse(w);
    let ifft_col = planner.plan_fft_inverse(h);

    let mut work = data.clone();

    for mut col in work.columns_mut() {
        let mut col_data: Vec<Complex<f64>> = col.to_vec();
        ifft_col.process(&mut col_data);
        col.assign(&ndarray::ArrayView1::from(&col_data));
    }

    for mut row in work.rows_mut() {
        let mut row_data: Vec<Complex<f64>> = row.to_vec();
        ifft_row.process(&mut row_data);
        row.assign(&ndarray::ArrayView1::from(&row_data));
    }

    let scale = 1.0 / (h * w) as f64;
    work.mapv(|c| c.re * scale)
}

fn normalized_cross_power(
    ref_fft: &Array2<Complex<f64>>,
    tgt_fft: &Array2<Complex<f64>>,
) -> Array2<Complex<f64>> {
    let mut result = ref_fft.clone();
    result.zip_mut_with(tgt_fft, |r, &t| {
        let cross = *r * t.conj();
        let mag = cross.norm();
        *r = if mag > EPSILON {
            cross / mag
        } else {
            Complex::new(0.0, 0.0)
        };
    });
    result
}

pub(super) fn find_peak(data: &Array2<f64>) -> (usize, usize, f64) {
    let mut best = (0, 0, f64::NEG_INFINITY);
    for ((row, col), &v) in data.indexed_iter() {
        if v > best.2 {
            best = (row, col, v);
        }
    }
    best
}

pub fn bilinear_sample(data: ArrayView2<f32>, y: f64, x: f64) -> f32 {
    let (h, w) = data.dim();

    let x0 = x.floor() as i64;
    let y0 = y.floor() as i64;
    let x1 = x0 + 1;
    let y1 = y0 + 1;

    let fx = (x - x0 as f64) as f32;
    let fy = (y - y0 as f64) as f32;

    let sample = |r: i64, c: i64| -> f32 {
        if r >= 0 && r < h as i64 && c >= 0 && c < w as i64 {
            data[[r as usize, c as usize]]
        } else {
            0.0
        }
    };

    let v00 = sample(y0, x0);
    let v10 = sample(y0, x1);
    let v01 = sample(y1, x0);
    let v11 = sample(y1, x1);

    v00 * (1.0 - fx) * (1.0 - fy)
        + v10 * fx * (1.0 - fy)
        + v01 * (1.0 - fx) * fy
        + v11 * fx * fy
}
