mod common;

use approx::assert_abs_diff_eq;
use nalgebra::DMatrix;
use ndarray::{array, Array1, Array2, Array3, Array4};

use vistune_core::pipeline::config::TimeCourseConfig;
use vistune_core::segment::{component_mask, masked_trace, segment_planes, truncated_svd};
use vistune_core::timecourse::{delta_f_over_f, noise_series, running_baseline, TimeCourses};
use vistune_core::volume::ImagingStack;

use common::gaussian_blob;

/// Frames = blob * amplitude(t) + background, one blob per plane.
fn modulated_stack(frames: usize) -> (ImagingStack, Vec<Vec<f32>>) {
    let blobs = [
        gaussian_blob(24, 24, 8.0, 8.0, 2.5),
        gaussian_blob(24, 24, 15.0, 16.0, 2.5),
    ];
    let amplitudes: Vec<Vec<f32>> = (0..2)
        .map(|p| {
            (0..frames)
                .map(|t| 0.4 + 0.3 * ((t as f32 * 0.37 + p as f32 * 1.3).sin()))
                .collect()
        })
        .collect();
    let data = Array4::from_shape_fn((frames, 24, 24, 2), |(t, r, c, p)| {
        blobs[p][[r, c]] * amplitudes[p][t] + 0.02
    });
    (ImagingStack::new(data), amplitudes)
}

#[test]
fn test_truncated_svd_rank_one() {
    let u = [1.0, 2.0, 3.0];
    let v = [0.5, -1.0, 2.0, 0.0];
    let a = DMatrix::from_fn(3, 4, |i, j| u[i] * v[j]);

    let svd = truncated_svd(&a, 2);
    let norm_u = u.iter().map(|x| x * x).sum::<f64>().sqrt();
    let norm_v = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    assert_abs_diff_eq!(svd.singular[0], norm_u * norm_v, epsilon = 1e-9);
    assert!(svd.singular[1].abs() < 1e-6);
    assert_eq!(svd.temporal.dim(), (2, 3));
    assert_eq!(svd.spatial.dim(), (2, 4));

    // Rebuild the matrix from the first triplet.
    for i in 0..3 {
        for j in 0..4 {
            let rebuilt = svd.singular[0] * svd.temporal[[0, i]] * svd.spatial[[0, j]];
            assert_abs_diff_eq!(rebuilt, a[(i, j)], epsilon = 1e-9);
        }
    }
}

#[test]
fn test_component_mask_percentile() {
    let component = Array2::from_shape_fn((10, 10), |(r, c)| (r * 10 + c) as f64);
    let mask = component_mask(&component, 80.0);
    assert_eq!(mask.dim(), (10, 10));
    // 80th percentile of 0..=99 is 79.2; strictly greater keeps 80..=99.
    assert_eq!(mask.iter().filter(|&&m| m).count(), 20);
    assert!(mask[[9, 9]]);
    assert!(!mask[[7, 9]]);
}

#[test]
fn test_masked_trace_mean_and_empty_mask() {
    let plane = Array3::from_shape_fn((3, 2, 2), |(t, r, c)| (t * 10 + r * 2 + c) as f32);
    let mask = array![[true, false], [false, true]];
    let trace = masked_trace(&plane, &mask);
    assert_eq!(trace.len(), 3);
    assert_abs_diff_eq!(trace[0], 1.5, epsilon = 1e-9);
    assert_abs_diff_eq!(trace[2], 21.5, epsilon = 1e-9);

    let empty = Array2::from_elem((2, 2), false);
    assert!(masked_trace(&plane, &empty).iter().all(|v| v.is_nan()));
}

#[test]
fn test_segmentation_one_cell_per_plane() {
    let (stack, amplitudes) = modulated_stack(40);
    let seg = segment_planes(&stack, 4, 80.0).unwrap();

    assert_eq!(seg.masks.len(), 2);
    assert_eq!(seg.traces.dim(), (2, 40));
    assert_eq!(seg.spatial[0].dim(), (4, 24, 24));
    assert_eq!(seg.temporal[1].dim(), (4, 40));
    for mask in &seg.masks {
        assert_eq!(mask.dim(), (24, 24));
    }
    // Each mask sits on its own plane's blob.
    assert!(seg.masks[0][[8, 8]]);
    assert!(!seg.masks[0][[20, 20]]);
    assert!(seg.masks[1][[15, 16]]);

    // The trace follows the modulation.
    for p in 0..2 {
        let expected: Vec<f64> = amplitudes[p].iter().map(|&a| a as f64).collect();
        let trace: Vec<f64> = seg.traces.row(p).to_vec();
        assert!(vistune_core::stats::pearson(&trace, &expected) > 0.99);
    }
}

#[test]
fn test_segmentation_rejects_zero_components() {
    let (stack, _) = modulated_stack(5);
    assert!(segment_planes(&stack, 0, 80.0).is_err());
}

#[test]
fn test_baseline_of_constant_trace() {
    let trace = Array1::from_elem(100, 3.0);
    let baseline = running_baseline(trace.view(), 32, 8, 10.0);
    assert!(baseline.iter().all(|&b| (b - 3.0).abs() < 1e-12));

    let dff = delta_f_over_f(trace.view(), baseline.view());
    assert!(dff.iter().all(|&d| d.abs() < 1e-12));
}

#[test]
fn test_baseline_tracks_slow_drift() {
    let trace = Array1::from_shape_fn(200, |t| 1.0 + t as f64 * 0.01);
    let baseline = running_baseline(trace.view(), 16, 4, 50.0);
    assert_eq!(baseline.len(), 200);
    for t in 20..180 {
        assert_abs_diff_eq!(baseline[t], trace[t], epsilon = 0.02);
    }
}

#[test]
fn test_zero_baseline_gives_nan() {
    let trace = array![1.0, 2.0, 3.0];
    let baseline = array![1.0, 0.0, 2.0];
    let dff = delta_f_over_f(trace.view(), baseline.view());
    assert_abs_diff_eq!(dff[0], 0.0);
    assert!(dff[1].is_nan());
    assert_abs_diff_eq!(dff[2], 0.5);
}

#[test]
fn test_noise_series() {
    let dff = array![0.0, 1.0, 1.0, -1.0];
    let noise = noise_series(dff.view());
    assert!(noise[0].is_nan());
    assert_abs_diff_eq!(noise[1], 1.0 / 2f64.sqrt(), epsilon = 1e-12);
    assert_abs_diff_eq!(noise[2], 0.0);
    assert_abs_diff_eq!(noise[3], 2.0 / 2f64.sqrt(), epsilon = 1e-12);
}

#[test]
fn test_time_courses_and_cache_round_trip() {
    let (stack, _) = modulated_stack(48);
    let seg = segment_planes(&stack, 4, 80.0).unwrap();
    let config = TimeCourseConfig::default();
    let courses = TimeCourses::from_segmentation(&seg, &config);

    assert_eq!(courses.cells(), 2);
    for field in [
        &courses.tc,
        &courses.motion,
        &courses.pixels,
        &courses.baseline,
        &courses.dff,
        &courses.noise,
    ] {
        assert_eq!(field.dim(), (2, 48));
    }
    let pixel_count = seg.masks[0].iter().filter(|&&m| m).count() as f64;
    assert!(courses.pixels.row(0).iter().all(|&v| v == pixel_count));
    let mean = courses.tc.row(1).mean().unwrap();
    assert!(courses.motion.row(1).iter().all(|&v| (v - mean).abs() < 1e-12));

    let noise = courses.cell_noise();
    assert_eq!(noise.len(), 2);
    assert!(noise.iter().all(|v| v.is_finite()));

    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("tc.toml");
    courses.save(&path).unwrap();
    let loaded = TimeCourses::load(&path).unwrap();
    assert_eq!(loaded.masks, courses.masks);
    assert_eq!(loaded.tc, courses.tc);
    // The first noise sample is NaN and must survive the cache.
    assert!(loaded.noise[[0, 0]].is_nan());
    assert_abs_diff_eq!(loaded.noise[[1, 5]], courses.noise[[1, 5]], epsilon = 1e-15);
}
