mod common;

use ndarray::{s, Array2, Array3};

use vistune_core::align::target::frame_mean_correlations;
use vistune_core::align::{
    bilinear_sample, compute_shift_upsampled, find_target_indices, register_by_plane,
    shift_plane,
};
use vistune_core::volume::{FrameShift, ImagingStack};

use common::gaussian_blob;

fn argmax(data: &Array2<f32>) -> (usize, usize) {
    let mut best = ((0, 0), f32::NEG_INFINITY);
    for (idx, &v) in data.indexed_iter() {
        if v > best.1 {
            best = (idx, v);
        }
    }
    best.0
}

#[test]
fn test_zero_shift_for_identical_planes() {
    let plane = gaussian_blob(64, 64, 30.0, 34.0, 4.0);
    let shift = compute_shift_upsampled(plane.view(), plane.view(), 5).unwrap();
    assert!(shift.dy.abs() < 0.5, "dy={} should be ~0", shift.dy);
    assert!(shift.dx.abs() < 0.5, "dx={} should be ~0", shift.dx);
}

#[test]
fn test_integer_shift_maps_target_back() {
    let reference = gaussian_blob(64, 64, 32.0, 32.0, 4.0);
    let target = gaussian_blob(64, 64, 35.0, 37.0, 4.0);

    let shift = compute_shift_upsampled(reference.view(), target.view(), 5).unwrap();
    assert!((shift.dy + 3.0).abs() < 0.5, "dy={} should be ~-3", shift.dy);
    assert!((shift.dx + 5.0).abs() < 0.5, "dx={} should be ~-5", shift.dx);

    let corrected = shift_plane(target.view(), &shift);
    assert_eq!(argmax(&corrected), (32, 32));
}

#[test]
fn test_upsampled_recovers_subpixel_shift() {
    let reference = gaussian_blob(64, 64, 32.0, 32.0, 4.0);
    let target = gaussian_blob(64, 64, 34.4, 30.4, 4.0);

    let shift = compute_shift_upsampled(reference.view(), target.view(), 5).unwrap();
    assert!((shift.dy + 2.4).abs() < 0.3, "dy={} should be ~-2.4", shift.dy);
    assert!((shift.dx - 1.6).abs() < 0.3, "dx={} should be ~1.6", shift.dx);
}

#[test]
fn test_upsample_of_one_is_integer() {
    let reference = gaussian_blob(32, 32, 16.0, 16.0, 3.0);
    let target = gaussian_blob(32, 32, 18.0, 15.0, 3.0);
    let shift = compute_shift_upsampled(reference.view(), target.view(), 1).unwrap();
    assert_eq!(shift, FrameShift { dy: -2.0, dx: 1.0 });
}

#[test]
fn test_shape_mismatch_is_error() {
    let a = Array2::<f32>::zeros((16, 16));
    let b = Array2::<f32>::zeros((16, 20));
    assert!(compute_shift_upsampled(a.view(), b.view(), 1).is_err());
    assert!(compute_shift_upsampled(a.view(), b.view(), 5).is_err());
}

#[test]
fn test_bilinear_interpolation() {
    let mut data = Array2::<f32>::zeros((4, 4));
    data[[1, 1]] = 1.0;
    assert!((bilinear_sample(data.view(), 1.0, 1.0) - 1.0).abs() < 1e-6);
    assert!((bilinear_sample(data.view(), 1.5, 1.0) - 0.5).abs() < 1e-6);
    assert!((bilinear_sample(data.view(), 1.5, 1.5) - 0.25).abs() < 1e-6);
    assert_eq!(bilinear_sample(data.view(), -3.0, 0.0), 0.0);
}

#[test]
fn test_register_by_plane_recovers_per_frame_shifts() {
    let offsets = [(0.0, 0.0), (2.0, -1.0), (-3.0, 2.0), (1.0, 3.0)];
    let frames: Vec<Array3<f32>> = offsets
        .iter()
        .map(|&(dy, dx)| {
            let p0 = gaussian_blob(48, 48, 20.0 + dy, 24.0 + dx, 3.5);
            let p1 = gaussian_blob(48, 48, 28.0 + dy, 18.0 + dx, 3.5);
            Array3::from_shape_fn((48, 48, 2), |(r, c, p)| if p == 0 { p0[[r, c]] } else { p1[[r, c]] })
        })
        .collect();
    let stack = ImagingStack::from_frames(&frames).unwrap();
    let target = frames[0].clone();

    let registered = register_by_plane(&stack, target.view(), 5).unwrap();
    assert_eq!(registered.shifts.dim(), (4, 2, 2));
    for (i, &(dy, dx)) in offsets.iter().enumerate() {
        for p in 0..2 {
            assert!(
                (registered.shifts[[i, p, 0]] + dy).abs() < 0.3,
                "frame {} plane {} dy={}",
                i,
                p,
                registered.shifts[[i, p, 0]]
            );
            assert!((registered.shifts[[i, p, 1]] + dx).abs() < 0.3);
        }
    }

    let mean = registered.stack.mean().unwrap().slice(s![.., .., 0]).to_owned();
    assert_eq!(argmax(&mean), (20, 24));
}

#[test]
fn test_register_rejects_mismatched_target() {
    let stack = common::constant_stack(3, &[Array2::<f32>::zeros((16, 16))]);
    let target = Array3::<f32>::zeros((16, 16, 2));
    assert!(register_by_plane(&stack, target.view(), 5).is_err());
}

#[test]
fn test_target_selection_skips_outliers() {
    let clean = gaussian_blob(32, 32, 16.0, 16.0, 3.0);
    let outlier = gaussian_blob(32, 32, 4.0, 27.0, 2.0);
    let mut frames = vec![Array3::from_shape_fn((32, 32, 1), |(r, c, _)| clean[[r, c]]); 10];
    frames[3] = Array3::from_shape_fn((32, 32, 1), |(r, c, _)| outlier[[r, c]]);
    frames[7] = Array3::from_shape_fn((32, 32, 1), |(r, c, _)| outlier[[r, c]]);
    let stack = ImagingStack::from_frames(&frames).unwrap();

    let correlations = frame_mean_correlations(&stack).unwrap();
    assert!(correlations[3] < correlations[0]);

    let selected = find_target_indices(&stack, 90.0).unwrap();
    assert_eq!(selected, vec![0, 1, 2, 4, 5, 6, 8, 9]);
}
