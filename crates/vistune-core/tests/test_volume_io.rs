mod common;

use approx::assert_abs_diff_eq;
use ndarray::{Array3, Array4};

use vistune_core::error::VistuneError;
use vistune_core::io::stack_file::{load_stack, save_stack, StackHeader, StackReader, StackWriter};
use vistune_core::io::tiff_io::{list_raw_frames, load_plane, load_run, write_volume_tiffs};
use vistune_core::volume::ImagingStack;

fn ramp_stack(frames: usize, h: usize, w: usize, planes: usize) -> ImagingStack {
    ImagingStack::new(Array4::from_shape_fn((frames, h, w, planes), |(t, r, c, p)| {
        ((t * 7 + r * 3 + c + p * 11) % 50) as f32 / 50.0
    }))
}

#[test]
fn test_flyline_zeroes_leading_rows_only() {
    let mut stack = ramp_stack(3, 6, 5, 2);
    let before = stack.clone();
    stack.zero_leading_rows(2);

    for t in 0..3 {
        for p in 0..2 {
            for c in 0..5 {
                assert_eq!(stack.data[[t, 0, c, p]], 0.0);
                assert_eq!(stack.data[[t, 1, c, p]], 0.0);
                for r in 2..6 {
                    assert_eq!(stack.data[[t, r, c, p]], before.data[[t, r, c, p]]);
                }
            }
        }
    }
}

#[test]
fn test_flyline_larger_than_frame() {
    let mut stack = ramp_stack(2, 3, 3, 1);
    stack.zero_leading_rows(10);
    assert!(stack.data.iter().all(|&v| v == 0.0));
}

#[test]
fn test_mean_and_select() {
    let frames: Vec<Array3<f32>> = (0..4)
        .map(|t| Array3::from_elem((2, 3, 2), t as f32))
        .collect();
    let stack = ImagingStack::from_frames(&frames).unwrap();
    assert_eq!(stack.data.dim(), (4, 2, 3, 2));

    let mean = stack.mean().unwrap();
    assert_eq!(mean.dim(), (2, 3, 2));
    assert!(mean.iter().all(|&v| (v - 1.5).abs() < 1e-6));

    let picked = stack.select(&[3, 1]).unwrap();
    assert_eq!(picked.frames(), 2);
    assert_eq!(picked.data[[0, 0, 0, 0]], 3.0);
    assert_eq!(picked.data[[1, 0, 0, 0]], 1.0);

    assert!(stack.select(&[4]).is_err());
    assert!(stack.select(&[]).is_err());
}

#[test]
fn test_from_frames_rejects_mixed_shapes() {
    let frames = vec![Array3::<f32>::zeros((2, 2, 1)), Array3::<f32>::zeros((2, 3, 1))];
    assert!(matches!(
        ImagingStack::from_frames(&frames),
        Err(VistuneError::ShapeMismatch(_))
    ));
    assert!(matches!(
        ImagingStack::from_frames(&[]),
        Err(VistuneError::EmptySequence)
    ));
}

#[test]
fn test_map_frames_keeps_order() {
    let stack = ramp_stack(5, 4, 4, 1);
    let mapped = stack.map_frames(|i, frame| frame.mapv(|_| i as f32)).unwrap();
    for t in 0..5 {
        assert_eq!(mapped.data[[t, 2, 2, 0]], t as f32);
    }
}

#[test]
fn test_stack_file_round_trip() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("run.stack");
    let stack = ramp_stack(4, 5, 6, 3);

    save_stack(&stack, &path).unwrap();
    let reader = StackReader::open(&path).unwrap();
    assert_eq!(
        reader.header,
        StackHeader {
            frames: 4,
            height: 5,
            width: 6,
            planes: 3
        }
    );
    assert_eq!(reader.read_frame(2).unwrap(), stack.frame(2).to_owned());
    assert!(reader.read_frame(4).is_err());

    let loaded = load_stack(&path).unwrap();
    assert_eq!(loaded.data, stack.data);
}

#[test]
fn test_stack_file_rejects_bad_magic_and_truncation() {
    let tmp = tempfile::tempdir().unwrap();
    let bad = tmp.path().join("bad.stack");
    std::fs::write(&bad, vec![0u8; 64]).unwrap();
    assert!(matches!(
        StackReader::open(&bad),
        Err(VistuneError::InvalidStack(_))
    ));

    let path = tmp.path().join("short.stack");
    save_stack(&ramp_stack(2, 4, 4, 1), &path).unwrap();
    let bytes = std::fs::read(&path).unwrap();
    std::fs::write(&path, &bytes[..bytes.len() - 8]).unwrap();
    assert!(matches!(
        StackReader::open(&path),
        Err(VistuneError::InvalidStack(_))
    ));
}

#[test]
fn test_stack_writer_checks_frame_count() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("partial.stack");
    let header = StackHeader {
        frames: 2,
        height: 2,
        width: 2,
        planes: 1,
    };
    let mut writer = StackWriter::create(&path, header).unwrap();
    writer.write_frame(Array3::<f32>::zeros((2, 2, 1)).view()).unwrap();
    assert!(writer.write_frame(Array3::<f32>::zeros((3, 2, 1)).view()).is_err());
    assert!(writer.finalize().is_err());
}

#[test]
fn test_raw_run_is_interleaved_by_plane() {
    let tmp = tempfile::tempdir().unwrap();
    let run_dir = tmp.path().join("Run1");
    let stack = ramp_stack(3, 8, 10, 2);
    common::write_raw_run(&stack, &run_dir);
    std::fs::write(run_dir.join("notes.txt"), "not an image").unwrap();

    assert_eq!(list_raw_frames(&run_dir).unwrap().len(), 6);

    let loaded = load_run(&run_dir, 2).unwrap();
    assert_eq!(loaded.data.dim(), (3, 8, 10, 2));
    for (a, b) in loaded.data.iter().zip(stack.data.iter()) {
        assert_abs_diff_eq!(*a, *b, epsilon = 1e-4);
    }
}

#[test]
fn test_raw_run_drops_incomplete_volume() {
    let tmp = tempfile::tempdir().unwrap();
    let run_dir = tmp.path().join("Run1");
    common::write_raw_run(&ramp_stack(5, 4, 4, 1), &run_dir);

    let loaded = load_run(&run_dir, 2).unwrap();
    assert_eq!(loaded.frames(), 2);
    assert_eq!(loaded.planes(), 2);
}

#[test]
fn test_raw_run_without_frames() {
    let tmp = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_run(tmp.path(), 1),
        Err(VistuneError::NoFrames(_))
    ));
}

#[test]
fn test_mean_tiffs_per_plane() {
    let tmp = tempfile::tempdir().unwrap();
    let volume = Array3::from_shape_fn((6, 7, 2), |(r, c, p)| (r + c + p) as f32 / 20.0);
    let written = write_volume_tiffs(&volume, tmp.path(), "reg_mean").unwrap();
    assert_eq!(written.len(), 2);
    assert!(written[1].ends_with("reg_mean_plane1.tif"));

    let plane = load_plane(&written[1]).unwrap();
    assert_eq!(plane.dim(), (6, 7));
    assert_abs_diff_eq!(plane[[3, 4]], 8.0 / 20.0, epsilon = 1e-4);
}
