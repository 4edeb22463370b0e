#![allow(dead_code)]

use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use ndarray::{Array2, Array3};

use vistune_core::io::tiff_io::save_plane_tiff;
use vistune_core::records::{Run, ScanPath, Session, Subject};
use vistune_core::store::RecordStore;
use vistune_core::tuning::{Trial, TrialTable};
use vistune_core::volume::ImagingStack;

/// Gaussian spot of peak 1.0 centred at (cy, cx).
pub fn gaussian_blob(h: usize, w: usize, cy: f64, cx: f64, sigma: f64) -> Array2<f32> {
    Array2::from_shape_fn((h, w), |(r, c)| {
        let dy = r as f64 - cy;
        let dx = c as f64 - cx;
        (-(dy * dy + dx * dx) / (2.0 * sigma * sigma)).exp() as f32
    })
}

/// Stack of `frames` identical volumes built from one image per plane.
pub fn constant_stack(frames: usize, planes: &[Array2<f32>]) -> ImagingStack {
    let (h, w) = planes[0].dim();
    let volume = Array3::from_shape_fn((h, w, planes.len()), |(r, c, p)| planes[p][[r, c]]);
    ImagingStack::from_frames(&vec![volume; frames]).unwrap()
}

/// Write a stack as a raw run directory: one TIFF per frame and plane,
/// interleaved by plane.
pub fn write_raw_run(stack: &ImagingStack, dir: &Path) {
    std::fs::create_dir_all(dir).unwrap();
    let planes = stack.planes();
    for t in 0..stack.frames() {
        let frame = stack.frame(t);
        for p in 0..planes {
            let image = frame.slice(ndarray::s![.., .., p]).to_owned();
            let path = dir.join(format!("frame_{:06}.tif", t * planes + p));
            save_plane_tiff(&image, &path).unwrap();
        }
    }
}

/// Four directions, `repeats` trials each, `trial_len` frames per trial,
/// presented back to back in direction-major order within each repeat.
pub fn trial_table(repeats: usize, trial_len: usize) -> TrialTable {
    let directions = [0.0, 90.0, 180.0, 270.0];
    let mut trials = Vec::new();
    let mut start = 0;
    for _ in 0..repeats {
        for &direction in &directions {
            trials.push(Trial {
                direction,
                start,
                stop: start + trial_len,
            });
            start += trial_len;
        }
    }
    TrialTable::new(trials)
}

/// Insert a subject, session, run and scan path whose every platform path is `base`.
pub fn seed_session(
    store: &mut RecordStore,
    base: &Path,
    subject_id: u32,
    session: u16,
    date: NaiveDate,
    fov_id: u16,
    planes: usize,
) {
    let base = base.display().to_string();
    store
        .insert_missing(&[Subject {
            subject_id,
            notes: String::new(),
        }])
        .unwrap();
    store
        .insert(&Session {
            subject_id,
            session,
            session_date: date,
        })
        .unwrap();
    store
        .insert(&Run {
            subject_id,
            session,
            run_id: 1,
            fov_id,
            planes,
            frame_rate: 15.0,
        })
        .unwrap();
    store
        .insert(&ScanPath {
            subject_id,
            session,
            path_windows: base.clone(),
            path_linux: base.clone(),
            path_mac: base,
        })
        .unwrap();
}

/// `base/ANM{subject}/{yymmdd}/Run1`
pub fn session_dir(base: &Path, subject_id: u32, date: NaiveDate) -> PathBuf {
    base.join(format!("ANM{}", subject_id))
        .join(date.format("%y%m%d").to_string())
        .join("Run1")
}
