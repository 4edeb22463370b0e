use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::{s, Array3, ArrayView3};
use rayon::prelude::*;

use crate::error::{Result, VistuneError};
use crate::volume::{FrameShift, ImagingStack, Shifts};

use super::enhanced_phase::compute_shift_upsampled;
use super::phase_correlation::shift_plane;

/// Motion-corrected stack and the shifts that produced it.
#[derive(Clone, Debug)]
pub struct RegisteredStack {
    /// Shape = (frames, planes, 2) as (dy, dx).
    pub shifts: Shifts,
    pub stack: ImagingStack,
}

/// Register every frame of every plane to the matching plane of `target`
/// (shape = (height, width, planes)). Frames are processed in parallel on
/// the current rayon pool.
pub fn register_by_plane(
    data: &ImagingStack,
    target: ArrayView3<f32>,
    upsample: usize,
) -> Result<RegisteredStack> {
    register_by_plane_with_progress(data, target, upsample, |_| {})
}

/// [`register_by_plane`], calling `on_frame_done` with the number of frames
/// registered so far.
pub fn register_by_plane_with_progress<F>(
    data: &ImagingStack,
    target: ArrayView3<f32>,
    upsample: usize,
    on_frame_done: F,
) -> Result<RegisteredStack>
where
    F: Fn(usize) + Send + Sync,
{
    let (h, w, planes) = target.dim();
    if (data.height(), data.width(), data.planes()) != (h, w, planes) {
        return Err(VistuneError::ShapeMismatch(format!(
            "target {:?} vs frames {:?}",
            (h, w, planes),
            (data.height(), data.width(), data.planes())
        )));
    }

    let counter = AtomicUsize::new(0);
    let results: Vec<(Array3<f32>, Vec<FrameShift>)> = (0..data.frames())
        .into_par_iter()
        .map(|i| {
            let result = register_frame(data.frame(i), target, upsample);
            on_frame_done(counter.fetch_add(1, Ordering::Relaxed) + 1);
            result
        })
        .collect::<Result<_>>()?;

    let mut shifts = Shifts::zeros((data.frames(), planes, 2));
    let mut frames = Vec::with_capacity(results.len());
    for (i, (frame, frame_shifts)) in results.into_iter().enumerate() {
        for (p, shift) in frame_shifts.iter().enumerate() {
            shifts[[i, p, 0]] = shift.dy;
            shifts[[i, p, 1]] = shift.dx;
        }
        frames.push(frame);
    }

    Ok(RegisteredStack {
        shifts,
        stack: ImagingStack::from_frames(&frames)?,
    })
}

fn register_frame(
    frame: ArrayView3<f32>,
    target: ArrayView3<f32>,
    upsample: usize,
) -> Result<(Array3<f32>, Vec<FrameShift>)> {
    let planes = frame.dim().2;
    let mut out = Array3::<f32>::zeros(frame.dim());
    let mut shifts = Vec::with_capacity(planes);
    for p in 0..planes {
        let reference = target.slice(s![.., .., p]);
        let moving = frame.slice(s![.., .., p]);
        let shift = compute_shift_upsampled(reference, moving, upsample)?;
        out.slice_mut(s![.., .., p])
            .assign(&shift_plane(moving, &shift));
        shifts.push(shift);
    }
    Ok((out, shifts))
}
