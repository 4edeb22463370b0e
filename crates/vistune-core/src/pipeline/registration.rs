use std::path::Path;

use tracing::info;

use crate::align::{find_target_indices, register_by_plane_with_progress};
use crate::compute::ComputeContext;
use crate::consts::{CLEAN_STACK_FILE, REGISTERED_STACK_FILE};
use crate::error::Result;
use crate::io::stack_file::save_stack;
use crate::io::tiff_io::{load_run, write_volume_tiffs};
use crate::records::Registration;

use super::config::RegistrationConfig;
use super::types::{PipelineStage, ProgressReporter};

/// Motion-correct the raw run in `session_dir` and write its artifacts next
/// to it: the clean and registered binary stacks plus the clean, target and
/// registered mean images.
pub(super) fn register_session(
    ctx: &ComputeContext,
    session_dir: &Path,
    registration_id: u32,
    planes: usize,
    config: &RegistrationConfig,
    reporter: &dyn ProgressReporter,
) -> Result<Registration> {
    reporter.begin_stage(PipelineStage::Reading, None);
    let mut clean = load_run(session_dir, planes)?;
    reporter.finish_stage();
    info!(
        frames = clean.frames(),
        height = clean.height(),
        width = clean.width(),
        planes = clean.planes(),
        "Loaded raw run"
    );

    reporter.begin_stage(PipelineStage::Cleaning, Some(clean.frames()));
    clean.zero_leading_rows(config.flyline_rows);
    let clean_binary_path = session_dir.join(CLEAN_STACK_FILE);
    save_stack(&clean, &clean_binary_path)?;
    write_volume_tiffs(&clean.mean()?, session_dir, "clean_mean")?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::TargetSelection, Some(clean.frames()));
    let target_indices = ctx.install(|| find_target_indices(&clean, config.cut_cc))?;
    let target_frames = clean.select(&target_indices)?;
    let coarse_target = target_frames.mean()?;
    reporter.finish_stage();
    info!(
        target_frames = target_indices.len(),
        "Selected registration target"
    );

    reporter.begin_stage(PipelineStage::Registration, Some(target_frames.frames() + clean.frames()));
    let registered_target = ctx.install(|| {
        register_by_plane_with_progress(&target_frames, coarse_target.view(), config.upsample, |done| {
            reporter.advance(done)
        })
    })?;
    let target = registered_target.stack.mean()?;
    write_volume_tiffs(&target, session_dir, "reg_target")?;

    let first_pass = target_frames.frames();
    let registered = ctx.install(|| {
        register_by_plane_with_progress(&clean, target.view(), config.upsample, |done| {
            reporter.advance(first_pass + done)
        })
    })?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::Writing, None);
    write_volume_tiffs(&registered.stack.mean()?, session_dir, "reg_mean")?;
    let reg_binary_path = session_dir.join(REGISTERED_STACK_FILE);
    save_stack(&registered.stack, &reg_binary_path)?;
    reporter.finish_stage();

    info!(
        registration_id,
        path = %reg_binary_path.display(),
        "Registration complete"
    );
    Ok(Registration {
        registration_id,
        clean_binary_path,
        reg_binary_path,
        shifts: registered.shifts,
    })
}
