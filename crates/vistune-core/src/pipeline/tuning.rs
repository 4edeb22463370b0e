use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};

use ndarray::{s, Array1};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::compute::ComputeContext;
use crate::consts::{BEHAVIOR_FILE, TIMECOURSE_CACHE_FILE};
use crate::error::{Result, VistuneError};
use crate::io::stack_file::load_stack;
use crate::records::{CellTuning, Registration};
use crate::segment::segment_planes;
use crate::timecourse::TimeCourses;
use crate::tuning::{
    align_trials, estimate_direction, one_way_anova, population_correlation, trial_means,
    TrialTable,
};
use crate::volume::ImagingStack;

use super::config::PipelineConfig;
use super::types::{PipelineStage, ProgressReporter};

/// Segment a registered stack into cells and compute each cell's tuning row.
pub(super) fn tune_registration(
    ctx: &ComputeContext,
    registration: &Registration,
    session_dir: &Path,
    config: &PipelineConfig,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<CellTuning>> {
    reporter.begin_stage(PipelineStage::Reading, None);
    let stack = load_stack(&registration.reg_binary_path)?;
    let mean = stack.mean()?;
    reporter.finish_stage();

    let courses = time_courses(ctx, &stack, session_dir, config, reporter)?;
    let (h, w, planes) = mean.dim();
    if courses.cells() != planes || courses.tc.ncols() != stack.frames() {
        return Err(VistuneError::ShapeMismatch(format!(
            "time courses {:?} vs {} planes of {} frames",
            courses.tc.dim(),
            planes,
            stack.frames()
        )));
    }
    if let Some(bad) = courses.masks.iter().find(|m| m.dim() != (h, w)) {
        return Err(VistuneError::ShapeMismatch(format!(
            "mask {:?} vs mean frame {:?}",
            bad.dim(),
            (h, w)
        )));
    }

    reporter.begin_stage(PipelineStage::Tuning, Some(courses.cells()));
    let table = TrialTable::load(&session_dir.join(BEHAVIOR_FILE))?;
    let responses = align_trials(courses.dff.view(), &table)?;
    let pop_corr = if courses.cells() < 2 {
        warn!(
            registration_id = registration.registration_id,
            cells = courses.cells(),
            "Too few cells for population correlation"
        );
        Array1::from_elem(courses.cells(), f64::NAN)
    } else {
        population_correlation(courses.dff.view())?
    };
    let noise = courses.cell_noise();

    let tuned = AtomicUsize::new(0);
    let rows: Vec<CellTuning> = ctx.install(|| {
        (0..courses.cells())
            .into_par_iter()
            .map(|c| {
                let trial_df = responses.cell(c);
                let groups = trial_means(trial_df);
                let anova = one_way_anova(&groups);
                let sig = anova.is_significant(config.tuning.sig_th);
                let estimate = estimate_direction(
                    &responses.directions,
                    &groups,
                    sig,
                    &config.tuning.direction_params(c),
                );
                debug!(
                    cell = c,
                    p_value = anova.p_value,
                    sig,
                    direction = ?estimate.direction,
                    "Tuned cell"
                );
                reporter.advance(tuned.fetch_add(1, Ordering::Relaxed) + 1);
                CellTuning {
                    registration_id: registration.registration_id,
                    cell_id: c as u16,
                    df: courses.dff.row(c).to_owned(),
                    trial_df: trial_df.to_owned(),
                    pop_corr: pop_corr[c],
                    direction: estimate.direction,
                    interval: estimate.interval,
                    sig,
                    p_value: anova.p_value,
                    mask: courses.masks[c].clone(),
                    mean: mean.slice(s![.., .., c]).to_owned(),
                    noise: noise[c],
                }
            })
            .collect()
    });
    reporter.finish_stage();

    info!(
        registration_id = registration.registration_id,
        cells = rows.len(),
        significant = rows.iter().filter(|r| r.sig).count(),
        "Tuning complete"
    );
    Ok(rows)
}

/// Cached time courses of the session, or a fresh segmentation of `stack`.
fn time_courses(
    ctx: &ComputeContext,
    stack: &ImagingStack,
    session_dir: &Path,
    config: &PipelineConfig,
    reporter: &dyn ProgressReporter,
) -> Result<TimeCourses> {
    let cache = session_dir.join(TIMECOURSE_CACHE_FILE);
    if config.timecourse.use_cache && cache.is_file() {
        return TimeCourses::load(&cache);
    }

    reporter.begin_stage(PipelineStage::Segmentation, Some(stack.planes()));
    let segmentation = ctx.install(|| {
        segment_planes(
            stack,
            config.segmentation.n_comp,
            config.segmentation.px_threshold,
        )
    })?;
    reporter.finish_stage();

    reporter.begin_stage(PipelineStage::TimeCourses, Some(segmentation.masks.len()));
    let courses = TimeCourses::from_segmentation(&segmentation, &config.timecourse);
    courses.save(&cache)?;
    reporter.finish_stage();
    Ok(courses)
}
