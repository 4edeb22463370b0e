use std::sync::Arc;

use tracing::info;

use crate::compute::with_context;
use crate::error::Result;
use crate::paths::registration_location;
use crate::records::{Registration, RegistrationInput, RegistrationKey};
use crate::store::RecordStore;

use super::config::PipelineConfig;
use super::registration::register_session;
use super::stability::{compare_sessions, is_tuned, pending_stability};
use super::tuning::tune_registration;
use super::types::{NoOpReporter, PopulateSummary, ProgressReporter};

/// Registration inputs without a registration row.
pub fn pending_registrations(store: &RecordStore) -> Result<Vec<u32>> {
    let mut pending = Vec::new();
    for input in store.fetch_all::<RegistrationInput>()? {
        let key = RegistrationKey {
            registration_id: input.registration_id,
        };
        if !store.contains::<Registration>(&key)? {
            pending.push(input.registration_id);
        }
    }
    Ok(pending)
}

/// Registrations without tuning rows.
pub fn pending_tunings(store: &RecordStore) -> Result<Vec<u32>> {
    let mut pending = Vec::new();
    for registration in store.fetch_all::<Registration>()? {
        if !is_tuned(store, registration.registration_id)? {
            pending.push(registration.registration_id);
        }
    }
    Ok(pending)
}

/// Register every pending registration input, reporting progress.
pub fn populate_registration_reported(
    store: &mut RecordStore,
    config: &PipelineConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<PopulateSummary> {
    let pending = pending_registrations(store)?;
    reporter.begin_keys("registration", pending.len());
    let platform = config.compute.platform();

    let mut summary = PopulateSummary::default();
    for registration_id in pending {
        reporter.begin_key(&format!("registration {}", registration_id));
        let registration = with_context(config.compute.master()?, |ctx| {
            let (location, run) = registration_location(store, registration_id, platform)?;
            register_session(
                ctx,
                &location.session_dir(),
                registration_id,
                run.planes,
                &config.registration,
                reporter.as_ref(),
            )
        })?;
        store.insert(&registration)?;
        reporter.finish_key();
        summary.keys += 1;
        summary.rows += 1;
    }
    info!(registered = summary.keys, "Populated registration");
    Ok(summary)
}

/// Compute tuning rows for every registration that has none, reporting progress.
pub fn populate_tuning_reported(
    store: &mut RecordStore,
    config: &PipelineConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<PopulateSummary> {
    let pending = pending_tunings(store)?;
    reporter.begin_keys("cell_tuning", pending.len());
    let platform = config.compute.platform();

    let mut summary = PopulateSummary::default();
    for registration_id in pending {
        reporter.begin_key(&format!("registration {}", registration_id));
        let rows = with_context(config.compute.master()?, |ctx| {
            let registration: Registration = store.fetch_one(&RegistrationKey { registration_id })?;
            let (location, _) = registration_location(store, registration_id, platform)?;
            tune_registration(
                ctx,
                &registration,
                &location.session_dir(),
                config,
                reporter.as_ref(),
            )
        })?;
        store.insert_many(&rows)?;
        reporter.finish_key();
        summary.keys += 1;
        summary.rows += rows.len();
    }
    info!(registrations = summary.keys, cells = summary.rows, "Populated cell tuning");
    Ok(summary)
}

/// Compare every session pair of a subject/field of view that has no
/// stability rows yet, reporting progress.
pub fn populate_stability_reported(
    store: &mut RecordStore,
    config: &PipelineConfig,
    reporter: Arc<dyn ProgressReporter>,
) -> Result<PopulateSummary> {
    let pending = pending_stability(store)?;
    reporter.begin_keys("cell_stability", pending.len());

    let mut summary = PopulateSummary::default();
    for job in pending {
        reporter.begin_key(&format!(
            "subject {} fov {} ({} pairs)",
            job.key.subject_id,
            job.key.fov_id,
            job.pairs.len()
        ));
        let rows = with_context(config.compute.master()?, |_| {
            compare_sessions(store, &job, reporter.as_ref())
        })?;
        store.insert_many(&rows)?;
        reporter.finish_key();
        summary.keys += 1;
        summary.rows += rows.len();
    }
    info!(keys = summary.keys, rows = summary.rows, "Populated cell stability");
    Ok(summary)
}

pub fn populate_registration(store: &mut RecordStore, config: &PipelineConfig) -> Result<PopulateSummary> {
    populate_registration_reported(store, config, Arc::new(NoOpReporter))
}

pub fn populate_tuning(store: &mut RecordStore, config: &PipelineConfig) -> Result<PopulateSummary> {
    populate_tuning_reported(store, config, Arc::new(NoOpReporter))
}

pub fn populate_stability(store: &mut RecordStore, config: &PipelineConfig) -> Result<PopulateSummary> {
    populate_stability_reported(store, config, Arc::new(NoOpReporter))
}
