use std::collections::{BTreeMap, BTreeSet};

use tracing::{debug, info};

use crate::error::{Result, VistuneError};
use crate::records::{
    CellKey, CellStability, CellTuning, Registration, Run, StabilityKey,
};
use crate::store::RecordStore;
use crate::tuning::angular_distance;

use super::types::{PipelineStage, ProgressReporter};

/// Run of the first `RegistrationRun` of a registration job.
pub(super) fn first_run(store: &RecordStore, registration_id: u32) -> Result<Run> {
    let first = store
        .registration_runs(registration_id)?
        .into_iter()
        .next()
        .ok_or_else(|| VistuneError::MissingRecord {
            table: "registration_run",
            key: registration_id.to_string(),
        })?;
    store.fetch_one(&first.run_key())
}

/// Registrations that already have tuning rows.
pub(super) fn is_tuned(store: &RecordStore, registration_id: u32) -> Result<bool> {
    store.contains::<CellTuning>(&CellKey {
        registration_id,
        cell_id: 0,
    })
}

/// Distinct subject/field-of-view pairs of all tuned registrations.
pub fn stability_key_source(store: &RecordStore) -> Result<Vec<StabilityKey>> {
    let mut keys = BTreeSet::new();
    for registration in store.fetch_all::<Registration>()? {
        if !is_tuned(store, registration.registration_id)? {
            continue;
        }
        let run = first_run(store, registration.registration_id)?;
        keys.insert(StabilityKey {
            subject_id: run.subject_id,
            fov_id: run.fov_id,
        });
    }
    Ok(keys.into_iter().collect())
}

/// Difference between two tuning rows of the same cell.
pub fn compare_cells(first: &CellTuning, second: &CellTuning) -> (f64, f64) {
    let delta_ori = match (first.direction, second.direction) {
        (Some(a), Some(b)) => angular_distance(a, b),
        _ => f64::NAN,
    };
    (delta_ori, second.p_value - first.p_value)
}

/// Session pairs of one subject/field of view that have no stability rows yet.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StabilityJob {
    pub key: StabilityKey,
    /// `(session_1, session_2)` with `session_1 < session_2`.
    pub pairs: Vec<(u16, u16)>,
}

/// Lowest tuned registration id of every session recorded for `key`.
fn session_registrations(store: &RecordStore, key: StabilityKey) -> Result<BTreeMap<u16, u32>> {
    let mut by_session: BTreeMap<u16, u32> = BTreeMap::new();
    for registration in store.fetch_all::<Registration>()? {
        let id = registration.registration_id;
        if !is_tuned(store, id)? {
            continue;
        }
        let run = first_run(store, id)?;
        if run.subject_id != key.subject_id || run.fov_id != key.fov_id {
            continue;
        }
        by_session
            .entry(run.session)
            .and_modify(|existing| *existing = (*existing).min(id))
            .or_insert(id);
    }
    Ok(by_session)
}

/// Session pairs still to compare, grouped by subject/field of view.
///
/// A pair is done once any row for it exists; every compared pair writes at
/// least the row of cell 0.
pub fn pending_stability(store: &RecordStore) -> Result<Vec<StabilityJob>> {
    let done: BTreeSet<(u32, u16, u16, u16)> = store
        .fetch_all::<CellStability>()?
        .iter()
        .map(|row| (row.subject_id, row.fov_id, row.session_1, row.session_2))
        .collect();

    let mut jobs = Vec::new();
    for key in stability_key_source(store)? {
        let sessions: Vec<u16> = session_registrations(store, key)?.into_keys().collect();
        let mut pairs = Vec::new();
        for (i, &session_1) in sessions.iter().enumerate() {
            for &session_2 in &sessions[i + 1..] {
                if !done.contains(&(key.subject_id, key.fov_id, session_1, session_2)) {
                    pairs.push((session_1, session_2));
                }
            }
        }
        if !pairs.is_empty() {
            jobs.push(StabilityJob { key, pairs });
        }
    }
    Ok(jobs)
}

/// Compare the tuned cells of each session pair of `job`.
///
/// Each session contributes its lowest registration id. Cells are matched by
/// id; cells present in only one session are skipped.
pub(super) fn compare_sessions(
    store: &RecordStore,
    job: &StabilityJob,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<CellStability>> {
    reporter.begin_stage(PipelineStage::Stability, Some(job.pairs.len()));
    let key = job.key;
    let by_session = session_registrations(store, key)?;

    let mut cells: BTreeMap<u16, BTreeMap<u16, CellTuning>> = BTreeMap::new();
    for &(session_1, session_2) in &job.pairs {
        for session in [session_1, session_2] {
            if cells.contains_key(&session) {
                continue;
            }
            let registration_id = by_session.get(&session).copied().ok_or_else(|| {
                VistuneError::MissingRecord {
                    table: "cell_tuning",
                    key: format!("{:?} session {}", key, session),
                }
            })?;
            let mut session_cells = BTreeMap::new();
            for cell_id in 0u16.. {
                let cell_key = CellKey {
                    registration_id,
                    cell_id,
                };
                match store.fetch::<CellTuning>(&cell_key)? {
                    Some(row) => session_cells.insert(cell_id, row),
                    None => break,
                };
            }
            debug!(session, registration_id, cells = session_cells.len(), "Loaded session cells");
            cells.insert(session, session_cells);
        }
    }

    let mut rows = Vec::new();
    for (done, &(session_1, session_2)) in job.pairs.iter().enumerate() {
        for (cell_id, first) in &cells[&session_1] {
            let Some(second) = cells[&session_2].get(cell_id) else {
                continue;
            };
            let (delta_ori, delta_p) = compare_cells(first, second);
            rows.push(CellStability {
                subject_id: key.subject_id,
                fov_id: key.fov_id,
                session_1,
                session_2,
                cell_id_1: *cell_id,
                cell_id_2: *cell_id,
                delta_ori,
                delta_p,
            });
        }
        reporter.advance(done + 1);
    }
    reporter.finish_stage();

    info!(
        subject_id = key.subject_id,
        fov_id = key.fov_id,
        pairs = job.pairs.len(),
        rows = rows.len(),
        "Compared sessions"
    );
    Ok(rows)
}
