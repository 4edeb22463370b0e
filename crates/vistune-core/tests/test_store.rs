mod common;

use chrono::NaiveDate;
use ndarray::{Array1, Array2, Array3};

use vistune_core::error::VistuneError;
use vistune_core::records::{
    CellKey, CellTuning, Compartment, Objective, PmtChannel, Registration, RegistrationKey,
    RunKey, Session, SessionKey, Subject,
};
use vistune_core::store::RecordStore;
use vistune_core::volume::Shifts;

fn subject(id: u32) -> Subject {
    Subject {
        subject_id: id,
        notes: format!("animal {}", id),
    }
}

#[test]
fn test_insert_and_fetch_round_trip() {
    let store = RecordStore::open_in_memory().unwrap();
    store.insert(&subject(3)).unwrap();
    store
        .insert(&Session {
            subject_id: 3,
            session: 1,
            session_date: NaiveDate::from_ymd_opt(2018, 5, 9).unwrap(),
        })
        .unwrap();

    assert_eq!(store.fetch::<Subject>(&3).unwrap(), Some(subject(3)));
    assert_eq!(store.fetch::<Subject>(&4).unwrap(), None);
    let session: Session = store
        .fetch_one(&SessionKey {
            subject_id: 3,
            session: 1,
        })
        .unwrap();
    assert_eq!(session.session_date, NaiveDate::from_ymd_opt(2018, 5, 9).unwrap());
    assert_eq!(store.count::<Subject>().unwrap(), 1);
}

#[test]
fn test_duplicate_key_is_rejected() {
    let store = RecordStore::open_in_memory().unwrap();
    store.insert(&subject(1)).unwrap();
    let err = store.insert(&subject(1)).unwrap_err();
    assert!(matches!(err, VistuneError::DuplicateKey { table: "subject", .. }));
}

#[test]
fn test_insert_many_is_atomic() {
    let mut store = RecordStore::open_in_memory().unwrap();
    store.insert(&subject(2)).unwrap();
    let batch = [subject(1), subject(2), subject(5)];
    assert!(store.insert_many(&batch).is_err());
    // Nothing from the failed batch was kept.
    assert_eq!(store.count::<Subject>().unwrap(), 1);
    assert!(!store.contains::<Subject>(&1).unwrap());
}

#[test]
fn test_missing_record_error() {
    let store = RecordStore::open_in_memory().unwrap();
    let err = store.fetch_one::<Subject>(&9).unwrap_err();
    assert!(matches!(err, VistuneError::MissingRecord { table: "subject", .. }));
}

#[test]
fn test_fetch_all_in_insertion_order() {
    let store = RecordStore::open_in_memory().unwrap();
    for id in [5, 2, 9] {
        store.insert(&subject(id)).unwrap();
    }
    let ids: Vec<u32> = store
        .fetch_all::<Subject>()
        .unwrap()
        .iter()
        .map(|s| s.subject_id)
        .collect();
    assert_eq!(ids, vec![5, 2, 9]);
}

#[test]
fn test_seed_lookups_is_idempotent() {
    let mut store = RecordStore::open_in_memory().unwrap();
    assert_eq!(store.seed_lookups().unwrap(), 19);
    assert_eq!(store.seed_lookups().unwrap(), 0);

    assert_eq!(store.count::<Objective>().unwrap(), 3);
    assert_eq!(store.count::<PmtChannel>().unwrap(), 4);
    let compartments: Vec<String> = store
        .fetch_all::<Compartment>()
        .unwrap()
        .into_iter()
        .map(|c| c.compartment)
        .collect();
    assert_eq!(compartments, vec!["axon", "soma", "dendrite"]);
}

#[test]
fn test_registration_input_ids_increment() {
    let tmp = tempfile::tempdir().unwrap();
    let mut store = RecordStore::open(&tmp.path().join("store.db")).unwrap();
    let date = NaiveDate::from_ymd_opt(2021, 1, 4).unwrap();
    common::seed_session(&mut store, tmp.path(), 1, 1, date, 1, 1);

    let run = RunKey {
        subject_id: 1,
        session: 1,
        run_id: 1,
    };
    let first = store.create_registration_input(&[run]).unwrap();
    let second = store.create_registration_input(&[run, run]).unwrap();
    assert_eq!(first.registration_id, 1);
    assert_eq!(second.registration_id, 2);

    let runs = store.registration_runs(2).unwrap();
    assert_eq!(runs.len(), 2);
    assert_eq!(runs[1].registrationrun_id, 1);
    assert_eq!(runs[0].run_key(), run);

    assert!(store.create_registration_input(&[]).is_err());
}

#[test]
fn test_store_file_persists() {
    let tmp = tempfile::tempdir().unwrap();
    let path = tmp.path().join("store.db");
    {
        let store = RecordStore::open(&path).unwrap();
        store.insert(&subject(11)).unwrap();
    }
    let store = RecordStore::open(&path).unwrap();
    assert!(store.contains::<Subject>(&11).unwrap());
}

#[test]
fn test_array_payloads_keep_nan() {
    let store = RecordStore::open_in_memory().unwrap();

    let mut shifts = Shifts::zeros((3, 2, 2));
    shifts[[1, 0, 1]] = -1.25;
    store
        .insert(&Registration {
            registration_id: 4,
            clean_binary_path: "/data/clean.stack".into(),
            reg_binary_path: "/data/registered.stack".into(),
            shifts: shifts.clone(),
        })
        .unwrap();
    let reg: Registration = store
        .fetch_one(&RegistrationKey { registration_id: 4 })
        .unwrap();
    assert_eq!(reg.shifts, shifts);

    let mut trial_df = Array3::<f64>::from_elem((2, 3, 2), 0.5);
    trial_df[[1, 2, 1]] = f64::NAN;
    let cell = CellTuning {
        registration_id: 4,
        cell_id: 0,
        df: Array1::from(vec![0.1, f64::NAN, 0.3]),
        trial_df,
        pop_corr: 0.8,
        direction: None,
        interval: None,
        sig: false,
        p_value: f64::NAN,
        mask: Array2::from_elem((4, 5), true),
        mean: Array2::from_elem((4, 5), 0.25),
        noise: 0.01,
    };
    store.insert(&cell).unwrap();

    let loaded: CellTuning = store
        .fetch_one(&CellKey {
            registration_id: 4,
            cell_id: 0,
        })
        .unwrap();
    assert!(loaded.df[1].is_nan());
    assert!(loaded.trial_df[[1, 2, 1]].is_nan());
    assert!(loaded.p_value.is_nan());
    assert_eq!(loaded.direction, None);
    assert_eq!(loaded.mask.dim(), (4, 5));
    assert_eq!(loaded.mean[[3, 4]], 0.25);
}
