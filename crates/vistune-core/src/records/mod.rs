//! Typed records persisted by the [`RecordStore`](crate::store::RecordStore).
//!
//! Each record type names its table and exposes its primary key as a
//! separate serializable struct. Records are write-once analysis artifacts.

pub mod imaging;
pub mod lab;
pub mod registration;
pub mod tuning;

use serde::de::DeserializeOwned;
use serde::Serialize;

pub use imaging::{
    Anesthesia, Compartment, Fluorophore, Fov, FovKey, Objective, PmtChannel, PmtColor,
    PmtFilterSet, Run, RunKey, ScanPath,
};
pub use lab::{Rig, Session, SessionKey, Subject};
pub use registration::{Registration, RegistrationInput, RegistrationKey, RegistrationRun};
pub use tuning::{CellKey, CellStability, CellTuning, StabilityKey};

/// A row of a store table.
pub trait Record: Serialize + DeserializeOwned {
    /// Table name, also used in error messages.
    const TABLE: &'static str;

    /// Primary key; its JSON encoding is the stored key.
    type Key: Serialize + DeserializeOwned;

    fn key(&self) -> Self::Key;
}
