use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::volume::Shifts;

use super::imaging::RunKey;
use super::Record;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RegistrationKey {
    pub registration_id: u32,
}

/// A registration job grouping one or more runs. Ids are allocated by the store.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistrationInput {
    pub registration_id: u32,
}

impl Record for RegistrationInput {
    const TABLE: &'static str = "registration_input";
    type Key = RegistrationKey;

    fn key(&self) -> RegistrationKey {
        RegistrationKey {
            registration_id: self.registration_id,
        }
    }
}

/// Run taking part in a registration job.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistrationRun {
    pub registration_id: u32,
    pub subject_id: u32,
    pub session: u16,
    pub run_id: u16,
    pub registrationrun_id: u16,
}

impl RegistrationRun {
    pub fn run_key(&self) -> RunKey {
        RunKey {
            subject_id: self.subject_id,
            session: self.session,
            run_id: self.run_id,
        }
    }
}

impl Record for RegistrationRun {
    const TABLE: &'static str = "registration_run";
    type Key = (u32, u16);

    fn key(&self) -> (u32, u16) {
        (self.registration_id, self.registrationrun_id)
    }
}

/// Result of registering a [`RegistrationInput`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Registration {
    pub registration_id: u32,
    /// Binary stack with the flyline removed, before motion correction.
    pub clean_binary_path: PathBuf,
    /// Binary stack after the second registration pass.
    pub reg_binary_path: PathBuf,
    /// Second-pass shifts, shape = (frames, planes, 2) as (dy, dx).
    pub shifts: Shifts,
}

impl Record for Registration {
    const TABLE: &'static str = "registration";
    type Key = RegistrationKey;

    fn key(&self) -> RegistrationKey {
        RegistrationKey {
            registration_id: self.registration_id,
        }
    }
}
