use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Record;

/// A microscope rig.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Rig {
    pub rig: String,
    #[serde(default)]
    pub description: String,
}

impl Record for Rig {
    const TABLE: &'static str = "rig";
    type Key = String;

    fn key(&self) -> String {
        self.rig.clone()
    }
}

/// An experimental animal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Subject {
    pub subject_id: u32,
    #[serde(default)]
    pub notes: String,
}

impl Record for Subject {
    const TABLE: &'static str = "subject";
    type Key = u32;

    fn key(&self) -> u32 {
        self.subject_id
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    pub subject_id: u32,
    pub session: u16,
}

/// One recording day of a subject.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub subject_id: u32,
    pub session: u16,
    pub session_date: NaiveDate,
}

impl Record for Session {
    const TABLE: &'static str = "session";
    type Key = SessionKey;

    fn key(&self) -> SessionKey {
        SessionKey {
            subject_id: self.subject_id,
            session: self.session,
        }
    }
}
