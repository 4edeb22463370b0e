use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Result, VistuneError};
use crate::records::{Run, ScanPath, Session};
use crate::store::RecordStore;

/// Operating system family whose path variant is used to reach raw data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    Windows,
    Linux,
    Mac,
}

impl Platform {
    /// The platform this binary was built for. Anything that is neither
    /// Windows nor Linux uses the Mac path, as acquisition machines only
    /// record those three.
    pub fn current() -> Self {
        if cfg!(target_os = "windows") {
            Self::Windows
        } else if cfg!(target_os = "linux") {
            Self::Linux
        } else {
            Self::Mac
        }
    }

    pub fn select<'a>(&self, path: &'a ScanPath) -> &'a str {
        match self {
            Self::Windows => &path.path_windows,
            Self::Linux => &path.path_linux,
            Self::Mac => &path.path_mac,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Windows => write!(f, "Windows"),
            Self::Linux => write!(f, "Linux"),
            Self::Mac => write!(f, "Mac"),
        }
    }
}

/// Where the raw data of one run lives, split into its naming components.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionLocation {
    pub base_path: PathBuf,
    /// `ANM{subject_id}`
    pub animal_id: String,
    /// Session date as `yymmdd`.
    pub date: String,
    /// `Run{run_id}`
    pub run: String,
}

impl SessionLocation {
    /// `base_path/ANM{id}/{yymmdd}/Run{n}`
    pub fn session_dir(&self) -> PathBuf {
        self.base_path
            .join(&self.animal_id)
            .join(&self.date)
            .join(&self.run)
    }
}

/// Combine a session's recorded path with its date and the run identifiers.
pub fn resolve_location(
    path: &ScanPath,
    session: &Session,
    run: &Run,
    platform: Platform,
) -> SessionLocation {
    SessionLocation {
        base_path: PathBuf::from(platform.select(path)),
        animal_id: format!("ANM{}", session.subject_id),
        date: session.session_date.format("%y%m%d").to_string(),
        run: format!("Run{}", run.run_id),
    }
}

/// Resolve the location of the first run of a registration job.
pub fn registration_location(
    store: &RecordStore,
    registration_id: u32,
    platform: Platform,
) -> Result<(SessionLocation, Run)> {
    let first = store
        .registration_runs(registration_id)?
        .into_iter()
        .next()
        .ok_or_else(|| VistuneError::MissingRecord {
            table: "registration_run",
            key: registration_id.to_string(),
        })?;
    let run_key = first.run_key();
    let run: Run = store.fetch_one(&run_key)?;
    let session: Session = store.fetch_one(&run_key.session_key())?;
    let path: ScanPath = store.fetch_one(&run_key.session_key())?;
    Ok((resolve_location(&path, &session, &run, platform), run))
}
