use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::lab::SessionKey;
use super::Record;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RunKey {
    pub subject_id: u32,
    pub session: u16,
    pub run_id: u16,
}

impl RunKey {
    pub fn session_key(&self) -> SessionKey {
        SessionKey {
            subject_id: self.subject_id,
            session: self.session,
        }
    }
}

/// One continuous acquisition within a session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub subject_id: u32,
    pub session: u16,
    pub run_id: u16,
    /// Field of view the run was acquired in; cells of runs sharing a FOV are comparable.
    pub fov_id: u16,
    /// Number of interleaved imaging planes.
    #[serde(default = "default_planes")]
    pub planes: usize,
    /// Volume rate in Hz.
    #[serde(default)]
    pub frame_rate: f64,
}

fn default_planes() -> usize {
    1
}

impl Run {
    pub fn run_key(&self) -> RunKey {
        RunKey {
            subject_id: self.subject_id,
            session: self.session,
            run_id: self.run_id,
        }
    }
}

impl Record for Run {
    const TABLE: &'static str = "run";
    type Key = RunKey;

    fn key(&self) -> RunKey {
        self.run_key()
    }
}

/// Raw data location of a session, recorded verbatim for each acquisition platform.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScanPath {
    pub subject_id: u32,
    pub session: u16,
    pub path_windows: String,
    pub path_linux: String,
    pub path_mac: String,
}

impl Record for ScanPath {
    const TABLE: &'static str = "scan_path";
    type Key = SessionKey;

    fn key(&self) -> SessionKey {
        SessionKey {
            subject_id: self.subject_id,
            session: self.session,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Objective {
    pub objective: String,
    pub objective_description: String,
}

impl Record for Objective {
    const TABLE: &'static str = "objective";
    type Key = String;

    fn key(&self) -> String {
        self.objective.clone()
    }
}

/// Calcium-sensitive indicator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fluorophore {
    pub fluorophore: String,
    #[serde(default)]
    pub dye_description: String,
}

impl Record for Fluorophore {
    const TABLE: &'static str = "fluorophore";
    type Key = String;

    fn key(&self) -> String {
        self.fluorophore.clone()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FovKey {
    pub rig: String,
    pub objective: String,
    /// Scan zoom factor.
    pub mag: f64,
    pub fov_id: u16,
}

/// Field-of-view measurement for a rig, lens and zoom.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Fov {
    pub rig: String,
    pub objective: String,
    pub mag: f64,
    pub fov_id: u16,
    pub fov_date: NaiveDateTime,
    /// Angle of the animal in the AP axis.
    pub pitch: Option<f64>,
    /// Angle of the animal in the ML axis.
    pub roll: Option<f64>,
}

impl Record for Fov {
    const TABLE: &'static str = "fov";
    type Key = FovKey;

    fn key(&self) -> FovKey {
        FovKey {
            rig: self.rig.clone(),
            objective: self.objective.clone(),
            mag: self.mag,
            fov_id: self.fov_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Anesthesia {
    pub anesthesia: String,
    #[serde(default)]
    pub anesthesia_description: String,
}

impl Record for Anesthesia {
    const TABLE: &'static str = "anesthesia";
    type Key = String;

    fn key(&self) -> String {
        self.anesthesia.clone()
    }
}

/// Cell compartment that can be imaged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Compartment {
    pub compartment: String,
}

impl Record for Compartment {
    const TABLE: &'static str = "compartment";
    type Key = String;

    fn key(&self) -> String {
        self.compartment.clone()
    }
}

/// Microscope filter set: dichroics and PMT filters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PmtFilterSet {
    pub pmt_filter_set: String,
    /// Passes the laser (excitation/emission separation).
    pub primary_dichroic: String,
    /// Splits the emission spectrum.
    pub secondary_dichroic: String,
    pub filter_set_description: String,
}

impl Record for PmtFilterSet {
    const TABLE: &'static str = "pmt_filter_set";
    type Key = String;

    fn key(&self) -> String {
        self.pmt_filter_set.clone()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PmtColor {
    Green,
    Red,
    Blue,
}

/// One PMT channel of a filter set.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PmtChannel {
    pub pmt_filter_set: String,
    pub pmt_channel: u8,
    pub color: PmtColor,
    pub pmt_serial_number: String,
    /// Centre (nm) of the overall pass band of all upstream filters.
    pub spectrum_center: u16,
    /// Width (nm) of the overall pass band of all upstream filters.
    pub spectrum_bandwidth: u16,
    #[serde(default)]
    pub pmt_filter_details: String,
}

impl Record for PmtChannel {
    const TABLE: &'static str = "pmt_channel";
    type Key = (String, u8);

    fn key(&self) -> (String, u8) {
        (self.pmt_filter_set.clone(), self.pmt_channel)
    }
}

/// Default lookup contents seeded into a fresh store.
pub mod lookups {
    use super::*;

    pub fn objectives() -> Vec<Objective> {
        [
            ("4x", "Nikon 4x 0.3NA"),
            ("16x", "Olympus 16x 0.8NA"),
            ("20x", "Olympus 20x 1.05NA"),
        ]
        .into_iter()
        .map(|(o, d)| Objective {
            objective: o.into(),
            objective_description: d.into(),
        })
        .collect()
    }

    pub fn fluorophores() -> Vec<Fluorophore> {
        [
            ("GCaMP6s", ""),
            ("GCaMP6f", ""),
            ("JF525Halo", "Janelia Fluor 525 with halo tag"),
            ("JF585Halo", "Janelia Fluor 585 with halo tag"),
        ]
        .into_iter()
        .map(|(f, d)| Fluorophore {
            fluorophore: f.into(),
            dye_description: d.into(),
        })
        .collect()
    }

    pub fn anesthesia() -> Vec<Anesthesia> {
        [("awake", ""), ("fentanyl", ""), ("iso", "isoflurane")]
            .into_iter()
            .map(|(a, d)| Anesthesia {
                anesthesia: a.into(),
                anesthesia_description: d.into(),
            })
            .collect()
    }

    pub fn compartments() -> Vec<Compartment> {
        ["axon", "soma", "dendrite"]
            .into_iter()
            .map(|c| Compartment {
                compartment: c.into(),
            })
            .collect()
    }

    pub fn pmt_filter_sets() -> Vec<PmtFilterSet> {
        [
            ("2P3 red-green A", "562 nm long-pass"),
            ("2P3 blue-green A", "506 nm long-pass"),
        ]
        .into_iter()
        .map(|(name, secondary)| PmtFilterSet {
            pmt_filter_set: name.into(),
            primary_dichroic: "680 nm long-pass?".into(),
            secondary_dichroic: secondary.into(),
            filter_set_description: "purchased with Thorlabs microscope".into(),
        })
        .collect()
    }

    pub fn pmt_channels() -> Vec<PmtChannel> {
        [
            ("2P3 red-green A", 1, PmtColor::Green, "AC7438 Thor", 525, 50),
            ("2P3 red-green A", 2, PmtColor::Red, "AC7753 Thor", 625, 90),
            ("2P3 blue-green A", 1, PmtColor::Blue, "AC7438 Thor", 475, 50),
            ("2P3 blue-green A", 2, PmtColor::Green, "AC7753 Thor", 540, 50),
        ]
        .into_iter()
        .map(|(set, ch, color, serial, center, bw)| PmtChannel {
            pmt_filter_set: set.into(),
            pmt_channel: ch,
            color,
            pmt_serial_number: serial.into(),
            spectrum_center: center,
            spectrum_bandwidth: bw,
            pmt_filter_details: String::new(),
        })
        .collect()
    }
}
