use ndarray::{Array1, Array2, Array3};
use serde::{Deserialize, Serialize};

use super::Record;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellKey {
    pub registration_id: u32,
    pub cell_id: u16,
}

/// Per-cell tuning result of one registration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CellTuning {
    pub registration_id: u32,
    pub cell_id: u16,
    /// Time-aligned dF/F.
    pub df: Array1<f64>,
    /// Trial-aligned dF/F, shape = (direction, time, repeat).
    pub trial_df: Array3<f64>,
    /// Pearson correlation of the cell to the mean of the other cells.
    pub pop_corr: f64,
    /// Preferred direction (deg), null when not reliably tuned.
    pub direction: Option<f64>,
    /// Width of the direction confidence interval (deg).
    pub interval: Option<f64>,
    /// One-way ANOVA across directions reached significance.
    pub sig: bool,
    pub p_value: f64,
    /// Binary mask, shape = (height, width) of the registration mean frame.
    pub mask: Array2<bool>,
    /// Registered mean image of the cell's plane.
    pub mean: Array2<f32>,
    /// Median noise of the dF/F.
    pub noise: f64,
}

impl Record for CellTuning {
    const TABLE: &'static str = "cell_tuning";
    type Key = CellKey;

    fn key(&self) -> CellKey {
        CellKey {
            registration_id: self.registration_id,
            cell_id: self.cell_id,
        }
    }
}

/// Subject and field of view whose cells are compared across sessions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StabilityKey {
    pub subject_id: u32,
    pub fov_id: u16,
}

/// Change of a cell's tuning between two sessions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellStability {
    pub subject_id: u32,
    pub fov_id: u16,
    pub session_1: u16,
    pub session_2: u16,
    pub cell_id_1: u16,
    pub cell_id_2: u16,
    /// Wrapped difference of preferred directions (deg, 0..=180); NaN when either is null.
    pub delta_ori: f64,
    /// Change of the ANOVA p-value, second session minus first.
    pub delta_p: f64,
}

impl Record for CellStability {
    const TABLE: &'static str = "cell_stability";
    type Key = (u32, u16, u16, u16, u16, u16);

    fn key(&self) -> Self::Key {
        (
            self.subject_id,
            self.fov_id,
            self.session_1,
            self.session_2,
            self.cell_id_1,
            self.cell_id_2,
        )
    }
}
