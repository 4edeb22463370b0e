use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::compute::Master;
use crate::consts::{
    DEFAULT_ANGLE_CUTOFF, DEFAULT_BASELINE_PERCENTILE, DEFAULT_BASELINE_STEP,
    DEFAULT_BASELINE_WINDOW, DEFAULT_BOOTSTRAP_SAMPLES, DEFAULT_BOOTSTRAP_SEED,
    DEFAULT_FLYLINE_ROWS, DEFAULT_MASK_PERCENTILE, DEFAULT_REGISTRATION_UPSAMPLE,
    DEFAULT_SIGNIFICANCE_THRESHOLD, DEFAULT_SVD_COMPONENTS, DEFAULT_TARGET_CUT_CC,
};
use crate::error::Result;
use crate::paths::Platform;
use crate::tuning::DirectionParams;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub compute: ComputeConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub segmentation: SegmentationConfig,
    #[serde(default)]
    pub timecourse: TimeCourseConfig,
    #[serde(default)]
    pub tuning: TuningConfig,
}

impl PipelineConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StoreConfig {
    /// SQLite database holding every record table.
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("vistune.db"),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ComputeConfig {
    /// Compute master, e.g. `local`, `local[4]` or `local[*]`.
    pub master: String,
    /// Which of a session's recorded paths to use; the build target when unset.
    pub platform: Option<Platform>,
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            master: "local[*]".to_string(),
            platform: None,
        }
    }
}

impl ComputeConfig {
    pub fn master(&self) -> Result<Master> {
        self.master.parse()
    }

    pub fn platform(&self) -> Platform {
        self.platform.unwrap_or_else(Platform::current)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegistrationConfig {
    /// Leading rows of every frame zeroed before registration.
    pub flyline_rows: usize,
    /// Percentile (0..=100) of frame-to-mean correlation for target frames.
    pub cut_cc: f64,
    /// Subpixel upsampling factor of the phase correlation refinement.
    pub upsample: usize,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            flyline_rows: DEFAULT_FLYLINE_ROWS,
            cut_cc: DEFAULT_TARGET_CUT_CC,
            upsample: DEFAULT_REGISTRATION_UPSAMPLE,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SegmentationConfig {
    pub n_comp: usize,
    /// Percentile of the first spatial component a pixel must exceed.
    pub px_threshold: f64,
}

impl Default for SegmentationConfig {
    fn default() -> Self {
        Self {
            n_comp: DEFAULT_SVD_COMPONENTS,
            px_threshold: DEFAULT_MASK_PERCENTILE,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TimeCourseConfig {
    pub baseline_window: usize,
    pub step: usize,
    pub percentile: f64,
    /// Reuse `tc.toml` from the session directory when present.
    pub use_cache: bool,
}

impl Default for TimeCourseConfig {
    fn default() -> Self {
        Self {
            baseline_window: DEFAULT_BASELINE_WINDOW,
            step: DEFAULT_BASELINE_STEP,
            percentile: DEFAULT_BASELINE_PERCENTILE,
            use_cache: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TuningConfig {
    pub sig_th: f64,
    /// Directions whose confidence interval is wider than this (deg) are dropped.
    pub angle_cutoff: f64,
    pub bootstrap_samples: usize,
    pub seed: u64,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            sig_th: DEFAULT_SIGNIFICANCE_THRESHOLD,
            angle_cutoff: DEFAULT_ANGLE_CUTOFF,
            bootstrap_samples: DEFAULT_BOOTSTRAP_SAMPLES,
            seed: DEFAULT_BOOTSTRAP_SEED,
        }
    }
}

impl TuningConfig {
    /// Bootstrap settings for one cell; the seed is offset by the cell index.
    pub fn direction_params(&self, cell: usize) -> DirectionParams {
        DirectionParams {
            angle_cutoff: self.angle_cutoff,
            samples: self.bootstrap_samples,
            seed: self.seed.wrapping_add(cell as u64),
        }
    }
}
