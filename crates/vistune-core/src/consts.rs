/// Minimum pixel count (h*w) to use row-level Rayon parallelism.
pub const PARALLEL_PIXEL_THRESHOLD: usize = 65_536;

/// Small epsilon to avoid division by zero in floating-point comparisons.
pub const EPSILON: f64 = 1e-12;

/// Number of leading rows zeroed in every frame to remove the scanner fly-back line.
pub const DEFAULT_FLYLINE_ROWS: usize = 2;

/// Percentile of frame-to-mean correlation a frame must reach to join the target set.
pub const DEFAULT_TARGET_CUT_CC: f64 = 90.0;

/// Upsampling factor for the matrix-multiply DFT refinement during registration.
/// 5 gives ~0.2 px accuracy at a fraction of the cost of 20.
pub const DEFAULT_REGISTRATION_UPSAMPLE: usize = 5;

/// Search window (in pixels) around the coarse peak for the upsampled DFT refinement.
pub const PHASE_SEARCH_WINDOW: f64 = 1.5;

/// Number of SVD components computed per plane during segmentation.
pub const DEFAULT_SVD_COMPONENTS: usize = 4;

/// Percentile of the first spatial component above which a pixel joins the mask.
pub const DEFAULT_MASK_PERCENTILE: f64 = 80.0;

/// Sample stride at which the running baseline percentile is evaluated.
pub const DEFAULT_BASELINE_STEP: usize = 16;

/// Width (in samples) of the running baseline window.
pub const DEFAULT_BASELINE_WINDOW: usize = 256;

/// Percentile of the running window taken as the fluorescence baseline.
pub const DEFAULT_BASELINE_PERCENTILE: f64 = 10.0;

/// p-value threshold of the one-way ANOVA across directions.
pub const DEFAULT_SIGNIFICANCE_THRESHOLD: f64 = 0.05;

/// Preferred directions with a wider confidence interval (degrees) are reported as null.
pub const DEFAULT_ANGLE_CUTOFF: f64 = 45.0;

/// Bootstrap resamples used for the direction confidence interval.
pub const DEFAULT_BOOTSTRAP_SAMPLES: usize = 1000;

/// Seed for the direction bootstrap, so repeated runs produce identical rows.
pub const DEFAULT_BOOTSTRAP_SEED: u64 = 0x5eed;

/// Two-sided confidence level of the direction interval.
pub const DIRECTION_CONFIDENCE: f64 = 0.95;

/// Environment variable naming the compute master.
pub const MASTER_ENV_VAR: &str = "MASTER";

/// File name of the cached time courses inside a session directory.
pub const TIMECOURSE_CACHE_FILE: &str = "tc.toml";

/// File name of the trial table inside a session directory.
pub const BEHAVIOR_FILE: &str = "behavior.toml";

/// Clean (flyline-removed) binary stack file name.
pub const CLEAN_STACK_FILE: &str = "clean.stack";

/// Registered binary stack file name.
pub const REGISTERED_STACK_FILE: &str = "registered.stack";
