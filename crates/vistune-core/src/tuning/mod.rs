pub mod anova;
pub mod behavior;
pub mod direction;
pub mod population;

pub use anova::{one_way_anova, AnovaResult};
pub use behavior::{align_trials, trial_means, Trial, TrialResponses, TrialTable};
pub use direction::{angular_distance, estimate_direction, DirectionEstimate, DirectionParams};
pub use population::{population_correlation, population_correlation_dyn};
