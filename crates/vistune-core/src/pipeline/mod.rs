pub mod config;
mod orchestrator;
mod registration;
mod stability;
mod tuning;
mod types;

pub use orchestrator::{
    pending_registrations, pending_tunings, populate_registration, populate_registration_reported,
    populate_stability, populate_stability_reported, populate_tuning, populate_tuning_reported,
};
pub use stability::{compare_cells, pending_stability, stability_key_source, StabilityJob};
pub use types::{NoOpReporter, PipelineStage, PopulateSummary, ProgressReporter};
