pub mod enhanced_phase;
pub mod phase_correlation;
mod register;
pub mod target;

pub use enhanced_phase::compute_shift_upsampled;
pub use phase_correlation::{bilinear_sample, shift_plane};
pub use register::{register_by_plane, register_by_plane_with_progress, RegisteredStack};
pub use target::find_target_indices;
