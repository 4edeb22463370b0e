pub mod align;
pub mod compute;
pub mod consts;
pub mod error;
pub mod io;
pub mod paths;
pub mod pipeline;
pub mod records;
pub mod segment;
pub mod stats;
pub mod store;
pub mod timecourse;
pub mod tuning;
pub mod volume;
