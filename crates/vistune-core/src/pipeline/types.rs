/// Pipeline processing stage, used for progress reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineStage {
    Reading,
    Cleaning,
    TargetSelection,
    Registration,
    Segmentation,
    TimeCourses,
    Tuning,
    Stability,
    Writing,
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Reading => write!(f, "Reading frames"),
            Self::Cleaning => write!(f, "Removing flyline"),
            Self::TargetSelection => write!(f, "Selecting target frames"),
            Self::Registration => write!(f, "Registering frames"),
            Self::Segmentation => write!(f, "Segmenting planes"),
            Self::TimeCourses => write!(f, "Extracting time courses"),
            Self::Tuning => write!(f, "Computing tuning"),
            Self::Stability => write!(f, "Comparing sessions"),
            Self::Writing => write!(f, "Writing output"),
        }
    }
}

/// Thread-safe progress reporting for the populate calls.
///
/// Implementors can use this to drive progress bars, logging, or any other
/// UI feedback. All methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A populate call is about to process `total` pending keys.
    fn begin_keys(&self, _table: &str, _total: usize) {}

    /// Processing of one key started; `label` identifies it for display.
    fn begin_key(&self, _label: &str) {}

    /// A new stage has started. `total_items` is the number of work items
    /// in this stage (e.g., frame count), if known.
    fn begin_stage(&self, _stage: PipelineStage, _total_items: Option<usize>) {}

    /// `items_done` work items of the current stage have completed.
    fn advance(&self, _items_done: usize) {}

    /// The current stage is finished.
    fn finish_stage(&self) {}

    /// One key has been processed and its rows inserted.
    fn finish_key(&self) {}
}

/// No-op progress reporter, used when callers need no feedback.
pub struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Rows inserted by a populate call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PopulateSummary {
    /// Keys that were pending and processed.
    pub keys: usize,
    pub rows: usize,
}
