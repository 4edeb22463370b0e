use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use vistune_core::pipeline::{PipelineStage, ProgressReporter};

/// Two bars: the pending keys of a populate call, and the work items of the
/// stage currently running for one key.
pub struct BarReporter {
    multi: MultiProgress,
    keys: ProgressBar,
    stage: ProgressBar,
}

impl BarReporter {
    pub fn new() -> anyhow::Result<Self> {
        let multi = MultiProgress::new();
        let keys = multi.add(ProgressBar::new(0));
        keys.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:>14} [{bar:40}] {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );
        let stage = multi.add(ProgressBar::new(0));
        stage.set_style(
            ProgressStyle::default_bar()
                .template("{prefix:>14} [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );
        stage.set_prefix("stage");
        Ok(Self { multi, keys, stage })
    }

    pub fn finish(&self) {
        self.stage.finish_and_clear();
        self.multi.remove(&self.stage);
        self.keys.finish_with_message("Done");
    }
}

impl ProgressReporter for BarReporter {
    fn begin_keys(&self, table: &str, total: usize) {
        self.keys.set_length(total as u64);
        self.keys.set_prefix(table.to_string());
    }

    fn begin_key(&self, label: &str) {
        self.keys.set_message(label.to_string());
    }

    /// Stages without a known item count show as a single item.
    fn begin_stage(&self, stage: PipelineStage, total_items: Option<usize>) {
        self.stage.reset();
        self.stage.set_length(total_items.unwrap_or(1) as u64);
        self.stage.set_message(stage.to_string());
    }

    fn advance(&self, items_done: usize) {
        self.stage.set_position(items_done as u64);
    }

    fn finish_stage(&self) {
        if let Some(total) = self.stage.length() {
            self.stage.set_position(total);
        }
    }

    fn finish_key(&self) {
        self.keys.inc(1);
    }
}
