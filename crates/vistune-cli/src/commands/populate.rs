use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Args;
use vistune_core::pipeline::{
    populate_registration_reported, populate_stability_reported, populate_tuning_reported,
};

use super::progress::BarReporter;
use super::StoreArgs;
use crate::summary::{print_config_summary, print_populate_summary};

#[derive(Args)]
pub struct PopulateArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

/// Table filled by a populate command.
#[derive(Clone, Copy)]
pub enum Target {
    Registration,
    Tuning,
    Stability,
}

impl Target {
    fn table(self) -> &'static str {
        match self {
            Self::Registration => "registration",
            Self::Tuning => "cell_tuning",
            Self::Stability => "cell_stability",
        }
    }
}

pub fn run(args: &PopulateArgs, target: Target) -> Result<()> {
    let config = args.store.load_config()?;
    let mut store = args.store.open_store(&config)?;
    print_config_summary(&config);

    let reporter = Arc::new(BarReporter::new()?);
    let start = Instant::now();
    let summary = match target {
        Target::Registration => populate_registration_reported(&mut store, &config, reporter.clone()),
        Target::Tuning => populate_tuning_reported(&mut store, &config, reporter.clone()),
        Target::Stability => populate_stability_reported(&mut store, &config, reporter.clone()),
    }
    .with_context(|| format!("Failed to populate {}", target.table()))?;
    reporter.finish();

    print_populate_summary(target.table(), &summary, start.elapsed());
    Ok(())
}
