use anyhow::{bail, Result};
use clap::Args;
use vistune_core::records::{Run, RunKey};

use super::StoreArgs;

#[derive(Args)]
pub struct AddInputArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Subject id
    #[arg(long)]
    pub subject: u32,

    /// Session number
    #[arg(long)]
    pub session: u16,

    /// Run id; repeat to register several runs together
    #[arg(long = "run", required = true)]
    pub runs: Vec<u16>,
}

pub fn run(args: &AddInputArgs) -> Result<()> {
    let config = args.store.load_config()?;
    let mut store = args.store.open_store(&config)?;

    let keys: Vec<RunKey> = args
        .runs
        .iter()
        .map(|&run_id| RunKey {
            subject_id: args.subject,
            session: args.session,
            run_id,
        })
        .collect();
    for key in &keys {
        if !store.contains::<Run>(key)? {
            bail!(
                "Run {} of subject {} session {} is not in the store",
                key.run_id,
                key.subject_id,
                key.session
            );
        }
    }

    let input = store.create_registration_input(&keys)?;
    println!(
        "Added registration input {} ({} run(s))",
        input.registration_id,
        keys.len()
    );
    Ok(())
}
