use anyhow::Result;
use clap::Args;

use super::StoreArgs;

#[derive(Args)]
pub struct InitArgs {
    #[command(flatten)]
    pub store: StoreArgs,
}

pub fn run(args: &InitArgs) -> Result<()> {
    let config = args.store.load_config()?;
    let mut store = args.store.open_store(&config)?;
    let seeded = store.seed_lookups()?;

    println!("Store ready at {}", config.store.path.display());
    println!("  Lookup rows added: {}", seeded);
    Ok(())
}
