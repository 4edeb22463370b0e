use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use vistune_core::records::{Fov, Rig, Run, ScanPath, Session, Subject};

use super::StoreArgs;

#[derive(Args)]
pub struct ImportArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Manifest file (TOML) with [[subject]], [[session]], [[run]], [[scan_path]],
    /// [[rig]] and [[fov]] entries
    pub manifest: PathBuf,
}

/// Experiment metadata entered by hand, one array of tables per record type.
#[derive(Deserialize, Default)]
#[serde(default)]
struct Manifest {
    rig: Vec<Rig>,
    subject: Vec<Subject>,
    session: Vec<Session>,
    run: Vec<Run>,
    scan_path: Vec<ScanPath>,
    fov: Vec<Fov>,
}

pub fn run(args: &ImportArgs) -> Result<()> {
    let contents = std::fs::read_to_string(&args.manifest)
        .with_context(|| format!("Failed to read manifest {}", args.manifest.display()))?;
    let manifest: Manifest = toml::from_str(&contents).context("Invalid manifest")?;

    let config = args.store.load_config()?;
    let mut store = args.store.open_store(&config)?;

    let counts = [
        ("rigs", store.insert_missing(&manifest.rig)?),
        ("subjects", store.insert_missing(&manifest.subject)?),
        ("sessions", store.insert_missing(&manifest.session)?),
        ("runs", store.insert_missing(&manifest.run)?),
        ("scan paths", store.insert_missing(&manifest.scan_path)?),
        ("fields of view", store.insert_missing(&manifest.fov)?),
    ];

    println!("Imported {}", args.manifest.display());
    for (name, added) in counts {
        println!("  {:<16}{}", name, added);
    }
    Ok(())
}
