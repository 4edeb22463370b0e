use anyhow::Result;
use clap::{Args, ValueEnum};
use vistune_core::records::{CellStability, CellTuning, Registration, RegistrationInput, Run};
use vistune_core::store::RecordStore;

use super::StoreArgs;

#[derive(Clone, Copy, ValueEnum)]
pub enum TableArg {
    Runs,
    Inputs,
    Registrations,
    Tuning,
    Stability,
}

#[derive(Args)]
pub struct ShowArgs {
    #[command(flatten)]
    pub store: StoreArgs,

    /// Table to list
    #[arg(value_enum)]
    pub table: TableArg,
}

pub fn run(args: &ShowArgs) -> Result<()> {
    let config = args.store.load_config()?;
    let store = args.store.open_store(&config)?;

    match args.table {
        TableArg::Runs => show_runs(&store),
        TableArg::Inputs => show_inputs(&store),
        TableArg::Registrations => show_registrations(&store),
        TableArg::Tuning => show_tuning(&store),
        TableArg::Stability => show_stability(&store),
    }
}

fn show_runs(store: &RecordStore) -> Result<()> {
    println!(
        "{:>8}  {:>8}  {:>4}  {:>4}  {:>6}  {:>8}",
        "Subject", "Session", "Run", "FOV", "Planes", "Rate"
    );
    println!("{}", "-".repeat(48));
    for run in store.fetch_all::<Run>()? {
        println!(
            "{:>8}  {:>8}  {:>4}  {:>4}  {:>6}  {:>8.2}",
            run.subject_id, run.session, run.run_id, run.fov_id, run.planes, run.frame_rate
        );
    }
    Ok(())
}

fn show_inputs(store: &RecordStore) -> Result<()> {
    for input in store.fetch_all::<RegistrationInput>()? {
        let runs: Vec<String> = store
            .registration_runs(input.registration_id)?
            .iter()
            .map(|r| format!("{}/{}/{}", r.subject_id, r.session, r.run_id))
            .collect();
        println!("{:>4}  {}", input.registration_id, runs.join(", "));
    }
    Ok(())
}

fn show_registrations(store: &RecordStore) -> Result<()> {
    for reg in store.fetch_all::<Registration>()? {
        let (frames, planes, _) = reg.shifts.dim();
        let max_shift = reg
            .shifts
            .iter()
            .fold(0.0f64, |acc, v| acc.max(v.abs()));
        println!(
            "{:>4}  {} frames x {} planes  max shift {:.2} px  {}",
            reg.registration_id,
            frames,
            planes,
            max_shift,
            reg.reg_binary_path.display()
        );
    }
    Ok(())
}

fn show_tuning(store: &RecordStore) -> Result<()> {
    println!(
        "{:>4}  {:>4}  {:>9}  {:>9}  {:>8}  {:>8}  {:>4}",
        "Reg", "Cell", "Direction", "Interval", "p", "PopCorr", "Sig"
    );
    println!("{}", "-".repeat(60));
    for cell in store.fetch_all::<CellTuning>()? {
        println!(
            "{:>4}  {:>4}  {:>9}  {:>9}  {:>8.4}  {:>8.3}  {:>4}",
            cell.registration_id,
            cell.cell_id,
            format_angle(cell.direction),
            format_angle(cell.interval),
            cell.p_value,
            cell.pop_corr,
            if cell.sig { "yes" } else { "no" }
        );
    }
    Ok(())
}

fn show_stability(store: &RecordStore) -> Result<()> {
    println!(
        "{:>8}  {:>4}  {:>5}  {:>5}  {:>4}  {:>9}  {:>8}",
        "Subject", "FOV", "S1", "S2", "Cell", "dOri", "dP"
    );
    println!("{}", "-".repeat(56));
    for row in store.fetch_all::<CellStability>()? {
        println!(
            "{:>8}  {:>4}  {:>5}  {:>5}  {:>4}  {:>9.1}  {:>8.4}",
            row.subject_id,
            row.fov_id,
            row.session_1,
            row.session_2,
            row.cell_id_1,
            row.delta_ori,
            row.delta_p
        );
    }
    Ok(())
}

fn format_angle(angle: Option<f64>) -> String {
    angle.map_or_else(|| "-".to_string(), |a| format!("{:.1}", a))
}
