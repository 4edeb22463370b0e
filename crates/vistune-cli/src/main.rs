mod commands;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "vistune", about = "Two-photon imaging registration and tuning pipeline")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the record store and seed the lookup tables
    Init(commands::init::InitArgs),
    /// Print or save the default pipeline config
    Config(commands::config::ConfigArgs),
    /// Import subjects, sessions, runs and scan paths from a TOML manifest
    Import(commands::import::ImportArgs),
    /// Add a registration input for one or more runs
    AddInput(commands::add_input::AddInputArgs),
    /// Register every pending registration input
    Register(commands::populate::PopulateArgs),
    /// Compute cell tuning for every pending registration
    Tune(commands::populate::PopulateArgs),
    /// Compare cell tuning across sessions
    Stability(commands::populate::PopulateArgs),
    /// List the rows of a table
    Show(commands::show::ShowArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Import(args) => commands::import::run(args),
        Commands::AddInput(args) => commands::add_input::run(args),
        Commands::Register(args) => commands::populate::run(args, commands::populate::Target::Registration),
        Commands::Tune(args) => commands::populate::run(args, commands::populate::Target::Tuning),
        Commands::Stability(args) => commands::populate::run(args, commands::populate::Target::Stability),
        Commands::Show(args) => commands::show::run(args),
    }
}
