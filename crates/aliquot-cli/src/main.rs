//! aliquot CLI - plan, check and export liquid-handling mixes.

mod commands;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "aliquot")]
#[command(author, version, about = "Liquid-handling mix planner", long_about = None)]
struct Cli {
    /// Log resolution steps (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build a protocol and report validation findings
    Check(commands::check::CheckArgs),

    /// Print a mix recipe
    Show(commands::show::ShowArgs),

    /// Export acoustic transfer lists as CSV
    Transfers(commands::transfers::TransfersArgs),

    /// Scale a mix for several tubes plus excess
    Split(commands::split::SplitArgs),

    /// Show volumes consumed and made across nested mixes
    Volumes(commands::volumes::VolumesArgs),

    /// Print plate maps
    Plates(commands::plates::PlatesArgs),

    /// List available action types and their parameters
    Actions(commands::actions::ActionsArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check(args) => commands::check::run(args),
        Commands::Show(args) => commands::show::run(args),
        Commands::Transfers(args) => commands::transfers::run(args),
        Commands::Split(args) => commands::split::run(args),
        Commands::Volumes(args) => commands::volumes::run(args),
        Commands::Plates(args) => commands::plates::run(args),
        Commands::Actions(args) => commands::actions::run(args),
    }
}
