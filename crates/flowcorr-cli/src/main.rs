mod commands;
mod report;
mod summary;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "flowcorr", about = "Correlation length of collective motion in time-lapse stacks")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Worker threads for the analysis (default: all cores)
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze SER or TIFF stacks, image-sequence directories or directory trees
    Analyze(commands::analyze::AnalyzeArgs),
    /// Show stack metadata and empty channels
    Info(commands::info::InfoArgs),
    /// Print downsampled flow fields of representative frame pairs
    Snapshot(commands::snapshot::SnapshotArgs),
    /// Print or save the default analysis config as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if let Some(threads) = cli.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("Failed to configure the thread pool")?;
    }

    match &cli.command {
        Commands::Analyze(args) => commands::analyze::run(args),
        Commands::Info(args) => commands::info::run(args),
        Commands::Snapshot(args) => commands::snapshot::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
