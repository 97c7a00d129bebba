use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use flowcorr_core::flow::BlockFlow;
use flowcorr_core::io::load_stack;
use flowcorr_core::pipeline::stack_snapshots;

use super::AnalysisArgs;

#[derive(Args)]
pub struct SnapshotArgs {
    /// Input SER file, multi-page TIFF or image-sequence directory
    pub path: PathBuf,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Write the vectors to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Print `channel pair_start pair_stop row col dx dy` for every subgrid cell
/// of the first, middle and last frame pair of each selected channel.
pub fn run(args: &SnapshotArgs) -> Result<()> {
    let config = args.analysis.load_config()?;
    let loaded = load_stack(&args.path)
        .with_context(|| format!("Failed to load {}", args.path.display()))?;
    let estimator = BlockFlow::new(config.estimator.clone());
    let snapshots = stack_snapshots(&loaded.stack, config.channel, &config.flow, &estimator)?;

    let mut out: Box<dyn Write> = match args.output {
        Some(ref path) => Box::new(std::io::BufWriter::new(
            std::fs::File::create(path)
                .with_context(|| format!("Failed to create {}", path.display()))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };

    writeln!(out, "# channel start stop row col dx dy")?;
    for snap in &snapshots {
        for (i, &row) in snap.rows.iter().enumerate() {
            for (j, &col) in snap.cols.iter().enumerate() {
                writeln!(
                    out,
                    "{} {} {} {} {} {:.4} {:.4}",
                    snap.channel,
                    snap.pair.start,
                    snap.pair.stop,
                    row,
                    col,
                    snap.field.dx[[i, j]],
                    snap.field.dy[[i, j]]
                )?;
            }
        }
    }
    out.flush()?;

    if let Some(ref path) = args.output {
        println!("{} snapshot(s) saved to {}", snapshots.len(), path.display());
    }
    Ok(())
}
