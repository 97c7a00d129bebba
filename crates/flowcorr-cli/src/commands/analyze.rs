use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{bail, Context, Result};
use clap::Args;
use console::style;
use flowcorr_core::flow::{BlockFlow, FlowEstimator};
use flowcorr_core::io::{discover_stacks, load_stack};
use flowcorr_core::pipeline::{
    analyze_stack_reported, AnalysisConfig, AnalysisStage, ChannelAnalysis, ProgressReporter,
};
use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use tracing::{info, warn};

use super::AnalysisArgs;
use crate::report::{csv_rows, write_csv, CsvRow};
use crate::summary::{print_analysis_header, print_channel_results};

#[derive(Args)]
pub struct AnalyzeArgs {
    /// Input SER or TIFF stacks, or directories to search for them
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Also write one row per input and channel to this CSV file
    #[arg(long, value_name = "FILE")]
    pub csv: Option<PathBuf>,

    #[command(flatten)]
    pub analysis: AnalysisArgs,

    /// Hide progress bars
    #[arg(short, long)]
    pub quiet: bool,
}

/// One progress bar per channel, created when the channel starts a stage.
struct BarReporter {
    multi: MultiProgress,
    style: ProgressStyle,
    bars: Mutex<HashMap<usize, ProgressBar>>,
}

impl BarReporter {
    fn new() -> Result<Self> {
        Ok(Self {
            multi: MultiProgress::new(),
            style: ProgressStyle::default_bar()
                .template("{msg:28} [{bar:40}] {pos}/{len}")?
                .progress_chars("=> "),
            bars: Mutex::new(HashMap::new()),
        })
    }

    fn with_bar(&self, channel: usize, f: impl FnOnce(&ProgressBar)) {
        let Ok(mut bars) = self.bars.lock() else {
            return;
        };
        let bar = bars.entry(channel).or_insert_with(|| {
            let pb = self.multi.add(ProgressBar::new(0));
            pb.set_style(self.style.clone());
            pb
        });
        f(bar);
    }

    fn finish(&self) {
        if let Ok(bars) = self.bars.lock() {
            for pb in bars.values() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressReporter for BarReporter {
    fn begin_stage(&self, channel: usize, stage: AnalysisStage, total_items: Option<usize>) {
        self.with_bar(channel, |pb| {
            pb.set_message(format!("Channel {channel}: {stage}"));
            pb.set_length(total_items.unwrap_or(1) as u64);
            pb.set_position(0);
        });
    }

    fn advance(&self, channel: usize, items_done: usize) {
        self.with_bar(channel, |pb| pb.set_position(items_done as u64));
    }

    fn finish_stage(&self, channel: usize) {
        self.with_bar(channel, |pb| {
            if let Some(len) = pb.length() {
                pb.set_position(len);
            }
        });
    }
}

/// Expand directories into the stack files found beneath them.
///
/// A directory with no SER or TIFF stack inside is kept as an image
/// sequence. The CSV output's directory is never searched.
fn expand_inputs(paths: &[PathBuf], csv: Option<&Path>) -> Result<Vec<PathBuf>> {
    let exclude: Vec<PathBuf> = csv
        .and_then(Path::parent)
        .filter(|dir| !dir.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .into_iter()
        .collect();

    let mut inputs = Vec::new();
    for path in paths {
        if !path.is_dir() {
            inputs.push(path.clone());
            continue;
        }
        let found = discover_stacks(path, &exclude)
            .with_context(|| format!("Failed to search {}", path.display()))?;
        if found.is_empty() {
            inputs.push(path.clone());
        } else {
            info!(dir = %path.display(), stacks = found.len(), "Expanded directory");
            inputs.extend(found);
        }
    }
    Ok(inputs)
}

pub fn run(args: &AnalyzeArgs) -> Result<()> {
    let config = args.analysis.load_config()?;
    let estimator = BlockFlow::new(config.estimator.clone());
    let inputs = expand_inputs(&args.paths, args.csv.as_deref())?;
    print_analysis_header(&config, estimator.name());

    let mut rows: Vec<CsvRow> = Vec::new();
    let mut failures = 0;
    for path in &inputs {
        match analyze_path(path, &config, &estimator, args.quiet) {
            Ok(results) => {
                print_channel_results(path, &results, &config.flow);
                rows.extend(csv_rows(path, &results, &config.flow));
            }
            Err(err) => {
                failures += 1;
                warn!(path = %path.display(), error = %err, "Skipping input");
                eprintln!("  {} {:#}", style("error").red().bold(), err);
            }
        }
    }

    if let Some(ref csv) = args.csv {
        let file = std::fs::File::create(csv)
            .with_context(|| format!("Failed to create {}", csv.display()))?;
        write_csv(std::io::BufWriter::new(file), &rows)?;
        println!("  Results for {} channel(s) saved to {}", rows.len(), csv.display());
    }

    if failures == inputs.len() {
        bail!("None of the {} input(s) could be analyzed", failures);
    }
    if failures > 0 {
        eprintln!("  {} of {} input(s) skipped", failures, inputs.len());
    }
    Ok(())
}

fn analyze_path(
    path: &Path,
    config: &AnalysisConfig,
    estimator: &dyn FlowEstimator,
    quiet: bool,
) -> Result<Vec<ChannelAnalysis>> {
    let loaded =
        load_stack(path).with_context(|| format!("Failed to load {}", path.display()))?;

    let reporter = BarReporter::new()?;
    if quiet {
        reporter
            .multi
            .set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }
    let results = analyze_stack_reported(
        &loaded.stack,
        config.channel,
        &config.flow,
        estimator,
        &reporter,
    )
    .with_context(|| format!("Analysis of {} failed", path.display()));
    reporter.finish();
    results
}
