pub mod analyze;
pub mod config;
pub mod info;
pub mod snapshot;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use flowcorr_core::pipeline::{AnalysisConfig, ChannelSelect, EmptyChannelPolicy};

#[derive(Clone, Copy, ValueEnum)]
pub enum EmptyPolicyArg {
    AllZero,
    AnyFrameZero,
}

impl From<EmptyPolicyArg> for EmptyChannelPolicy {
    fn from(arg: EmptyPolicyArg) -> Self {
        match arg {
            EmptyPolicyArg::AllZero => EmptyChannelPolicy::AllZero,
            EmptyPolicyArg::AnyFrameZero => EmptyChannelPolicy::AnyFrameZero,
        }
    }
}

/// Analysis parameters shared by `analyze` and `snapshot`.
///
/// Flags override values from `--config`; unset flags keep the file's (or
/// the built-in) defaults.
#[derive(Args)]
pub struct AnalysisArgs {
    /// Analysis config file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Channel to analyze (default: all)
    #[arg(long)]
    pub channel: Option<usize>,

    /// Pixel size in microns
    #[arg(long)]
    pub pixel_size: Option<f64>,

    /// Minimum correlation length (microns) for a pair to count as organized
    #[arg(long)]
    pub min_corr_len: Option<f64>,

    /// Fraction of organized pairs required for a positive verdict
    #[arg(long)]
    pub min_fraction: Option<f64>,

    /// Frames between the two members of a pair
    #[arg(long)]
    pub stride: Option<usize>,

    /// Subgrid step for the correlation analysis
    #[arg(long)]
    pub downsample: Option<usize>,

    /// Rule for reporting a channel as empty
    #[arg(long, value_enum)]
    pub empty_channel: Option<EmptyPolicyArg>,

    /// Flow block size in pixels
    #[arg(long)]
    pub block_size: Option<usize>,

    /// Process frame pairs one at a time
    #[arg(long)]
    pub sequential: bool,
}

impl AnalysisArgs {
    pub fn load_config(&self) -> Result<AnalysisConfig> {
        let mut config: AnalysisConfig = if let Some(ref path) = self.config {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            toml::from_str(&contents).context("Invalid analysis config")?
        } else {
            AnalysisConfig::default()
        };

        if let Some(channel) = self.channel {
            config.channel = ChannelSelect::Index(channel);
        }
        let flow = &mut config.flow;
        if let Some(v) = self.pixel_size {
            flow.pixel_size = v;
        }
        if let Some(v) = self.min_corr_len {
            flow.min_corr_len = v;
        }
        if let Some(v) = self.min_fraction {
            flow.min_fraction = v;
        }
        if let Some(v) = self.stride {
            flow.frame_stride = v;
        }
        if let Some(v) = self.downsample {
            flow.downsample = v;
        }
        if let Some(policy) = self.empty_channel {
            flow.empty_channel = policy.into();
        }
        if self.sequential {
            flow.parallel = false;
        }
        if let Some(v) = self.block_size {
            config.estimator.block_size = v;
        }

        config.flow.validate()?;
        Ok(config)
    }
}
