use serde::{Deserialize, Serialize};

use crate::consts::{
    DEFAULT_BIN_WIDTH, DEFAULT_DOWNSAMPLE, DEFAULT_FRAME_STRIDE, DEFAULT_MAX_LENGTH,
    DEFAULT_MIN_CORR_LEN, DEFAULT_MIN_FRACTION, DEFAULT_PIXEL_SIZE,
};
use crate::error::{FlowError, Result};
use crate::flow::BlockFlowConfig;
use crate::frame::ImageStack;
pub use crate::frame::EmptyChannelPolicy;

/// Parameters of the correlation-length analysis for one channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlowConfig {
    /// Physical size of one pixel (microns).
    #[serde(default = "default_pixel_size")]
    pub pixel_size: f64,
    /// Physical width of a radial annulus (microns).
    #[serde(default = "default_bin_width")]
    pub bin_width: f64,
    /// Physical radius at which the radial profile stops (microns).
    #[serde(default = "default_max_length")]
    pub max_length: f64,
    /// Normalized correlation defining "decayed" (default: 1/e).
    #[serde(default = "default_decay_threshold")]
    pub decay_threshold: f64,
    /// Correlation length (microns) a pair must exceed to count as organized.
    #[serde(default = "default_min_corr_len")]
    pub min_corr_len: f64,
    /// Fraction of organized pairs required for a positive verdict.
    #[serde(default = "default_min_fraction")]
    pub min_fraction: f64,
    /// Frames between the two members of each pair.
    #[serde(default = "default_frame_stride")]
    pub frame_stride: usize,
    /// Subgrid step applied before the correlation analysis.
    #[serde(default = "default_downsample")]
    pub downsample: usize,
    #[serde(default)]
    pub empty_channel: EmptyChannelPolicy,
    /// Fan out frame pairs across the Rayon pool.
    #[serde(default = "default_parallel")]
    pub parallel: bool,
}

fn default_pixel_size() -> f64 {
    DEFAULT_PIXEL_SIZE
}
fn default_bin_width() -> f64 {
    DEFAULT_BIN_WIDTH
}
fn default_max_length() -> f64 {
    DEFAULT_MAX_LENGTH
}
fn default_decay_threshold() -> f64 {
    (-1.0f64).exp()
}
fn default_min_corr_len() -> f64 {
    DEFAULT_MIN_CORR_LEN
}
fn default_min_fraction() -> f64 {
    DEFAULT_MIN_FRACTION
}
fn default_frame_stride() -> usize {
    DEFAULT_FRAME_STRIDE
}
fn default_downsample() -> usize {
    DEFAULT_DOWNSAMPLE
}
fn default_parallel() -> bool {
    true
}

impl Default for FlowConfig {
    fn default() -> Self {
        Self {
            pixel_size: DEFAULT_PIXEL_SIZE,
            bin_width: DEFAULT_BIN_WIDTH,
            max_length: DEFAULT_MAX_LENGTH,
            decay_threshold: default_decay_threshold(),
            min_corr_len: DEFAULT_MIN_CORR_LEN,
            min_fraction: DEFAULT_MIN_FRACTION,
            frame_stride: DEFAULT_FRAME_STRIDE,
            downsample: DEFAULT_DOWNSAMPLE,
            empty_channel: EmptyChannelPolicy::default(),
            parallel: true,
        }
    }
}

impl FlowConfig {
    /// Annulus width in pixels, `ceil(bin_width / pixel_size)`, at least 1.
    pub fn pixel_bin_width(&self) -> usize {
        ((self.bin_width / self.pixel_size).ceil() as usize).max(1)
    }

    /// Profile horizon in pixels, `round(max_length / pixel_size)`.
    pub fn max_pixel_len(&self) -> usize {
        (self.max_length / self.pixel_size).round() as usize
    }

    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("pixel_size", self.pixel_size),
            ("bin_width", self.bin_width),
            ("max_length", self.max_length),
        ];
        for (name, value) in positive {
            if !(value.is_finite() && value > 0.0) {
                return Err(FlowError::InvalidConfig(format!(
                    "{name} must be positive, got {value}"
                )));
            }
        }
        if !(self.decay_threshold > 0.0 && self.decay_threshold < 1.0) {
            return Err(FlowError::InvalidConfig(format!(
                "decay_threshold must lie in (0, 1), got {}",
                self.decay_threshold
            )));
        }
        if !(0.0..=1.0).contains(&self.min_fraction) {
            return Err(FlowError::InvalidConfig(format!(
                "min_fraction must lie in [0, 1], got {}",
                self.min_fraction
            )));
        }
        if !self.min_corr_len.is_finite() || self.min_corr_len < 0.0 {
            return Err(FlowError::InvalidConfig(format!(
                "min_corr_len must be non-negative, got {}",
                self.min_corr_len
            )));
        }
        if self.frame_stride == 0 {
            return Err(FlowError::InvalidConfig("frame_stride must be at least 1".into()));
        }
        if self.downsample == 0 {
            return Err(FlowError::InvalidConfig("downsample must be at least 1".into()));
        }
        Ok(())
    }
}

/// Which channels of a stack to analyze.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChannelSelect {
    #[default]
    All,
    Index(usize),
}

impl ChannelSelect {
    /// Channel indices of `stack` this selection covers, in order.
    pub fn channels(self, stack: &ImageStack) -> Result<Vec<usize>> {
        match self {
            Self::All => Ok((0..stack.channel_count()).collect()),
            Self::Index(c) => {
                stack.check_channel(c)?;
                Ok(vec![c])
            }
        }
    }
}

impl std::fmt::Display for ChannelSelect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::All => write!(f, "All"),
            Self::Index(c) => write!(f, "Channel {}", c),
        }
    }
}

/// Everything a batch run needs besides the input paths.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(default)]
    pub channel: ChannelSelect,
    #[serde(default)]
    pub flow: FlowConfig,
    #[serde(default)]
    pub estimator: BlockFlowConfig,
}
