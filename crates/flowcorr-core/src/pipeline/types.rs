use crate::correlation::LengthOutcome;
use crate::frame::FramePair;

/// Analysis stage, used for progress reporting.
#[derive(Clone, Copy, Debug)]
pub enum AnalysisStage {
    Screening,
    FlowEstimation,
    Aggregation,
}

impl std::fmt::Display for AnalysisStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Screening => write!(f, "Screening channel"),
            Self::FlowEstimation => write!(f, "Estimating flow"),
            Self::Aggregation => write!(f, "Aggregating"),
        }
    }
}

/// Thread-safe progress reporting for the analysis.
///
/// Channels may run concurrently, so every call names its channel. All
/// methods have default no-op implementations.
pub trait ProgressReporter: Send + Sync {
    /// A new stage has started for `channel`. `total_items` is the number of
    /// work items in this stage (e.g. frame pairs), if known.
    fn begin_stage(&self, _channel: usize, _stage: AnalysisStage, _total_items: Option<usize>) {}

    /// `items_done` work items of `channel`'s current stage have completed.
    fn advance(&self, _channel: usize, _items_done: usize) {}

    /// The current stage of `channel` is finished.
    fn finish_stage(&self, _channel: usize) {}
}

/// No-op progress reporter, used when a plain `analyze_*` call delegates.
pub(super) struct NoOpReporter;
impl ProgressReporter for NoOpReporter {}

/// Outcome of the sequence-level screening.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    /// Enough pairs show long-range correlated motion.
    Detected,
    NotDetected,
    /// The channel failed the empty-channel guard.
    DataUnavailable,
}

impl Verdict {
    pub fn is_positive(&self) -> bool {
        matches!(self, Self::Detected)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Detected => write!(f, "Contraction possibly detected"),
            Self::NotDetected => write!(f, "Contraction not detected"),
            Self::DataUnavailable => write!(f, "Data not available for this channel"),
        }
    }
}

/// Everything extracted from one frame pair.
#[derive(Clone, Debug, PartialEq)]
pub struct PairMetrics {
    pub pair: FramePair,
    pub outcome: LengthOutcome,
    /// Physical correlation length (`0` when no crossing was found).
    pub correlation_length: f64,
    /// Mean unit direction over the downsampled field, `(x, y)`.
    pub mean_direction: (f64, f64),
    /// Mean displacement over the downsampled field, `(dx, dy)`.
    pub mean_velocity: (f64, f64),
    /// Sum of per-pixel divergence over the full-resolution field.
    pub divergence_sum: f64,
    pub divergence_cells: usize,
}

/// Sequence-level statistics of a channel that passed the guard.
#[derive(Clone, Debug, PartialEq)]
pub struct FlowSummary {
    /// Fraction of pairs whose correlation length exceeds `min_corr_len`.
    pub fraction_above: f64,
    /// `atan2` of the mean unit direction, radians, image axes (rows down).
    pub mean_direction: f64,
    /// Magnitude of the mean displacement, pixels per pair.
    pub mean_speed: f64,
    /// Mean divergence over every pixel of every pair.
    pub mean_divergence: f64,
}

/// Result of analyzing one channel.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelAnalysis {
    pub channel: usize,
    pub verdict: Verdict,
    /// Per-pair correlation lengths, in pair order.
    pub correlation_lengths: Vec<f64>,
    pub pairs: Vec<PairMetrics>,
    /// `None` when the channel is unavailable.
    pub summary: Option<FlowSummary>,
}

impl ChannelAnalysis {
    pub(crate) fn unavailable(channel: usize) -> Self {
        Self {
            channel,
            verdict: Verdict::DataUnavailable,
            correlation_lengths: Vec::new(),
            pairs: Vec::new(),
            summary: None,
        }
    }
}
