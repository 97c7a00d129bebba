use ndarray::{ArrayView3, Axis};

use crate::correlation::{
    direction_autocorrelation, direction_field, downsample_field, radial_profile, solve_length,
    RadiusGrid,
};
use crate::error::{FlowError, Result};
use crate::flow::{divergence, FlowEstimator};
use crate::frame::FramePair;

use super::config::FlowConfig;
use super::types::{FlowSummary, PairMetrics, Verdict};

/// Per-channel constants shared read-only by every pair.
pub(crate) struct PairContext<'a> {
    pub config: &'a FlowConfig,
    pub grid: RadiusGrid,
    pub bin_width: usize,
    pub max_radius: usize,
}

impl<'a> PairContext<'a> {
    pub fn new(config: &'a FlowConfig, height: usize, width: usize) -> Self {
        let step = config.downsample;
        Self {
            config,
            grid: RadiusGrid::new(height.div_ceil(step), width.div_ceil(step)),
            bin_width: config.pixel_bin_width(),
            max_radius: config.max_pixel_len(),
        }
    }
}

/// Run flow estimation and the correlation-length engine on one pair.
///
/// A missing threshold crossing only affects this pair's length; a field of
/// the wrong shape is an error for the whole channel.
pub(crate) fn process_pair(
    frames: ArrayView3<f32>,
    pair: FramePair,
    ctx: &PairContext<'_>,
    estimator: &dyn FlowEstimator,
) -> Result<PairMetrics> {
    let first = frames.index_axis(Axis(0), pair.start);
    let second = frames.index_axis(Axis(0), pair.stop);

    let field = estimator.estimate(first, second)?;
    if field.dim() != first.dim() {
        return Err(FlowError::ShapeMismatch {
            expected: first.dim(),
            found: field.dim(),
        });
    }

    let div = divergence(&field);
    let coarse = downsample_field(&field, ctx.config.downsample);
    let directions = direction_field(&coarse);
    let surface = direction_autocorrelation(&directions);
    let profile = radial_profile(&surface, &ctx.grid, ctx.bin_width, ctx.max_radius)?;
    let outcome = solve_length(&profile, ctx.config.decay_threshold);

    Ok(PairMetrics {
        pair,
        outcome,
        correlation_length: outcome.physical_length(ctx.config.pixel_size),
        mean_direction: directions.mean(),
        mean_velocity: coarse.mean(),
        divergence_sum: div.sum(),
        divergence_cells: div.len(),
    })
}

/// Running totals merged over pair results in pair order.
#[derive(Clone, Debug, Default)]
pub(crate) struct FlowAccumulator {
    pairs: usize,
    above: usize,
    direction: (f64, f64),
    velocity: (f64, f64),
    divergence_sum: f64,
    divergence_cells: usize,
}

impl FlowAccumulator {
    /// Totals contributed by a single pair.
    pub fn from_pair(metrics: &PairMetrics, min_corr_len: f64) -> Self {
        Self {
            pairs: 1,
            above: usize::from(metrics.correlation_length > min_corr_len),
            direction: metrics.mean_direction,
            velocity: metrics.mean_velocity,
            divergence_sum: metrics.divergence_sum,
            divergence_cells: metrics.divergence_cells,
        }
    }

    pub fn merge(mut self, other: Self) -> Self {
        self.pairs += other.pairs;
        self.above += other.above;
        self.direction.0 += other.direction.0;
        self.direction.1 += other.direction.1;
        self.velocity.0 += other.velocity.0;
        self.velocity.1 += other.velocity.1;
        self.divergence_sum += other.divergence_sum;
        self.divergence_cells += other.divergence_cells;
        self
    }

    pub fn finish(&self, min_fraction: f64) -> Result<(Verdict, FlowSummary)> {
        if self.pairs == 0 {
            return Err(FlowError::EmptySequence);
        }
        let n = self.pairs as f64;
        let fraction_above = self.above as f64 / n;
        let (vx, vy) = (self.velocity.0 / n, self.velocity.1 / n);
        let summary = FlowSummary {
            fraction_above,
            mean_direction: (self.direction.1 / n).atan2(self.direction.0 / n),
            mean_speed: vx.hypot(vy),
            mean_divergence: if self.divergence_cells > 0 {
                self.divergence_sum / self.divergence_cells as f64
            } else {
                0.0
            },
        };
        Ok((verdict_for_fraction(fraction_above, min_fraction), summary))
    }
}

/// Positive iff `fraction > min_fraction` (strict).
pub fn verdict_for_fraction(fraction: f64, min_fraction: f64) -> Verdict {
    if fraction > min_fraction {
        Verdict::Detected
    } else {
        Verdict::NotDetected
    }
}

/// Fraction of lengths above `min_corr_len` and the resulting verdict.
pub fn verdict_from_lengths(
    lengths: &[f64],
    min_corr_len: f64,
    min_fraction: f64,
) -> (f64, Verdict) {
    if lengths.is_empty() {
        return (0.0, Verdict::NotDetected);
    }
    let above = lengths.iter().filter(|&&l| l > min_corr_len).count();
    let fraction = above as f64 / lengths.len() as f64;
    (fraction, verdict_for_fraction(fraction, min_fraction))
}
