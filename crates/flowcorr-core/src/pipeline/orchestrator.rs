use std::sync::atomic::{AtomicUsize, Ordering};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::consts::PARALLEL_PAIR_THRESHOLD;
use crate::error::{FlowError, Result};
use crate::flow::FlowEstimator;
use crate::frame::{sweep_pairs, FramePair, ImageStack};

use super::config::{ChannelSelect, FlowConfig};
use super::helpers::{process_pair, FlowAccumulator, PairContext};
use super::types::{AnalysisStage, ChannelAnalysis, NoOpReporter, PairMetrics, ProgressReporter};

/// Analyze one channel with a thread-safe progress reporter.
///
/// Fails fast on an invalid configuration or channel index. A channel that
/// fails the empty-channel guard yields [`super::Verdict::DataUnavailable`]
/// without running any flow estimation.
pub fn analyze_channel_reported(
    stack: &ImageStack,
    channel: usize,
    config: &FlowConfig,
    estimator: &dyn FlowEstimator,
    reporter: &dyn ProgressReporter,
) -> Result<ChannelAnalysis> {
    config.validate()?;
    let frames = stack.channel(channel)?;

    reporter.begin_stage(channel, AnalysisStage::Screening, None);
    let empty = stack.is_channel_empty(channel, config.empty_channel)?;
    reporter.finish_stage(channel);
    if empty {
        warn!(channel, policy = %config.empty_channel, "Channel has no data");
        return Ok(ChannelAnalysis::unavailable(channel));
    }

    let pairs = sweep_pairs(stack.frame_count(), config.frame_stride);
    if pairs.is_empty() {
        return Err(FlowError::EmptySequence);
    }
    info!(
        channel,
        pairs = pairs.len(),
        stride = config.frame_stride,
        estimator = estimator.name(),
        "Analyzing channel"
    );

    let ctx = PairContext::new(config, stack.height(), stack.width());
    reporter.begin_stage(channel, AnalysisStage::FlowEstimation, Some(pairs.len()));
    let done = AtomicUsize::new(0);
    let run = |pair: FramePair| {
        let metrics = process_pair(frames, pair, &ctx, estimator);
        reporter.advance(channel, done.fetch_add(1, Ordering::Relaxed) + 1);
        metrics
    };

    let results: Vec<PairMetrics> = if config.parallel && pairs.len() >= PARALLEL_PAIR_THRESHOLD {
        pairs.par_iter().map(|&p| run(p)).collect::<Result<_>>()?
    } else {
        pairs.iter().map(|&p| run(p)).collect::<Result<_>>()?
    };
    reporter.finish_stage(channel);

    reporter.begin_stage(channel, AnalysisStage::Aggregation, None);
    let (verdict, summary) = results
        .iter()
        .map(|m| FlowAccumulator::from_pair(m, config.min_corr_len))
        .fold(FlowAccumulator::default(), FlowAccumulator::merge)
        .finish(config.min_fraction)?;
    reporter.finish_stage(channel);

    for m in results.iter().filter(|m| m.correlation_length == 0.0) {
        debug!(channel, start = m.pair.start, stop = m.pair.stop, "No correlation length");
    }
    info!(
        channel,
        %verdict,
        fraction = summary.fraction_above,
        direction = summary.mean_direction,
        speed = summary.mean_speed,
        divergence = summary.mean_divergence,
        "Channel analyzed"
    );

    Ok(ChannelAnalysis {
        channel,
        verdict,
        correlation_lengths: results.iter().map(|m| m.correlation_length).collect(),
        pairs: results,
        summary: Some(summary),
    })
}

/// Analyze one channel.
pub fn analyze_channel(
    stack: &ImageStack,
    channel: usize,
    config: &FlowConfig,
    estimator: &dyn FlowEstimator,
) -> Result<ChannelAnalysis> {
    analyze_channel_reported(stack, channel, config, estimator, &NoOpReporter)
}

/// Analyze the selected channels independently, returned in channel order.
pub fn analyze_stack_reported(
    stack: &ImageStack,
    select: ChannelSelect,
    config: &FlowConfig,
    estimator: &dyn FlowEstimator,
    reporter: &dyn ProgressReporter,
) -> Result<Vec<ChannelAnalysis>> {
    let channels = select.channels(stack)?;

    let analyze = |c: usize| analyze_channel_reported(stack, c, config, estimator, reporter);
    if config.parallel {
        channels.par_iter().map(|&c| analyze(c)).collect()
    } else {
        channels.iter().map(|&c| analyze(c)).collect()
    }
}

/// Analyze the selected channels.
pub fn analyze_stack(
    stack: &ImageStack,
    select: ChannelSelect,
    config: &FlowConfig,
    estimator: &dyn FlowEstimator,
) -> Result<Vec<ChannelAnalysis>> {
    analyze_stack_reported(stack, select, config, estimator, &NoOpReporter)
}
