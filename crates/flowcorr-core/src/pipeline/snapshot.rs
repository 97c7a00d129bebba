use tracing::debug;

use crate::correlation::{downsample_field, sample_indices};
use crate::error::{FlowError, Result};
use crate::field::DisplacementField;
use crate::flow::FlowEstimator;
use crate::frame::{FramePair, ImageStack};

use super::config::{ChannelSelect, FlowConfig};

/// Downsampled displacement field of one pair, ready for a quiver plot.
#[derive(Clone, Debug)]
pub struct FlowSnapshot {
    pub channel: usize,
    pub pair: FramePair,
    /// Full-resolution row of each subgrid row.
    pub rows: Vec<usize>,
    /// Full-resolution column of each subgrid column.
    pub cols: Vec<usize>,
    pub field: DisplacementField,
}

/// First, middle and last pair of a stack, ordered and de-duplicated.
pub fn representative_pairs(len: usize, stride: usize) -> Vec<FramePair> {
    if stride == 0 || len <= stride {
        return Vec::new();
    }
    let last = len - stride - 1;
    let mut starts = vec![0, (len / 2).min(last), last];
    starts.dedup();
    starts.into_iter().map(|s| FramePair::new(s, stride)).collect()
}

/// Flow fields of the representative pairs of one channel.
pub fn flow_snapshots(
    stack: &ImageStack,
    channel: usize,
    config: &FlowConfig,
    estimator: &dyn FlowEstimator,
) -> Result<Vec<FlowSnapshot>> {
    config.validate()?;
    stack.check_channel(channel)?;
    let pairs = representative_pairs(stack.frame_count(), config.frame_stride);
    if pairs.is_empty() {
        return Err(FlowError::EmptySequence);
    }

    let rows = sample_indices(stack.height(), config.downsample);
    let cols = sample_indices(stack.width(), config.downsample);

    pairs
        .into_iter()
        .map(|pair| {
            let first = stack.frame(pair.start, channel)?;
            let second = stack.frame(pair.stop, channel)?;
            let field = estimator.estimate(first, second)?;
            if field.dim() != first.dim() {
                return Err(FlowError::ShapeMismatch {
                    expected: first.dim(),
                    found: field.dim(),
                });
            }
            debug!(channel, start = pair.start, stop = pair.stop, "Flow snapshot");
            Ok(FlowSnapshot {
                channel,
                pair,
                rows: rows.clone(),
                cols: cols.clone(),
                field: downsample_field(&field, config.downsample),
            })
        })
        .collect()
}

/// Flow snapshots of every selected channel, grouped by channel.
pub fn stack_snapshots(
    stack: &ImageStack,
    select: ChannelSelect,
    config: &FlowConfig,
    estimator: &dyn FlowEstimator,
) -> Result<Vec<FlowSnapshot>> {
    let mut snapshots = Vec::new();
    for channel in select.channels(stack)? {
        snapshots.extend(flow_snapshots(stack, channel, config, estimator)?);
    }
    Ok(snapshots)
}
