use std::path::PathBuf;

use ndarray::{s, Array2, Array4, ArrayView2, ArrayView3, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{FlowError, Result};

/// Time-lapse image stack.
/// Intensities are f32, shape = (frames, height, width, channels).
#[derive(Clone, Debug)]
pub struct ImageStack {
    data: Array4<f32>,
}

impl ImageStack {
    /// Wrap a `[frame, row, col, channel]` array.
    pub fn new(data: Array4<f32>) -> Result<Self> {
        let (frames, h, w, channels) = data.dim();
        if frames == 0 {
            return Err(FlowError::EmptySequence);
        }
        if h == 0 || w == 0 || channels == 0 {
            return Err(FlowError::InvalidDimensions {
                width: w as u32,
                height: h as u32,
            });
        }
        Ok(Self { data })
    }

    /// Build a single-channel stack from equally shaped frames.
    pub fn from_frames(frames: Vec<Array2<f32>>) -> Result<Self> {
        let first = frames.first().ok_or(FlowError::EmptySequence)?;
        let (h, w) = first.dim();
        let mut data = Array4::<f32>::zeros((frames.len(), h, w, 1));
        for (i, frame) in frames.iter().enumerate() {
            if frame.dim() != (h, w) {
                return Err(FlowError::ShapeMismatch {
                    expected: (h, w),
                    found: frame.dim(),
                });
            }
            data.slice_mut(s![i, .., .., 0]).assign(frame);
        }
        Self::new(data)
    }

    pub fn frame_count(&self) -> usize {
        self.data.len_of(Axis(0))
    }

    pub fn height(&self) -> usize {
        self.data.len_of(Axis(1))
    }

    pub fn width(&self) -> usize {
        self.data.len_of(Axis(2))
    }

    pub fn channel_count(&self) -> usize {
        self.data.len_of(Axis(3))
    }

    pub fn data(&self) -> &Array4<f32> {
        &self.data
    }

    /// All frames of one channel, shape = (frames, height, width).
    pub fn channel(&self, channel: usize) -> Result<ArrayView3<'_, f32>> {
        self.check_channel(channel)?;
        Ok(self.data.index_axis(Axis(3), channel))
    }

    /// A single frame of one channel.
    pub fn frame(&self, index: usize, channel: usize) -> Result<ArrayView2<'_, f32>> {
        self.check_channel(channel)?;
        let total = self.frame_count();
        if index >= total {
            return Err(FlowError::FrameIndexOutOfRange { index, total });
        }
        Ok(self.data.slice(s![index, .., .., channel]))
    }

    /// Whether a channel carries no usable signal under `policy`.
    pub fn is_channel_empty(&self, channel: usize, policy: EmptyChannelPolicy) -> Result<bool> {
        let frames = self.channel(channel)?;
        Ok(match policy {
            EmptyChannelPolicy::AllZero => frames.iter().all(|&v| v == 0.0),
            EmptyChannelPolicy::AnyFrameZero => frames
                .outer_iter()
                .any(|frame| frame.iter().all(|&v| v == 0.0)),
        })
    }

    pub(crate) fn check_channel(&self, channel: usize) -> Result<()> {
        let channels = self.channel_count();
        if channel >= channels {
            return Err(FlowError::InvalidChannelIndex { channel, channels });
        }
        Ok(())
    }
}

/// Rule deciding when a channel is reported as "data not available".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmptyChannelPolicy {
    /// Every intensity in the channel is zero.
    #[default]
    AllZero,
    /// At least one frame of the channel is entirely zero.
    AnyFrameZero,
}

impl std::fmt::Display for EmptyChannelPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AllZero => write!(f, "All Zero"),
            Self::AnyFrameZero => write!(f, "Any Frame Zero"),
        }
    }
}

/// Two frames separated by a stride, the unit of flow estimation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FramePair {
    pub start: usize,
    pub stop: usize,
}

impl FramePair {
    pub fn new(start: usize, stride: usize) -> Self {
        Self {
            start,
            stop: start + stride,
        }
    }

    pub fn stride(&self) -> usize {
        self.stop - self.start
    }
}

/// Pairs `(s, s + stride)` for `s = 0, stride, 2*stride, ... < len - stride`.
pub fn sweep_pairs(len: usize, stride: usize) -> Vec<FramePair> {
    if stride == 0 || len <= stride {
        return Vec::new();
    }
    (0..len - stride)
        .step_by(stride)
        .map(|start| FramePair::new(start, stride))
        .collect()
}

/// Metadata about the loaded stack.
#[derive(Clone, Debug)]
pub struct StackInfo {
    pub source: PathBuf,
    pub total_frames: usize,
    pub width: usize,
    pub height: usize,
    pub channels: usize,
    pub bit_depth: u8,
}
