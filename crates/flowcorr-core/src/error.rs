use thiserror::Error;

#[derive(Error, Debug)]
pub enum FlowError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid SER file: {0}")]
    InvalidSer(String),

    #[error("Invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("Frame index {index} out of range (total: {total})")]
    FrameIndexOutOfRange { index: usize, total: usize },

    #[error("Channel {channel} requested but the stack has {channels} channel(s)")]
    InvalidChannelIndex { channel: usize, channels: usize },

    #[error("Shape mismatch: expected {}x{}, found {}x{}", expected.1, expected.0, found.1, found.0)]
    ShapeMismatch {
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Image format error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("TIFF decoding error: {0}")]
    Tiff(#[from] tiff::TiffError),

    #[error("Empty frame sequence")]
    EmptySequence,

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("No sign change in [{lower}, {upper}]")]
    RootNotBracketed { lower: f64, upper: f64 },

    #[error("Need at least 2 samples to interpolate, got {0}")]
    InsufficientSamples(usize),

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),
}

pub type Result<T> = std::result::Result<T, FlowError>;
