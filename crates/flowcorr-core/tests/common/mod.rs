#![allow(dead_code)]

use std::io::Write;

use ndarray::{Array2, ArrayView2};

use flowcorr_core::error::Result;
use flowcorr_core::field::DisplacementField;
use flowcorr_core::flow::FlowEstimator;
use flowcorr_core::frame::ImageStack;
use flowcorr_core::io::ser::SER_HEADER_SIZE;

/// Build a SER file header.
///
/// `color_id`: 0=MONO, 8=BAYER_RGGB, 100=RGB, 101=BGR
pub fn build_ser_header(
    width: u32,
    height: u32,
    bit_depth: u32,
    num_frames: usize,
    color_id: i32,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(SER_HEADER_SIZE);
    buf.extend_from_slice(b"LUCAM-RECORDER");
    buf.extend_from_slice(&0i32.to_le_bytes()); // LuID
    buf.extend_from_slice(&color_id.to_le_bytes());
    buf.extend_from_slice(&0i32.to_le_bytes()); // little-endian
    buf.extend_from_slice(&(width as i32).to_le_bytes());
    buf.extend_from_slice(&(height as i32).to_le_bytes());
    buf.extend_from_slice(&(bit_depth as i32).to_le_bytes());
    buf.extend_from_slice(&(num_frames as i32).to_le_bytes());
    buf.extend_from_slice(&[0u8; 120]); // observer, instrument, telescope
    buf.extend_from_slice(&0u64.to_le_bytes());
    buf.extend_from_slice(&0u64.to_le_bytes());
    assert_eq!(buf.len(), SER_HEADER_SIZE);
    buf
}

/// Write bytes to a temp file with the given suffix.
pub fn write_temp(data: &[u8], suffix: &str) -> tempfile::NamedTempFile {
    let mut f = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    f.write_all(data).expect("write data");
    f.flush().expect("flush");
    f
}

/// Single-channel stack where frame `k` is filled with `k + 1`.
///
/// Estimators can recover the pair index from the first frame's intensity.
pub fn indexed_stack(frames: usize, h: usize, w: usize) -> ImageStack {
    let frames = (0..frames)
        .map(|k| Array2::from_elem((h, w), (k + 1) as f32))
        .collect();
    ImageStack::from_frames(frames).expect("valid stack")
}

/// Pair start index encoded by [`indexed_stack`].
pub fn pair_index(first: ArrayView2<f32>) -> usize {
    first[[0, 0]].round() as usize - 1
}

/// Every cell moves by the same vector.
pub struct UniformFlow {
    pub dx: f64,
    pub dy: f64,
}

impl FlowEstimator for UniformFlow {
    fn estimate(&self, first: ArrayView2<f32>, _second: ArrayView2<f32>) -> Result<DisplacementField> {
        Ok(DisplacementField::uniform(first.dim(), self.dx, self.dy))
    }
}

/// Pairs starting before `organized` get a uniform field, the rest a
/// checkerboard. Expects an [`indexed_stack`].
pub struct SplitFlow {
    pub organized: usize,
}

impl FlowEstimator for SplitFlow {
    fn estimate(&self, first: ArrayView2<f32>, _second: ArrayView2<f32>) -> Result<DisplacementField> {
        if pair_index(first) < self.organized {
            Ok(DisplacementField::uniform(first.dim(), 1.0, 0.5))
        } else {
            Ok(checkerboard_field(first.dim()))
        }
    }

    fn name(&self) -> &str {
        "Split"
    }
}

/// Direction flips sign between neighbouring cells: no long-range order.
pub fn checkerboard_field(shape: (usize, usize)) -> DisplacementField {
    let dx = Array2::from_shape_fn(shape, |(r, c)| if (r + c) % 2 == 0 { 1.0 } else { -1.0 });
    DisplacementField {
        dx,
        dy: Array2::zeros(shape),
    }
}

/// Deterministic pseudo-random texture in `[0, 1)`.
pub fn lcg_texture(h: usize, w: usize, seed: u64) -> Array2<f32> {
    let mut state = seed;
    let mut next = move || {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        ((state >> 33) as f32) / (1u64 << 31) as f32
    };
    let mut out = Array2::<f32>::zeros((h, w));
    for v in out.iter_mut() {
        *v = next();
    }
    out
}
