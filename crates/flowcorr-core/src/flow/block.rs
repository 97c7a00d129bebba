use ndarray::{s, Array2, ArrayView2};
use num_complex::Complex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::consts::{
    DEFAULT_FLOW_BLOCK_SIZE, DEFAULT_FLOW_MIN_CONFIDENCE, EPSILON, FLAT_BLOCK_VARIANCE,
};
use crate::error::{FlowError, Result};
use crate::fft::{fft2d, ifft2d_real};
use crate::field::DisplacementField;

use super::subpixel::refine_peak_paraboloid;
use super::FlowEstimator;

/// Configuration for block phase-correlation flow.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BlockFlowConfig {
    /// Block edge in pixels; blocks overlap by half (default: 32).
    #[serde(default = "default_block_size")]
    pub block_size: usize,
    /// Blocks whose correlation peak-to-mean ratio falls below this report
    /// no motion (default: 5.0).
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
}

fn default_block_size() -> usize {
    DEFAULT_FLOW_BLOCK_SIZE
}
fn default_min_confidence() -> f64 {
    DEFAULT_FLOW_MIN_CONFIDENCE
}

impl Default for BlockFlowConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_FLOW_BLOCK_SIZE,
            min_confidence: DEFAULT_FLOW_MIN_CONFIDENCE,
        }
    }
}

/// Dense flow from per-block FFT phase correlation.
///
/// Each overlapping block gets one translation; the block grid is then
/// bilinearly interpolated to every pixel.
#[derive(Clone, Debug, Default)]
pub struct BlockFlow {
    pub config: BlockFlowConfig,
}

impl BlockFlow {
    pub fn new(config: BlockFlowConfig) -> Self {
        Self { config }
    }
}

impl FlowEstimator for BlockFlow {
    fn estimate(
        &self,
        first: ArrayView2<f32>,
        second: ArrayView2<f32>,
    ) -> Result<DisplacementField> {
        if first.dim() != second.dim() {
            return Err(FlowError::ShapeMismatch {
                expected: first.dim(),
                found: second.dim(),
            });
        }
        if self.config.block_size < 2 {
            return Err(FlowError::InvalidConfig(
                "flow block size must be at least 2 pixels".into(),
            ));
        }

        let (h, w) = first.dim();
        let bh = self.config.block_size.min(h);
        let bw = self.config.block_size.min(w);
        let row_starts = block_starts(h, bh);
        let col_starts = block_starts(w, bw);

        let blocks: Vec<(usize, usize)> = row_starts
            .iter()
            .flat_map(|&r| col_starts.iter().map(move |&c| (r, c)))
            .collect();

        let shifts: Vec<(f64, f64)> = blocks
            .par_iter()
            .map(|&(r, c)| {
                let a = first.slice(s![r..r + bh, c..c + bw]);
                let b = second.slice(s![r..r + bh, c..c + bw]);
                block_shift(a, b, self.config.min_confidence)
            })
            .collect();

        let grid_dy = Array2::from_shape_fn((row_starts.len(), col_starts.len()), |(i, j)| {
            shifts[i * col_starts.len() + j].0
        });
        let grid_dx = Array2::from_shape_fn((row_starts.len(), col_starts.len()), |(i, j)| {
            shifts[i * col_starts.len() + j].1
        });

        let row_centres: Vec<f64> = row_starts.iter().map(|&r| centre(r, bh)).collect();
        let col_centres: Vec<f64> = col_starts.iter().map(|&c| centre(c, bw)).collect();

        debug!(
            blocks = blocks.len(),
            block_rows = row_starts.len(),
            block_cols = col_starts.len(),
            "Block flow estimated"
        );

        DisplacementField::new(
            interpolate_grid(&grid_dx, &row_centres, &col_centres, h, w),
            interpolate_grid(&grid_dy, &row_centres, &col_centres, h, w),
        )
    }

    fn name(&self) -> &str {
        "Block Phase Correlation"
    }
}

/// Block origins at half-block stride; the last block is flush with the edge.
fn block_starts(len: usize, block: usize) -> Vec<usize> {
    let step = (block / 2).max(1);
    let mut starts: Vec<usize> = (0..=len - block).step_by(step).collect();
    if starts.last().is_some_and(|&s| s + block < len) {
        starts.push(len - block);
    }
    starts
}

fn centre(start: usize, block: usize) -> f64 {
    start as f64 + (block as f64 - 1.0) / 2.0
}

/// Translation `(dy, dx)` carrying block `a` onto block `b`, or zero when the
/// block is flat or the correlation peak is not distinct.
fn block_shift(a: ArrayView2<f32>, b: ArrayView2<f32>, min_confidence: f64) -> (f64, f64) {
    if variance(a) < FLAT_BLOCK_VARIANCE {
        return (0.0, 0.0);
    }
    let ref_block = centred_hann(a);
    let tgt_block = centred_hann(b);

    let ref_fft = fft2d(ref_block.view());
    let tgt_fft = fft2d(tgt_block.view());

    let mut cross = tgt_fft;
    cross.zip_mut_with(&ref_fft, |t, r| {
        let c = *t * r.conj();
        let mag = c.norm();
        *t = if mag > EPSILON {
            c / mag
        } else {
            Complex::new(0.0, 0.0)
        };
    });
    let correlation = ifft2d_real(&cross);

    let (peak_row, peak_col, peak_val) = find_peak(&correlation);
    let mean_abs = correlation.mapv(f64::abs).mean().unwrap_or(0.0);
    let confidence = if mean_abs > EPSILON {
        peak_val / mean_abs
    } else {
        0.0
    };
    if confidence < min_confidence {
        return (0.0, 0.0);
    }

    let (h, w) = correlation.dim();
    let dy = signed_lag(peak_row, h);
    let dx = signed_lag(peak_col, w);
    let (sub_dy, sub_dx) = refine_peak_paraboloid(&correlation, peak_row, peak_col);
    (dy + sub_dy, dx + sub_dx)
}

fn signed_lag(index: usize, len: usize) -> f64 {
    if index > len / 2 {
        index as f64 - len as f64
    } else {
        index as f64
    }
}

fn variance(data: ArrayView2<f32>) -> f64 {
    let n = data.len() as f64;
    let mean = data.iter().map(|&v| v as f64).sum::<f64>() / n;
    data.iter().map(|&v| (v as f64 - mean).powi(2)).sum::<f64>() / n
}

/// Subtract the block mean and apply a Hann window to reduce spectral leakage.
fn centred_hann(data: ArrayView2<f32>) -> Array2<f64> {
    let (h, w) = data.dim();
    let mean = data.iter().map(|&v| v as f64).sum::<f64>() / data.len() as f64;
    Array2::from_shape_fn((h, w), |(row, col)| {
        let wy = 0.5 * (1.0 - (std::f64::consts::TAU * row as f64 / h as f64).cos());
        let wx = 0.5 * (1.0 - (std::f64::consts::TAU * col as f64 / w as f64).cos());
        (data[[row, col]] as f64 - mean) * wy * wx
    })
}

fn find_peak(data: &Array2<f64>) -> (usize, usize, f64) {
    let mut best = (0, 0, f64::NEG_INFINITY);
    for ((row, col), &v) in data.indexed_iter() {
        if v > best.2 {
            best = (row, col, v);
        }
    }
    best
}

/// Bilinear interpolation of a coarse grid with sample positions
/// `rows x cols` to a dense `(h, w)` array. Positions outside the sample
/// range take the nearest edge value.
fn interpolate_grid(
    grid: &Array2<f64>,
    rows: &[f64],
    cols: &[f64],
    h: usize,
    w: usize,
) -> Array2<f64> {
    let row_spans: Vec<_> = (0..h).map(|r| find_interval(rows, r as f64)).collect();
    let col_spans: Vec<_> = (0..w).map(|c| find_interval(cols, c as f64)).collect();

    Array2::from_shape_fn((h, w), |(row, col)| {
        let (r0, r1, fy) = row_spans[row];
        let (c0, c1, fx) = col_spans[col];
        grid[[r0, c0]] * (1.0 - fx) * (1.0 - fy)
            + grid[[r0, c1]] * fx * (1.0 - fy)
            + grid[[r1, c0]] * (1.0 - fx) * fy
            + grid[[r1, c1]] * fx * fy
    })
}

/// Bracketing interval and interpolation fraction for `val` in sorted `positions`.
fn find_interval(positions: &[f64], val: f64) -> (usize, usize, f64) {
    let n = positions.len();
    if n == 0 || val <= positions[0] {
        return (0, 0, 0.0);
    }
    if val >= positions[n - 1] {
        return (n - 1, n - 1, 0.0);
    }
    let hi = positions.partition_point(|&p| p <= val);
    let lo = hi - 1;
    let span = positions[hi] - positions[lo];
    let frac = if span > 0.0 {
        (val - positions[lo]) / span
    } else {
        0.0
    };
    (lo, hi, frac)
}
