use ndarray::Array2;

use crate::error::{FlowError, Result};

/// Index distance of every cell from the grid origin, `sqrt(i^2 + j^2)`.
///
/// Computed once per channel and shared by every pair.
#[derive(Clone, Debug)]
pub struct RadiusGrid {
    radii: Array2<f64>,
}

impl RadiusGrid {
    pub fn new(rows: usize, cols: usize) -> Self {
        let radii = Array2::from_shape_fn((rows, cols), |(i, j)| {
            ((i * i + j * j) as f64).sqrt()
        });
        Self { radii }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.radii.dim()
    }

    pub fn radii(&self) -> &Array2<f64> {
        &self.radii
    }
}

/// Radius (pixels) -> correlation normalized by its zero-lag value.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RadialProfile {
    pub radii: Vec<f64>,
    pub values: Vec<f64>,
}

impl RadialProfile {
    pub fn len(&self) -> usize {
        self.radii.len()
    }

    pub fn is_empty(&self) -> bool {
        self.radii.is_empty()
    }
}

/// Bin a correlation surface into annuli centred at `0, bin_width, 2*bin_width, ... < max_radius`.
///
/// A bin keeps the cells with `r - bin_width/2 < R < r + bin_width/2`; empty
/// bins are skipped. A surface whose zero-lag value is not positive (an
/// all-null direction field) yields an empty profile.
pub fn radial_profile(
    surface: &Array2<f64>,
    grid: &RadiusGrid,
    bin_width: usize,
    max_radius: usize,
) -> Result<RadialProfile> {
    if surface.dim() != grid.dim() {
        return Err(FlowError::ShapeMismatch {
            expected: grid.dim(),
            found: surface.dim(),
        });
    }
    if bin_width == 0 {
        return Err(FlowError::InvalidConfig("bin width must be at least 1 pixel".into()));
    }

    let mut profile = RadialProfile::default();
    let zero_lag = match surface.first() {
        Some(&v) if v > 0.0 && v.is_finite() => v,
        _ => return Ok(profile),
    };

    let half = 0.5 * bin_width as f64;
    let bins: Vec<f64> = (0..max_radius).step_by(bin_width).map(|r| r as f64).collect();
    let mut sums = vec![0.0f64; bins.len()];
    let mut counts = vec![0usize; bins.len()];

    // A cell can only fall in the bin nearest its radius; neighbours are
    // checked as well so rounding at the open edges cannot drop a cell.
    for (&radius, &value) in grid.radii.iter().zip(surface.iter()) {
        let nearest = (radius / bin_width as f64).round() as usize;
        for b in nearest.saturating_sub(1)..=nearest + 1 {
            let Some(&centre) = bins.get(b) else {
                break;
            };
            if radius > centre - half && radius < centre + half {
                sums[b] += value;
                counts[b] += 1;
            }
        }
    }

    for ((&r, &sum), &count) in bins.iter().zip(&sums).zip(&counts) {
        if count > 0 {
            profile.radii.push(r);
            profile.values.push(sum / count as f64 / zero_lag);
        }
    }

    Ok(profile)
}
