use ndarray::Array2;

/// Refine a correlation peak by fitting a parabola through its neighbours
/// along each axis.
///
/// The surface is treated as periodic, so peaks on the border use the
/// wrapped neighbour. Returns `(delta_row, delta_col)` clamped to half a pixel.
pub fn refine_peak_paraboloid(
    correlation: &Array2<f64>,
    peak_row: usize,
    peak_col: usize,
) -> (f64, f64) {
    let (h, w) = correlation.dim();
    if h < 3 || w < 3 {
        return (0.0, 0.0);
    }

    let centre = correlation[[peak_row, peak_col]];
    let delta_row = parabola_offset(
        correlation[[(peak_row + h - 1) % h, peak_col]],
        centre,
        correlation[[(peak_row + 1) % h, peak_col]],
    );
    let delta_col = parabola_offset(
        correlation[[peak_row, (peak_col + w - 1) % w]],
        centre,
        correlation[[peak_row, (peak_col + 1) % w]],
    );

    (delta_row.clamp(-0.5, 0.5), delta_col.clamp(-0.5, 0.5))
}

fn parabola_offset(prev: f64, curr: f64, next: f64) -> f64 {
    let curvature = prev - 2.0 * curr + next;
    if curvature.abs() > 1e-12 {
        (prev - next) / (2.0 * curvature)
    } else {
        0.0
    }
}
