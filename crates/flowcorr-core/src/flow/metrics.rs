use ndarray::{Array2, ArrayView2, Axis, Zip};

use crate::field::DisplacementField;

/// Finite-difference derivative along `axis` with unit spacing.
///
/// Central differences in the interior, one-sided differences on the two
/// edge samples. Axes shorter than two samples have zero derivative.
pub fn gradient(data: ArrayView2<f64>, axis: Axis) -> Array2<f64> {
    let mut out = Array2::<f64>::zeros(data.raw_dim());
    let n = data.len_of(axis);
    if n < 2 {
        return out;
    }

    for (lane, mut grad) in data.lanes(axis).into_iter().zip(out.lanes_mut(axis)) {
        grad[0] = lane[1] - lane[0];
        grad[n - 1] = lane[n - 1] - lane[n - 2];
        for i in 1..n - 1 {
            grad[i] = 0.5 * (lane[i + 1] - lane[i - 1]);
        }
    }
    out
}

/// `d(dx)/d(col) + d(dy)/d(row)` at every pixel.
pub fn divergence(field: &DisplacementField) -> Array2<f64> {
    let mut div = gradient(field.dx.view(), Axis(1));
    let ddy = gradient(field.dy.view(), Axis(0));
    Zip::from(&mut div).and(&ddy).for_each(|d, &g| *d += g);
    div
}
