use ndarray::{Array2, Zip};

use crate::consts::{FLT_TOL, PARALLEL_PIXEL_THRESHOLD};
use crate::field::{DirectionField, DisplacementField};

/// Unit vector along `(dx, dy)`, or `(0, 0)` when the norm is below [`FLT_TOL`].
pub fn normalize(dx: f64, dy: f64) -> (f64, f64) {
    let magnitude = dx.hypot(dy);
    if magnitude == 0.0 || magnitude < FLT_TOL || !magnitude.is_finite() {
        return (0.0, 0.0);
    }
    (dx / magnitude, dy / magnitude)
}

/// Normalize every cell of a displacement field independently.
pub fn direction_field(field: &DisplacementField) -> DirectionField {
    let (h, w) = field.dim();
    let mut x = Array2::<f64>::zeros((h, w));
    let mut y = Array2::<f64>::zeros((h, w));

    let zip = Zip::from(&mut x)
        .and(&mut y)
        .and(&field.dx)
        .and(&field.dy);
    let apply = |ux: &mut f64, uy: &mut f64, &dx: &f64, &dy: &f64| {
        (*ux, *uy) = normalize(dx, dy);
    };

    if h * w >= PARALLEL_PIXEL_THRESHOLD {
        zip.par_for_each(apply);
    } else {
        zip.for_each(apply);
    }

    DirectionField { x, y }
}
