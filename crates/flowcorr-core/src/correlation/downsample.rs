use ndarray::{s, Array2, ArrayView2};

use crate::field::DisplacementField;

/// Indices `0, step, 2*step, ... < len`.
pub fn sample_indices(len: usize, step: usize) -> Vec<usize> {
    (0..len).step_by(step.max(1)).collect()
}

/// Regular subgrid at every `step`-th row and column.
///
/// Output shape is `(ceil(h / step), ceil(w / step))`.
pub fn downsample<T: Clone>(data: ArrayView2<T>, step: usize) -> Array2<T> {
    let step = step.max(1) as isize;
    data.slice(s![..;step, ..;step]).to_owned()
}

/// Subgrid of both displacement components.
pub fn downsample_field(field: &DisplacementField, step: usize) -> DisplacementField {
    DisplacementField {
        dx: downsample(field.dx.view(), step),
        dy: downsample(field.dy.view(), step),
    }
}
