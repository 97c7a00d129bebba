pub mod block;
pub mod metrics;
pub mod subpixel;

use ndarray::ArrayView2;

use crate::error::Result;
use crate::field::DisplacementField;

pub use block::{BlockFlow, BlockFlowConfig};
pub use metrics::{divergence, gradient};

/// Dense motion estimation between two frames.
///
/// Implementations return a field with the same spatial shape as the inputs;
/// `dx`/`dy` describe where content of `first` moved to in `second`.
pub trait FlowEstimator: Send + Sync {
    fn estimate(&self, first: ArrayView2<f32>, second: ArrayView2<f32>)
        -> Result<DisplacementField>;

    /// Human-readable estimator name (e.g. "Block Phase Correlation").
    fn name(&self) -> &str {
        "Custom"
    }
}

impl<F> FlowEstimator for F
where
    F: Fn(ArrayView2<f32>, ArrayView2<f32>) -> Result<DisplacementField> + Send + Sync,
{
    fn estimate(
        &self,
        first: ArrayView2<f32>,
        second: ArrayView2<f32>,
    ) -> Result<DisplacementField> {
        self(first, second)
    }
}
