use ndarray::Array2;

use crate::error::{FlowError, Result};

/// Per-pixel displacement between two frames.
///
/// `dx` is motion along columns, `dy` along rows, both in pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct DisplacementField {
    pub dx: Array2<f64>,
    pub dy: Array2<f64>,
}

impl DisplacementField {
    pub fn new(dx: Array2<f64>, dy: Array2<f64>) -> Result<Self> {
        if dx.dim() != dy.dim() {
            return Err(FlowError::ShapeMismatch {
                expected: dx.dim(),
                found: dy.dim(),
            });
        }
        Ok(Self { dx, dy })
    }

    /// Every cell carries the same vector.
    pub fn uniform(shape: (usize, usize), dx: f64, dy: f64) -> Self {
        Self {
            dx: Array2::from_elem(shape, dx),
            dy: Array2::from_elem(shape, dy),
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.dx.dim()
    }

    /// Mean of each component, `(mean_dx, mean_dy)`.
    pub fn mean(&self) -> (f64, f64) {
        (
            self.dx.mean().unwrap_or(0.0),
            self.dy.mean().unwrap_or(0.0),
        )
    }
}

/// Unit direction per cell, or `(0, 0)` where there is no detectable motion.
#[derive(Clone, Debug, PartialEq)]
pub struct DirectionField {
    pub x: Array2<f64>,
    pub y: Array2<f64>,
}

impl DirectionField {
    pub fn dim(&self) -> (usize, usize) {
        self.x.dim()
    }

    pub fn mean(&self) -> (f64, f64) {
        (self.x.mean().unwrap_or(0.0), self.y.mean().unwrap_or(0.0))
    }
}
