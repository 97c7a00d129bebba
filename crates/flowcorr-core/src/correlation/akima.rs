use crate::error::{FlowError, Result};

/// Akima piecewise-cubic interpolant.
///
/// Knot slopes are weighted averages of neighbouring secant slopes, which
/// keeps the curve from overshooting around abrupt changes. The secants are
/// extended past both ends by linear extrapolation; where both weights vanish
/// the knot slope is the plain average of its two neighbours.
#[derive(Clone, Debug)]
pub struct Akima {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Per-interval cubic coefficients `(c1, c2, c3)` in powers of `x - x[i]`.
    coeffs: Vec<(f64, f64, f64)>,
}

impl Akima {
    /// Fit through `(x, y)`; `x` must be strictly increasing.
    pub fn new(x: &[f64], y: &[f64]) -> Result<Self> {
        let n = x.len();
        if y.len() != n {
            return Err(FlowError::ShapeMismatch {
                expected: (n, 1),
                found: (y.len(), 1),
            });
        }
        if n < 2 {
            return Err(FlowError::InsufficientSamples(n));
        }
        if x.windows(2).any(|w| !(w[1] > w[0])) {
            return Err(FlowError::InvalidConfig(
                "interpolation knots must be strictly increasing".into(),
            ));
        }

        let secants: Vec<f64> = (0..n - 1)
            .map(|i| (y[i + 1] - y[i]) / (x[i + 1] - x[i]))
            .collect();
        let slopes = knot_slopes(&secants);

        let coeffs = (0..n - 1)
            .map(|i| {
                let h = x[i + 1] - x[i];
                let m = secants[i];
                let (t0, t1) = (slopes[i], slopes[i + 1]);
                (t0, (3.0 * m - 2.0 * t0 - t1) / h, (t0 + t1 - 2.0 * m) / (h * h))
            })
            .collect();

        Ok(Self {
            x: x.to_vec(),
            y: y.to_vec(),
            coeffs,
        })
    }

    /// Domain covered by the knots.
    pub fn bounds(&self) -> (f64, f64) {
        (self.x[0], self.x[self.x.len() - 1])
    }

    pub fn knots(&self) -> (&[f64], &[f64]) {
        (&self.x, &self.y)
    }

    /// Evaluate at `t`; values outside the knots extrapolate the end pieces.
    pub fn eval(&self, t: f64) -> f64 {
        let last = self.coeffs.len() - 1;
        let i = match self.x.partition_point(|&k| k <= t) {
            0 => 0,
            p => (p - 1).min(last),
        };
        let d = t - self.x[i];
        let (c1, c2, c3) = self.coeffs[i];
        self.y[i] + d * (c1 + d * (c2 + d * c3))
    }
}

fn knot_slopes(secants: &[f64]) -> Vec<f64> {
    let k = secants.len();
    if k == 1 {
        return vec![secants[0]; 2];
    }

    // m[2..k+2] are the secants; two extrapolated values on each side.
    let mut m = vec![0.0f64; k + 4];
    m[2..k + 2].copy_from_slice(secants);
    m[1] = 2.0 * m[2] - m[3];
    m[0] = 2.0 * m[1] - m[2];
    m[k + 2] = 2.0 * m[k + 1] - m[k];
    m[k + 3] = 2.0 * m[k + 2] - m[k + 1];

    let dm: Vec<f64> = m.windows(2).map(|w| (w[1] - w[0]).abs()).collect();
    let weights: Vec<(f64, f64)> = (0..=k).map(|i| (dm[i + 2], dm[i])).collect();
    let max_weight = weights
        .iter()
        .map(|(f1, f2)| f1 + f2)
        .fold(0.0f64, f64::max);

    weights
        .iter()
        .enumerate()
        .map(|(i, &(f1, f2))| {
            let f12 = f1 + f2;
            if f12 > 1e-9 * max_weight {
                (f1 * m[i + 1] + f2 * m[i + 2]) / f12
            } else {
                0.5 * (m[i + 3] + m[i])
            }
        })
        .collect()
}
