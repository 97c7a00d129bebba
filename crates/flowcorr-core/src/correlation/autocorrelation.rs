use ndarray::{Array2, ArrayView2, Zip};

use crate::error::{FlowError, Result};
use crate::fft::{fft2d, ifft2d_real};
use crate::field::DirectionField;

/// Circular autocorrelation of a real grid via Wiener-Khinchin:
/// `Re(IFFT2(F * conj(F)))` with `F = FFT2(data)`.
///
/// No padding or windowing; lags wrap around the grid edges.
pub fn autocorrelate(data: ArrayView2<f64>) -> Array2<f64> {
    let mut spectrum = fft2d(data);
    spectrum.mapv_inplace(|c| c * c.conj());
    ifft2d_real(&spectrum)
}

/// Sum of the x- and y-component autocorrelations.
///
/// `[0, 0]` holds the zero-lag value, the sum of squared components.
pub fn autocorrelation_surface(fx: ArrayView2<f64>, fy: ArrayView2<f64>) -> Result<Array2<f64>> {
    if fx.dim() != fy.dim() {
        return Err(FlowError::ShapeMismatch {
            expected: fx.dim(),
            found: fy.dim(),
        });
    }
    Ok(summed_autocorrelation(fx, fy))
}

/// Autocorrelation surface of a direction field.
pub fn direction_autocorrelation(directions: &DirectionField) -> Array2<f64> {
    summed_autocorrelation(directions.x.view(), directions.y.view())
}

fn summed_autocorrelation(fx: ArrayView2<f64>, fy: ArrayView2<f64>) -> Array2<f64> {
    let (mut surface, cy) = rayon::join(|| autocorrelate(fx), || autocorrelate(fy));
    Zip::from(&mut surface).and(&cy).for_each(|c, &y| *c += y);
    surface
}
