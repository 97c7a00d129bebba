use ndarray::{Array2, ArrayView2};
use num_complex::Complex;
use num_traits::Zero;
use rustfft::FftPlanner;

/// 2D FFT: row-wise FFT, then column-wise FFT.
pub(crate) fn fft2d(data: ArrayView2<f64>) -> Array2<Complex<f64>> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let fft_row = planner.plan_fft_forward(w);
    let fft_col = planner.plan_fft_forward(h);

    let mut result = data.mapv(|v| Complex::new(v, 0.0));

    let mut row_buf = vec![Complex::zero(); w];
    for mut row in result.rows_mut() {
        row_buf.iter_mut().zip(row.iter()).for_each(|(b, v)| *b = *v);
        fft_row.process(&mut row_buf);
        row.iter_mut().zip(row_buf.iter()).for_each(|(v, b)| *v = *b);
    }

    let mut col_buf = vec![Complex::zero(); h];
    for mut col in result.columns_mut() {
        col_buf.iter_mut().zip(col.iter()).for_each(|(b, v)| *b = *v);
        fft_col.process(&mut col_buf);
        col.iter_mut().zip(col_buf.iter()).for_each(|(v, b)| *v = *b);
    }

    result
}

/// Inverse 2D FFT, returning the real part scaled by `1 / (h * w)`.
pub(crate) fn ifft2d_real(data: &Array2<Complex<f64>>) -> Array2<f64> {
    let (h, w) = data.dim();
    let mut planner = FftPlanner::new();
    let ifft_row = planner.plan_fft_inverse(w);
    let ifft_col = planner.plan_fft_inverse(h);

    let mut work = data.clone();

    let mut col_buf = vec![Complex::zero(); h];
    for mut col in work.columns_mut() {
        col_buf.iter_mut().zip(col.iter()).for_each(|(b, v)| *b = *v);
        ifft_col.process(&mut col_buf);
        col.iter_mut().zip(col_buf.iter()).for_each(|(v, b)| *v = *b);
    }

    let mut row_buf = vec![Complex::zero(); w];
    for mut row in work.rows_mut() {
        row_buf.iter_mut().zip(row.iter()).for_each(|(b, v)| *b = *v);
        ifft_row.process(&mut row_buf);
        row.iter_mut().zip(row_buf.iter()).for_each(|(v, b)| *v = *b);
    }

    let scale = 1.0 / (h * w) as f64;
    work.mapv(|c| c.re * scale)
}
