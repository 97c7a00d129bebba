use approx::assert_abs_diff_eq;
use ndarray::{array, Array2};

use flowcorr_core::correlation::{
    autocorrelation_surface, direction_autocorrelation, direction_field,
};
use flowcorr_core::error::FlowError;
use flowcorr_core::field::DisplacementField;

mod common;
use common::{checkerboard_field, lcg_texture};

#[test]
fn test_all_zero_field_gives_zero_surface() {
    let zeros = Array2::<f64>::zeros((8, 6));
    let surface = autocorrelation_surface(zeros.view(), zeros.view()).unwrap();
    assert_eq!(surface.dim(), (8, 6));
    for &v in surface.iter() {
        assert_abs_diff_eq!(v, 0.0, epsilon = 1e-12);
    }
}

#[test]
fn test_single_cell_unit_vector() {
    let fx = array![[1.0]];
    let fy = array![[0.0]];
    let surface = autocorrelation_surface(fx.view(), fy.view()).unwrap();
    assert_abs_diff_eq!(surface[[0, 0]], 1.0, epsilon = 1e-12);
}

#[test]
fn test_impulse_has_only_zero_lag() {
    let mut fx = Array2::<f64>::zeros((5, 7));
    fx[[2, 3]] = 1.0;
    let fy = Array2::<f64>::zeros((5, 7));
    let surface = autocorrelation_surface(fx.view(), fy.view()).unwrap();
    for ((r, c), &v) in surface.indexed_iter() {
        let expected = if (r, c) == (0, 0) { 1.0 } else { 0.0 };
        assert_abs_diff_eq!(v, expected, epsilon = 1e-12);
    }
}

#[test]
fn test_zero_lag_is_sum_of_squares_and_maximum() {
    let fx = lcg_texture(16, 12, 7).mapv(|v| v as f64 - 0.5);
    let fy = lcg_texture(16, 12, 11).mapv(|v| v as f64 - 0.5);
    let surface = autocorrelation_surface(fx.view(), fy.view()).unwrap();

    let energy: f64 = fx.iter().chain(fy.iter()).map(|v| v * v).sum();
    assert_abs_diff_eq!(surface[[0, 0]], energy, epsilon = 1e-9);
    for &v in surface.iter() {
        assert!(v <= surface[[0, 0]] + 1e-9);
    }
}

#[test]
fn test_uniform_directions_give_constant_surface() {
    let dirs = direction_field(&DisplacementField::uniform((10, 10), 3.0, 4.0));
    let surface = direction_autocorrelation(&dirs);
    // Every lag pairs identical unit vectors: N * |u|^2.
    for &v in surface.iter() {
        assert_abs_diff_eq!(v, 100.0, epsilon = 1e-9);
    }
}

#[test]
fn test_checkerboard_alternates_sign() {
    let dirs = direction_field(&checkerboard_field((8, 8)));
    let surface = direction_autocorrelation(&dirs);
    assert_abs_diff_eq!(surface[[0, 0]], 64.0, epsilon = 1e-9);
    assert_abs_diff_eq!(surface[[0, 1]], -64.0, epsilon = 1e-9);
    assert_abs_diff_eq!(surface[[1, 1]], 64.0, epsilon = 1e-9);
}

#[test]
fn test_mismatched_components_rejected() {
    let fx = Array2::<f64>::zeros((4, 4));
    let fy = Array2::<f64>::zeros((4, 5));
    let err = autocorrelation_surface(fx.view(), fy.view()).unwrap_err();
    assert!(matches!(err, FlowError::ShapeMismatch { .. }));
}
